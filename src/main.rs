// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context as _, Result};
use clap::Parser;
use kube::config::Kubeconfig;
use std::io::{self, BufRead, Write};
use tracing::{error, info};

use capstan::config::{OutputFormat, Settings};
use capstan::credential::{resolve_cluster_context, Credential};
use capstan::error::CapstanError;
use capstan::kubernetes::{build_client, PollSettings};
use capstan::workflow::run_bootstrap;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let settings = Settings::parse();

    if let Err(err) = run(settings).await {
        error!("Bootstrap failed: {:#}", err);
        if let Some(advice) = err
            .downcast_ref::<CapstanError>()
            .and_then(CapstanError::remediation)
        {
            eprintln!("\n{}", advice);
        }
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> Result<()> {
    let kubeconfig = Kubeconfig::read().context("Failed to read kubeconfig")?;

    // Resolve connection parameters first: a local configuration defect
    // fails the run before anything touches the cluster
    let ctx = resolve_cluster_context(&kubeconfig, settings.context.as_deref())?;
    info!(
        "Targeting context '{}' (cluster '{}', endpoint {})",
        ctx.name, ctx.cluster, ctx.api_endpoint
    );

    if !settings.yes && !confirm(&ctx.name, &settings.namespace)? {
        info!("Aborted by operator, nothing was changed");
        return Ok(());
    }

    let client = build_client(kubeconfig, &ctx.name).await?;

    let credential = run_bootstrap(&client, &ctx, &settings.namespace, &PollSettings::default())
        .await?;

    print!("{}", render(&credential, settings.output)?);
    Ok(())
}

/// Ask the operator before mutating the cluster. Anything but y/yes aborts.
fn confirm(context: &str, namespace: &str) -> Result<bool> {
    eprint!(
        "Provision unrestricted delegated access in namespace '{}' of context '{}'? [y/N] ",
        namespace, context
    );
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;

    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn render(credential: &Credential, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(credential).context("Failed to render credential")
        }
        OutputFormat::Env => Ok(credential.to_env()),
    }
}

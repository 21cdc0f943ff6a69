// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0

//! Cluster client construction from the local kubeconfig

use crate::error::{CapstanError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::{debug, instrument};

/// Build a client bound to the selected kubeconfig context.
#[instrument(skip(kubeconfig))]
pub async fn build_client(kubeconfig: Kubeconfig, context: &str) -> Result<Client> {
    debug!("Building client for context '{}'", context);

    let options = KubeConfigOptions {
        context: Some(context.to_string()),
        ..Default::default()
    };

    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|e| {
            CapstanError::KubeconfigError(format!(
                "Failed to build client config for context '{}': {}",
                context, e
            ))
        })?;

    Client::try_from(config)
        .map_err(|e| CapstanError::KubeconfigError(format!("Failed to create client: {}", e)))
}

// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0
use clap::{Parser, ValueEnum};

use crate::constants::DEFAULT_NAMESPACE;

/// Bootstrap delegated cluster access for an external integration.
///
/// Provisions a service account with an unrestricted cluster role, then
/// prints the API endpoint, cluster CA data, and bearer token the
/// integration needs.
#[derive(Parser, Debug)]
#[command(name = "capstan", version)]
pub struct Settings {
    /// Kubeconfig context to target (defaults to the current context)
    #[arg(long)]
    pub context: Option<String>,

    /// Namespace for the service account and its token secret
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Credential output format
    #[arg(long, value_enum, default_value = "yaml")]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// YAML document on stdout
    Yaml,
    /// Shell export lines for eval
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::parse_from(["capstan"]);

        assert_eq!(settings.context, None);
        assert_eq!(settings.namespace, "capstan-system");
        assert!(!settings.yes);
        assert!(matches!(settings.output, OutputFormat::Yaml));
    }

    #[test]
    fn test_explicit_flags() {
        let settings = Settings::parse_from([
            "capstan",
            "--context",
            "prod",
            "--namespace",
            "integrations",
            "--yes",
            "--output",
            "env",
        ]);

        assert_eq!(settings.context.as_deref(), Some("prod"));
        assert_eq!(settings.namespace, "integrations");
        assert!(settings.yes);
        assert!(matches!(settings.output, OutputFormat::Env));
    }
}

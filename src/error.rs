// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CapstanError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("no active cluster context; pass --context or set current-context in your kubeconfig")]
    NoActiveContext,

    #[error("not authorized: {detail}")]
    AuthorizationDenied { detail: String },

    #[error("no API endpoint configured for cluster '{cluster}'")]
    EndpointNotFound { cluster: String },

    #[error("token in secret '{namespace}/{secret}' not populated after {attempts} read attempts")]
    TokenNotReady {
        namespace: String,
        secret: String,
        attempts: u32,
    },

    #[error("failed to apply {object}: {detail}")]
    ApplyFailed { object: String, detail: String },

    #[error("token data in secret '{secret}' is not valid UTF-8")]
    TokenDecode { secret: String },
}

pub type Result<T> = std::result::Result<T, CapstanError>;

/// Permissions the bootstrap needs on the target cluster. Enumerated in the
/// remediation text when an apply is rejected for lack of privilege.
pub const REQUIRED_PERMISSIONS: &[&str] = &[
    "create namespaces",
    "create serviceaccounts",
    "create clusterroles.rbac.authorization.k8s.io",
    "create clusterrolebindings.rbac.authorization.k8s.io",
];

/// Map an apply failure to the error taxonomy. Authorization rejections
/// (401/403) select different remediation text than every other failure.
pub fn classify_apply_error(object: &str, err: kube::Error) -> CapstanError {
    match err {
        kube::Error::Api(resp) if resp.code == 401 || resp.code == 403 => {
            CapstanError::AuthorizationDenied {
                detail: format!("{}: {}", object, resp.message),
            }
        }
        kube::Error::Api(resp) => CapstanError::ApplyFailed {
            object: object.to_string(),
            detail: resp.message,
        },
        other => CapstanError::ApplyFailed {
            object: object.to_string(),
            detail: other.to_string(),
        },
    }
}

impl CapstanError {
    /// Operator-facing follow-up text for failures that have one.
    pub fn remediation(&self) -> Option<String> {
        match self {
            CapstanError::AuthorizationDenied { .. } => {
                let mut text = String::from(
                    "Ask a cluster administrator to grant your user the following permissions:\n",
                );
                for permission in REQUIRED_PERMISSIONS {
                    text.push_str("  - ");
                    text.push_str(permission);
                    text.push('\n');
                }
                Some(text)
            }
            CapstanError::TokenNotReady {
                namespace, secret, ..
            } => Some(format!(
                "The control plane has not populated the token yet. Read it manually once it is ready:\n  {}\n",
                manual_token_command(namespace, secret)
            )),
            _ => None,
        }
    }
}

/// The exact command an operator can run by hand to read and decode the token.
pub fn manual_token_command(namespace: &str, secret: &str) -> String {
    format!(
        "kubectl --namespace {} get secret {} --output jsonpath='{{.data.token}}' | base64 --decode",
        namespace, secret
    )
}

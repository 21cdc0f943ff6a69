// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys recognized by the control plane
pub mod annotations {
    /// Binds a service-account-token Secret to its ServiceAccount
    pub const SERVICE_ACCOUNT_NAME: &str = "kubernetes.io/service-account.name";
}

/// Fixed object names. Re-running the bootstrap converges on these objects
/// instead of creating duplicates.
pub mod names {
    pub const SERVICE_ACCOUNT: &str = "capstan-agent";
    pub const CLUSTER_ROLE: &str = "capstan-admin";
    pub const CLUSTER_ROLE_BINDING: &str = "capstan-admin-binding";
    pub const TOKEN_SECRET: &str = "capstan-agent-token";
}

/// The field manager name used for server-side apply
pub const FIELD_MANAGER: &str = "capstan";

/// Namespace used when the operator does not pick one
pub const DEFAULT_NAMESPACE: &str = "capstan-system";

/// Secret type that makes the control plane materialize a token
pub const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "kubernetes.io/service-account-token";

/// Data key the control plane populates inside the token secret
pub const TOKEN_DATA_KEY: &str = "token";

/// Token polling configuration
pub mod token {
    /// Initial wait after creating the token secret, in seconds
    pub const SETTLE_SECS: u64 = 5;
    /// Wait between read attempts, in seconds
    pub const RETRY_INTERVAL_SECS: u64 = 10;
    /// Read attempts before giving up
    pub const MAX_ATTEMPTS: u32 = 3;
}

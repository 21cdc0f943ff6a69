// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end bootstrap sequence.
//!
//! Connection parameters are resolved from local configuration before this
//! module runs, so a config defect fails before the first control-plane
//! call. Every step here is idempotent; re-invoking the whole workflow is
//! the recovery path, there are no per-step retries beyond the token poll.

use crate::credential::{ClusterContext, Credential};
use crate::error::Result;
use crate::kubernetes::token::PollSettings;
use crate::kubernetes::{acquire_token, apply_access_bundle, ensure_namespace_exists};
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use tracing::{info, instrument};

/// Provision the access objects and assemble the credential triple.
#[instrument(skip(client, ctx, poll), fields(context = %ctx.name, cluster = %ctx.cluster))]
pub async fn run_bootstrap(
    client: &Client,
    ctx: &ClusterContext,
    namespace: &str,
    poll: &PollSettings,
) -> Result<Credential> {
    info!(
        "Bootstrapping delegated access in namespace '{}' of cluster '{}'",
        namespace, ctx.cluster
    );

    ensure_namespace_exists(client, namespace).await?;
    apply_access_bundle(client, namespace).await?;

    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let token = acquire_token(&secrets, namespace, poll).await?;

    let credential = Credential {
        api_endpoint: ctx.api_endpoint.clone(),
        trust_anchor: ctx.trust_anchor.clone(),
        token,
    };

    info!("Delegated access ready for context '{}'", ctx.name);
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapstanError;
    use crate::test_utils::{
        already_exists_json, cluster_role_binding_json, cluster_role_json, forbidden_json,
        namespace_json, service_account_json, token_secret_json, MockService,
    };
    use std::time::Duration;

    fn fast_poll() -> PollSettings {
        PollSettings {
            settle: Duration::ZERO,
            retry_interval: Duration::ZERO,
            max_attempts: 3,
        }
    }

    fn prod_context() -> ClusterContext {
        ClusterContext {
            name: "prod".to_string(),
            cluster: "prod-cluster".to_string(),
            api_endpoint: "https://10.0.0.1:6443".to_string(),
            trust_anchor: Some("QQ==".to_string()),
        }
    }

    /// A cluster where every object already exists from a prior run.
    fn converged_cluster_mock() -> MockService {
        MockService::new()
            .on_get(
                "/api/v1/namespaces/capstan-system",
                200,
                &namespace_json("capstan-system"),
            )
            .on_patch(
                "/api/v1/namespaces/capstan-system/serviceaccounts/capstan-agent",
                200,
                &service_account_json("capstan-agent", "capstan-system"),
            )
            .on_patch(
                "/apis/rbac.authorization.k8s.io/v1/clusterroles/capstan-admin",
                200,
                &cluster_role_json("capstan-admin"),
            )
            .on_patch(
                "/apis/rbac.authorization.k8s.io/v1/clusterrolebindings/capstan-admin-binding",
                200,
                &cluster_role_binding_json("capstan-admin-binding"),
            )
            .on_post(
                "/api/v1/namespaces/capstan-system/secrets",
                409,
                &already_exists_json("secrets", "capstan-agent-token"),
            )
            .on_get(
                "/api/v1/namespaces/capstan-system/secrets/capstan-agent-token",
                200,
                &token_secret_json("capstan-agent-token", "capstan-system", Some("aGVsbG8=")),
            )
    }

    #[tokio::test]
    async fn test_full_run_assembles_complete_credential() {
        let mock = converged_cluster_mock();
        let client = mock.into_client();

        let credential = run_bootstrap(&client, &prod_context(), "capstan-system", &fast_poll())
            .await
            .expect("bootstrap");

        assert!(credential.is_complete());
        assert_eq!(credential.api_endpoint, "https://10.0.0.1:6443");
        assert_eq!(credential.trust_anchor.as_deref(), Some("QQ=="));
        assert_eq!(credential.token, "hello");
    }

    #[tokio::test]
    async fn test_second_run_against_converged_cluster_succeeds() {
        let mock = converged_cluster_mock();
        let client = mock.clone().into_client();

        run_bootstrap(&client, &prod_context(), "capstan-system", &fast_poll())
            .await
            .expect("first run");
        run_bootstrap(&client, &prod_context(), "capstan-system", &fast_poll())
            .await
            .expect("second run must not trip over existing objects");

        // Both runs converge on the same objects: no namespace create, one
        // rejected create-only secret post per run, applies for the rest
        let namespace_creates = mock
            .requests()
            .iter()
            .filter(|(m, p)| m == "POST" && p == "/api/v1/namespaces")
            .count();
        assert_eq!(namespace_creates, 0);
        assert_eq!(
            mock.count("POST", "/api/v1/namespaces/capstan-system/secrets"),
            2
        );
    }

    #[tokio::test]
    async fn test_denied_rbac_apply_fails_the_whole_run() {
        let mock = MockService::new()
            .on_get(
                "/api/v1/namespaces/capstan-system",
                200,
                &namespace_json("capstan-system"),
            )
            .on_patch(
                "/api/v1/namespaces/capstan-system/serviceaccounts/capstan-agent",
                200,
                &service_account_json("capstan-agent", "capstan-system"),
            )
            .on_patch(
                "/apis/rbac.authorization.k8s.io/v1/clusterroles/capstan-admin",
                403,
                &forbidden_json("clusterroles.rbac.authorization.k8s.io is forbidden"),
            );
        let client = mock.clone().into_client();

        let err = run_bootstrap(&client, &prod_context(), "capstan-system", &fast_poll())
            .await
            .unwrap_err();

        assert!(matches!(err, CapstanError::AuthorizationDenied { .. }));
        // The token secret must never have been created
        assert_eq!(mock.count("POST", "/api/v1/namespaces/capstan-system/secrets"), 0);
    }

    #[tokio::test]
    async fn test_token_never_ready_fails_with_recovery_command() {
        let mock = converged_cluster_mock().on_get(
            "/api/v1/namespaces/capstan-system/secrets/capstan-agent-token",
            200,
            &token_secret_json("capstan-agent-token", "capstan-system", None),
        );
        let client = mock.into_client();

        let err = run_bootstrap(&client, &prod_context(), "capstan-system", &fast_poll())
            .await
            .unwrap_err();

        let remediation = err.remediation().expect("token remediation");
        assert!(remediation.contains("kubectl --namespace capstan-system"));
        assert!(matches!(err, CapstanError::TokenNotReady { .. }));
    }
}

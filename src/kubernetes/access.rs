// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0

//! Access object construction and idempotent apply.
//!
//! The bundle is three linked objects with fixed names: the service account
//! the integration authenticates as, an unrestricted cluster role, and the
//! binding granting the role to the account. Server-side apply makes
//! repeated runs converge on the same objects.

use crate::constants::{names, FIELD_MANAGER};
use crate::error::{classify_apply_error, Result};
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::api::rbac::v1 as rbacv1;
use k8s_openapi::Resource as _;
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    Api, Client,
};
use tracing::{info, instrument};

pub fn service_account(namespace: &str) -> corev1::ServiceAccount {
    corev1::ServiceAccount {
        metadata: ObjectMeta {
            name: Some(names::SERVICE_ACCOUNT.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// The unrestricted grant. Full access on every group, resource, and verb
/// is the intended contract with the external integration.
pub fn cluster_role() -> rbacv1::ClusterRole {
    rbacv1::ClusterRole {
        metadata: ObjectMeta {
            name: Some(names::CLUSTER_ROLE.to_string()),
            ..Default::default()
        },
        rules: Some(vec![rbacv1::PolicyRule {
            api_groups: Some(vec!["*".to_string()]),
            resources: Some(vec!["*".to_string()]),
            verbs: vec!["*".to_string()],
            ..Default::default()
        }]),
        ..Default::default()
    }
}

pub fn cluster_role_binding(namespace: &str) -> rbacv1::ClusterRoleBinding {
    rbacv1::ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(names::CLUSTER_ROLE_BINDING.to_string()),
            ..Default::default()
        },
        subjects: Some(vec![rbacv1::Subject {
            kind: corev1::ServiceAccount::KIND.to_string(),
            name: names::SERVICE_ACCOUNT.to_string(),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }]),
        role_ref: rbacv1::RoleRef {
            api_group: rbacv1::ClusterRole::GROUP.to_string(),
            kind: rbacv1::ClusterRole::KIND.to_string(),
            name: names::CLUSTER_ROLE.to_string(),
        },
    }
}

/// Apply the full access bundle, in order: service account, cluster role,
/// cluster role binding. Each apply is create-or-update, so prior state is
/// overwritten and re-runs succeed. The first failure aborts the run.
#[instrument(skip(client))]
pub async fn apply_access_bundle(client: &Client, namespace: &str) -> Result<()> {
    let pp = PatchParams::apply(FIELD_MANAGER).force();

    let accounts: Api<corev1::ServiceAccount> = Api::namespaced(client.clone(), namespace);
    accounts
        .patch(
            names::SERVICE_ACCOUNT,
            &pp,
            &Patch::Apply(&service_account(namespace)),
        )
        .await
        .map_err(|e| classify_apply_error(&format!("serviceaccount {}", names::SERVICE_ACCOUNT), e))?;
    info!("Applied service account {}/{}", namespace, names::SERVICE_ACCOUNT);

    let roles: Api<rbacv1::ClusterRole> = Api::all(client.clone());
    roles
        .patch(names::CLUSTER_ROLE, &pp, &Patch::Apply(&cluster_role()))
        .await
        .map_err(|e| classify_apply_error(&format!("clusterrole {}", names::CLUSTER_ROLE), e))?;
    info!("Applied cluster role {}", names::CLUSTER_ROLE);

    let bindings: Api<rbacv1::ClusterRoleBinding> = Api::all(client.clone());
    bindings
        .patch(
            names::CLUSTER_ROLE_BINDING,
            &pp,
            &Patch::Apply(&cluster_role_binding(namespace)),
        )
        .await
        .map_err(|e| {
            classify_apply_error(&format!("clusterrolebinding {}", names::CLUSTER_ROLE_BINDING), e)
        })?;
    info!("Applied cluster role binding {}", names::CLUSTER_ROLE_BINDING);

    Ok(())
}

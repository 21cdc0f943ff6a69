// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0

//! Cluster context resolution and the final credential artifact.

use crate::error::{CapstanError, Result};
use kube::config::Kubeconfig;
use serde::Serialize;
use url::Url;

/// Connection parameters for the selected cluster, resolved once per run
/// from the local kubeconfig and immutable thereafter.
#[derive(Debug, Clone)]
pub struct ClusterContext {
    /// Context name as written in the kubeconfig
    pub name: String,
    /// Cluster entry the context points at
    pub cluster: String,
    pub api_endpoint: String,
    /// Base64 CA bundle, carried verbatim when the config has one
    pub trust_anchor: Option<String>,
}

/// Everything the external integration needs to reach the cluster.
#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    pub api_endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_anchor: Option<String>,
    pub token: String,
}

impl Credential {
    pub fn is_complete(&self) -> bool {
        !self.api_endpoint.is_empty()
            && !self.token.is_empty()
            && self.trust_anchor.as_deref() != Some("")
    }

    /// Render as shell export lines for `eval`-style consumption.
    pub fn to_env(&self) -> String {
        let mut out = format!("export CAPSTAN_API_ENDPOINT={}\n", self.api_endpoint);
        if let Some(anchor) = &self.trust_anchor {
            out.push_str(&format!("export CAPSTAN_TRUST_ANCHOR={}\n", anchor));
        }
        out.push_str(&format!("export CAPSTAN_TOKEN={}\n", self.token));
        out
    }
}

/// Resolve the target cluster from the local kubeconfig.
///
/// Picks the named context when one is given, the current-context otherwise.
/// An empty or missing server field is a local configuration defect and is
/// reported as such, distinct from any control-plane failure.
pub fn resolve_cluster_context(
    kubeconfig: &Kubeconfig,
    context_override: Option<&str>,
) -> Result<ClusterContext> {
    let context_name = context_override
        .map(str::to_string)
        .or_else(|| kubeconfig.current_context.clone())
        .filter(|name| !name.is_empty())
        .ok_or(CapstanError::NoActiveContext)?;

    let context = kubeconfig
        .contexts
        .iter()
        .find(|c| c.name == context_name)
        .and_then(|c| c.context.as_ref())
        .ok_or(CapstanError::NoActiveContext)?;

    let cluster_name = context.cluster.clone();
    let cluster = kubeconfig
        .clusters
        .iter()
        .find(|c| c.name == cluster_name)
        .and_then(|c| c.cluster.as_ref());

    let api_endpoint = cluster
        .and_then(|c| c.server.clone())
        .filter(|server| !server.is_empty())
        .ok_or_else(|| CapstanError::EndpointNotFound {
            cluster: cluster_name.clone(),
        })?;

    Url::parse(&api_endpoint).map_err(|e| {
        CapstanError::KubeconfigError(format!(
            "server '{}' for cluster '{}' is not a valid URL: {}",
            api_endpoint, cluster_name, e
        ))
    })?;

    let trust_anchor = cluster.and_then(|c| c.certificate_authority_data.clone());

    Ok(ClusterContext {
        name: context_name,
        cluster: cluster_name,
        api_endpoint,
        trust_anchor,
    })
}

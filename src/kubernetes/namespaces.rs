// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0

//! Namespace provisioning

use crate::error::{classify_apply_error, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

/// Ensure the target namespace exists, creating it if absent.
///
/// An existing namespace is a no-op, never a failure. Authorization
/// failures on either the lookup or the create are fatal.
#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get(namespace).await {
        Ok(_) => {
            debug!("Namespace {} already exists", namespace);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            info!("Creating namespace {}", namespace);
            let ns = Namespace {
                metadata: ObjectMeta {
                    name: Some(namespace.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            namespaces
                .create(&PostParams::default(), &ns)
                .await
                .map_err(|e| classify_apply_error(&format!("namespace {}", namespace), e))?;
            info!("Namespace {} created", namespace);
            Ok(())
        }
        Err(e) => Err(classify_apply_error(&format!("namespace {}", namespace), e)),
    }
}

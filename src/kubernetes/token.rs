// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0

//! Token secret creation and bounded polling.
//!
//! The control plane materializes the token asynchronously after the secret
//! is created, so acquisition is a create-then-poll protocol: one settle
//! wait, then a fixed number of read attempts with a fixed delay between
//! them.

use crate::constants::{annotations, names, token, SERVICE_ACCOUNT_TOKEN_TYPE, TOKEN_DATA_KEY};
use crate::error::{classify_apply_error, CapstanError, Result};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{ObjectMeta, PostParams},
    Api,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Timing knobs for the polling loop. Tests inject zero delays and drive
/// the loop with a mock client; production uses the defaults.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub settle: Duration,
    pub retry_interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(token::SETTLE_SECS),
            retry_interval: Duration::from_secs(token::RETRY_INTERVAL_SECS),
            max_attempts: token::MAX_ATTEMPTS,
        }
    }
}

fn token_secret(namespace: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(names::TOKEN_SECRET.to_string()),
            namespace: Some(namespace.to_string()),
            annotations: Some(BTreeMap::from([(
                annotations::SERVICE_ACCOUNT_NAME.to_string(),
                names::SERVICE_ACCOUNT.to_string(),
            )])),
            ..Default::default()
        },
        type_: Some(SERVICE_ACCOUNT_TOKEN_TYPE.to_string()),
        ..Default::default()
    }
}

/// Create the token secret and poll until the control plane populates it.
///
/// Returns the decoded bearer token. Exhausting the poll budget fails with
/// a recovery command the operator can run once the token shows up.
#[instrument(skip(secrets, poll))]
pub async fn acquire_token(
    secrets: &Api<Secret>,
    namespace: &str,
    poll: &PollSettings,
) -> Result<String> {
    create_token_secret(secrets, namespace).await?;

    debug!(
        "Waiting {:?} for the control plane to issue the token",
        poll.settle
    );
    sleep(poll.settle).await;

    for attempt in 1..=poll.max_attempts {
        let secret = secrets.get(names::TOKEN_SECRET).await?;
        if let Some(token) = extract_token(&secret)? {
            info!(
                "Token for {}/{} populated after {} read attempt(s)",
                namespace,
                names::TOKEN_SECRET,
                attempt
            );
            return Ok(token);
        }

        debug!(
            "Token not yet populated (attempt {}/{})",
            attempt, poll.max_attempts
        );
        if attempt < poll.max_attempts {
            sleep(poll.retry_interval).await;
        }
    }

    warn!(
        "Token for {}/{} still empty after {} attempts",
        namespace,
        names::TOKEN_SECRET,
        poll.max_attempts
    );
    Err(CapstanError::TokenNotReady {
        namespace: namespace.to_string(),
        secret: names::TOKEN_SECRET.to_string(),
        attempts: poll.max_attempts,
    })
}

/// Create-only. A secret left behind by an earlier partial run is reused;
/// any other failure aborts before the polling loop starts.
async fn create_token_secret(secrets: &Api<Secret>, namespace: &str) -> Result<()> {
    match secrets
        .create(&PostParams::default(), &token_secret(namespace))
        .await
    {
        Ok(_) => {
            info!("Created token secret {}/{}", namespace, names::TOKEN_SECRET);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 409 => {
            debug!(
                "Token secret {}/{} already exists, reusing it",
                namespace,
                names::TOKEN_SECRET
            );
            Ok(())
        }
        Err(e) => Err(classify_apply_error(
            &format!("secret {}", names::TOKEN_SECRET),
            e,
        )),
    }
}

/// None means the control plane has not materialized the token yet. The
/// transport base64 is already undone at the wire layer; the remaining
/// decode is UTF-8, and a non-empty field that fails it is a hard error.
fn extract_token(secret: &Secret) -> Result<Option<String>> {
    let Some(bytes) = secret.data.as_ref().and_then(|d| d.get(TOKEN_DATA_KEY)) else {
        return Ok(None);
    };
    if bytes.0.is_empty() {
        return Ok(None);
    }
    String::from_utf8(bytes.0.clone())
        .map(Some)
        .map_err(|_| CapstanError::TokenDecode {
            secret: names::TOKEN_SECRET.to_string(),
        })
}

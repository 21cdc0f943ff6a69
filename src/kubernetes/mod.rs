// Copyright 2026, The Capstan Authors
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes operations: namespace provisioning, access objects, and token
//! acquisition.

pub mod access;
pub mod client;
pub mod namespaces;
pub mod token;

pub use access::apply_access_bundle;
pub use client::build_client;
pub use namespaces::ensure_namespace_exists;
pub use token::{acquire_token, PollSettings};

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Externally wired dependencies of the task handlers.
//!
//! Each is passed into handler constructors explicitly; nothing here is a
//! process-wide singleton.

use std::sync::Arc;

use async_trait::async_trait;
use loom_ci_k8s::{ClusterControlClient, Pod};
use loom_common_secret::SecretString;

use crate::error::TaskResult;
use crate::types::{
	AppliedSecrets, ClusterConnectionConfig, EncryptedDataDetail, EncryptedRef, PodParams,
};

/// Resolves encrypted credential references to plaintext.
#[async_trait]
pub trait EncryptionService: Send + Sync {
	async fn decrypt(
		&self,
		reference: &EncryptedRef,
		details: &[EncryptedDataDetail],
	) -> TaskResult<SecretString>;
}

/// Turns typed pod parameters into a concrete pod specification.
pub trait PodSpecBuilder: Send + Sync {
	fn build(&self, params: &PodParams, secrets: &AppliedSecrets) -> TaskResult<Pod>;
}

/// Produces an authenticated cluster client for one task invocation.
#[async_trait]
pub trait ClusterClientFactory: Send + Sync {
	async fn create(
		&self,
		connection: &ClusterConnectionConfig,
		encryption_details: &[EncryptedDataDetail],
	) -> TaskResult<Arc<dyn ClusterControlClient>>;
}

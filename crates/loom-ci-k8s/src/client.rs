// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::K8sError;
use crate::types::{ExecOutcome, ExecParams, Pod, Secret};

/// Control-plane operations the CI delegate needs from a cluster.
///
/// One instance is owned by a single task invocation. The trait keeps the
/// task handlers testable without a cluster.
#[async_trait]
pub trait ClusterControlClient: Send + Sync {
	/// Create or replace a secret. `None` is a no-op.
	async fn apply_secret(&self, namespace: &str, secret: Option<Secret>) -> Result<(), K8sError>;

	/// Create a pod in the specified namespace.
	async fn create_pod(&self, namespace: &str, pod: Pod) -> Result<Pod, K8sError>;

	/// Delete a pod. Returns `false` if the cluster reports nothing was deleted.
	async fn delete_pod(&self, name: &str, namespace: &str) -> Result<bool, K8sError>;

	/// Run a command in a container and wait, up to `params.timeout`, for it
	/// to finish.
	///
	/// Returns whether the command succeeded, with the stream's failure
	/// reason when it did not. Elapsed bounds surface as
	/// [`K8sError::Timeout`]; a cancelled `interrupt` as
	/// [`K8sError::Interrupted`]. In both cases the exec stream is closed.
	async fn exec_in_container(
		&self,
		params: ExecParams,
		interrupt: &CancellationToken,
	) -> Result<ExecOutcome, K8sError>;
}

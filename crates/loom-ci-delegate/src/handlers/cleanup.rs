// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use super::TaskHandler;
use crate::collaborators::ClusterClientFactory;
use crate::error::TaskResult;
use crate::types::{CleanupTaskParams, TaskExecutionResult, TaskType};

/// Deletes a build pod. A pod that is already gone counts as a failure.
pub struct CleanupTaskHandler {
	clients: Arc<dyn ClusterClientFactory>,
}

impl CleanupTaskHandler {
	pub fn new(clients: Arc<dyn ClusterClientFactory>) -> Self {
		Self { clients }
	}

	async fn delete(&self, params: &CleanupTaskParams) -> TaskResult<bool> {
		let client = self
			.clients
			.create(&params.connection, &params.encryption_details)
			.await?;
		Ok(client.delete_pod(&params.pod_name, &params.namespace).await?)
	}
}

#[async_trait]
impl TaskHandler for CleanupTaskHandler {
	type Params = CleanupTaskParams;

	fn task_type(&self) -> TaskType {
		TaskType::Cleanup
	}

	#[instrument(skip_all, fields(pod = %params.pod_name, namespace = %params.namespace))]
	async fn execute_task_internal(&self, params: CleanupTaskParams) -> TaskExecutionResult {
		match self.delete(&params).await {
			Ok(true) => {
				info!("Build pod deleted");
				TaskExecutionResult::success()
			}
			Ok(false) => {
				warn!("Build pod was not deleted");
				TaskExecutionResult::failure(format!(
					"pod {}/{} was not deleted",
					params.namespace, params.pod_name
				))
			}
			Err(e) => {
				error!(error = %e, "Cleanup task failed");
				TaskExecutionResult::failure(e.to_string())
			}
		}
	}
}

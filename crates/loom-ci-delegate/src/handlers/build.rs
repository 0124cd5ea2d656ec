// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument};

use super::TaskHandler;
use crate::collaborators::{ClusterClientFactory, PodSpecBuilder};
use crate::error::TaskResult;
use crate::secrets::SecretSpecBuilder;
use crate::types::{AppliedSecrets, BuildTaskParams, TaskExecutionResult, TaskType};

/// Provisions credentials and creates the build pod.
///
/// Secrets are applied before the pod is created so it can reference them.
/// Nothing is rolled back when a later step fails.
pub struct BuildTaskHandler {
	clients: Arc<dyn ClusterClientFactory>,
	secrets: SecretSpecBuilder,
	pod_specs: Arc<dyn PodSpecBuilder>,
}

impl BuildTaskHandler {
	pub fn new(
		clients: Arc<dyn ClusterClientFactory>,
		secrets: SecretSpecBuilder,
		pod_specs: Arc<dyn PodSpecBuilder>,
	) -> Self {
		Self {
			clients,
			secrets,
			pod_specs,
		}
	}

	async fn build(&self, params: BuildTaskParams) -> TaskResult<()> {
		let client = self
			.clients
			.create(&params.connection, &params.encryption_details)
			.await?;
		let namespace = params.pod.namespace.as_str();
		let mut applied = AppliedSecrets::default();

		let git_secret = self
			.secrets
			.git_secret_spec(params.git.as_ref(), &params.encryption_details, namespace)
			.await?;
		applied.git = git_secret.as_ref().and_then(|s| s.metadata.name.clone());
		client.apply_secret(namespace, git_secret).await?;

		for container in &params.pod.containers {
			let Some(credential) = &container.registry else {
				continue;
			};
			let registry_secret = self.secrets.registry_secret_spec(credential, namespace)?;
			if let Some(name) = registry_secret.as_ref().and_then(|s| s.metadata.name.clone()) {
				debug!(container = %container.name, secret = %name, "Applying image pull secret");
				applied.registry.insert(container.name.clone(), name);
			}
			client.apply_secret(namespace, registry_secret).await?;
		}

		let pod = self.pod_specs.build(&params.pod, &applied)?;
		let created = client.create_pod(namespace, pod).await?;
		info!(
			pod = created.metadata.name.as_deref().unwrap_or(&params.pod.name),
			namespace = %namespace,
			"Build pod created"
		);
		Ok(())
	}
}

#[async_trait]
impl TaskHandler for BuildTaskHandler {
	type Params = BuildTaskParams;

	fn task_type(&self) -> TaskType {
		TaskType::Build
	}

	#[instrument(skip_all, fields(pod = %params.pod.name, namespace = %params.pod.namespace))]
	async fn execute_task_internal(&self, params: BuildTaskParams) -> TaskExecutionResult {
		match self.build(params).await {
			Ok(()) => TaskExecutionResult::success(),
			Err(e) => {
				error!(error = %e, "Build task failed");
				TaskExecutionResult::failure(e.to_string())
			}
		}
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Routes task payloads to their handler.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::cluster::KubeClusterClientFactory;
use crate::collaborators::{ClusterClientFactory, EncryptionService, PodSpecBuilder};
use crate::command::CommandExecutor;
use crate::config::DelegateConfig;
use crate::handlers::{BuildTaskHandler, CleanupTaskHandler, ExecuteCommandTaskHandler, TaskHandler};
use crate::secrets::SecretSpecBuilder;
use crate::types::{TaskExecutionResult, TaskParams};

pub struct TaskDispatcher {
	build: BuildTaskHandler,
	cleanup: CleanupTaskHandler,
	exec: ExecuteCommandTaskHandler,
}

impl TaskDispatcher {
	pub fn new(
		build: BuildTaskHandler,
		cleanup: CleanupTaskHandler,
		exec: ExecuteCommandTaskHandler,
	) -> Self {
		Self {
			build,
			cleanup,
			exec,
		}
	}

	/// Wire all handlers to one client factory. Cancelling `shutdown`
	/// interrupts every in-flight exec task.
	pub fn with_collaborators(
		clients: Arc<dyn ClusterClientFactory>,
		encryption: Arc<dyn EncryptionService>,
		pod_specs: Arc<dyn PodSpecBuilder>,
		executor: CommandExecutor,
		shutdown: CancellationToken,
	) -> Self {
		Self::new(
			BuildTaskHandler::new(clients.clone(), SecretSpecBuilder::new(encryption), pod_specs),
			CleanupTaskHandler::new(clients.clone()),
			ExecuteCommandTaskHandler::with_shutdown(clients, executor, shutdown),
		)
	}

	/// Production wiring: kube-rs clients configured from `config`.
	pub fn from_config(
		config: &DelegateConfig,
		encryption: Arc<dyn EncryptionService>,
		pod_specs: Arc<dyn PodSpecBuilder>,
		shutdown: CancellationToken,
	) -> Self {
		let clients = Arc::new(KubeClusterClientFactory::from_config(encryption.clone(), config));
		Self::with_collaborators(
			clients,
			encryption,
			pod_specs,
			CommandExecutor::from_config(config),
			shutdown,
		)
	}

	/// A fresh interrupt handle for one dispatched task.
	pub fn task_interrupt(&self) -> CancellationToken {
		self.exec.task_interrupt()
	}

	pub async fn dispatch(&self, params: TaskParams) -> TaskExecutionResult {
		let interrupt = self.task_interrupt();
		self.dispatch_interruptible(params, &interrupt).await
	}

	/// Dispatch with a caller-held interrupt handle. Only exec tasks wait on
	/// it.
	#[instrument(skip_all, fields(task_type = %params.task_type()))]
	pub async fn dispatch_interruptible(
		&self,
		params: TaskParams,
		interrupt: &CancellationToken,
	) -> TaskExecutionResult {
		debug!("Dispatching task");
		match params {
			TaskParams::Build(p) => self.build.execute_task_internal(p).await,
			TaskParams::Cleanup(p) => self.cleanup.execute_task_internal(p).await,
			TaskParams::ExecCommand(p) => self.exec.execute_interruptible(p, interrupt).await,
		}
	}
}

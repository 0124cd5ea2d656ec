// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use loom_ci_k8s::ExecOutcome;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::TaskHandler;
use crate::collaborators::ClusterClientFactory;
use crate::command::CommandExecutor;
use crate::error::{TaskError, TaskResult};
use crate::types::{ExecCommandTaskParams, TaskExecutionResult, TaskType};

pub const TIMED_OUT_MESSAGE: &str = "command timed out";
pub const INTERRUPTED_MESSAGE: &str = "command execution was interrupted";
pub const EXIT_FAILURE_MESSAGE: &str = "command exited with failure";

/// Runs a command sequence inside a live build container.
///
/// Each task waits on its own interrupt token, a child of the handler's
/// shutdown token. Cancelling one task's token leaves concurrent and later
/// tasks untouched; cancelling the shutdown token interrupts all of them.
pub struct ExecuteCommandTaskHandler {
	clients: Arc<dyn ClusterClientFactory>,
	executor: CommandExecutor,
	shutdown: CancellationToken,
}

impl ExecuteCommandTaskHandler {
	pub fn new(clients: Arc<dyn ClusterClientFactory>, executor: CommandExecutor) -> Self {
		Self::with_shutdown(clients, executor, CancellationToken::new())
	}

	pub fn with_shutdown(
		clients: Arc<dyn ClusterClientFactory>,
		executor: CommandExecutor,
		shutdown: CancellationToken,
	) -> Self {
		Self {
			clients,
			executor,
			shutdown,
		}
	}

	pub fn shutdown_token(&self) -> &CancellationToken {
		&self.shutdown
	}

	/// A fresh interrupt handle for one task.
	pub fn task_interrupt(&self) -> CancellationToken {
		self.shutdown.child_token()
	}

	/// Run one task, abandoning the wait when `interrupt` is cancelled.
	///
	/// `interrupt` is left cancelled afterwards; pass a token from
	/// [`task_interrupt`](Self::task_interrupt) so shutdown also reaches it.
	#[instrument(
		skip_all,
		fields(
			pod = %params.request.pod_name,
			container = %params.request.container_name,
			namespace = %params.request.namespace
		)
	)]
	pub async fn execute_interruptible(
		&self,
		params: ExecCommandTaskParams,
		interrupt: &CancellationToken,
	) -> TaskExecutionResult {
		match self.run(&params, interrupt).await {
			Ok(outcome) if outcome.success => {
				info!("Command succeeded");
				TaskExecutionResult::success()
			}
			Ok(outcome) => {
				warn!(reason = outcome.reason.as_deref().unwrap_or(""), "Command failed");
				TaskExecutionResult::failure(match outcome.reason {
					Some(reason) => format!("{EXIT_FAILURE_MESSAGE}: {reason}"),
					None => EXIT_FAILURE_MESSAGE.to_string(),
				})
			}
			Err(TaskError::Timeout) => {
				warn!(
					timeout_secs = self.executor.effective_timeout(&params.request).as_secs(),
					"Command did not finish in time"
				);
				TaskExecutionResult::failure(TIMED_OUT_MESSAGE)
			}
			Err(TaskError::Interrupted) => {
				warn!("Command wait interrupted");
				TaskExecutionResult::failure(INTERRUPTED_MESSAGE)
			}
			Err(e) => {
				error!(error = %e, "Exec command task failed");
				TaskExecutionResult::failure(e.to_string())
			}
		}
	}

	async fn run(
		&self,
		params: &ExecCommandTaskParams,
		interrupt: &CancellationToken,
	) -> TaskResult<ExecOutcome> {
		let client = self
			.clients
			.create(&params.connection, &params.encryption_details)
			.await?;
		self.executor
			.execute(client.as_ref(), &params.request, interrupt)
			.await
	}
}

#[async_trait]
impl TaskHandler for ExecuteCommandTaskHandler {
	type Params = ExecCommandTaskParams;

	fn task_type(&self) -> TaskType {
		TaskType::ExecCommand
	}

	async fn execute_task_internal(&self, params: ExecCommandTaskParams) -> TaskExecutionResult {
		let interrupt = self.task_interrupt();
		self.execute_interruptible(params, &interrupt).await
	}
}

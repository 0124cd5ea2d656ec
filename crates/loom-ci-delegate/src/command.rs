// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Encodes a command sequence into one shell invocation and runs it in a
//! container.

use std::time::Duration;

use loom_ci_k8s::{ClusterControlClient, ExecOutcome, ExecParams};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::DelegateConfig;
use crate::error::{TaskError, TaskResult};
use crate::types::{ExecCommandRequest, ScriptDialect};

pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(3600);
pub const DEFAULT_SHELL: &str = "sh";

#[derive(Debug, Clone)]
pub struct CommandExecutor {
	shell: String,
	default_timeout: Duration,
}

impl Default for CommandExecutor {
	fn default() -> Self {
		Self::new(DEFAULT_SHELL, DEFAULT_EXEC_TIMEOUT)
	}
}

impl CommandExecutor {
	pub fn new(shell: impl Into<String>, default_timeout: Duration) -> Self {
		Self {
			shell: shell.into(),
			default_timeout,
		}
	}

	pub fn from_config(config: &DelegateConfig) -> Self {
		Self::new(config.shell.clone(), config.default_exec_timeout())
	}

	pub fn effective_timeout(&self, request: &ExecCommandRequest) -> Duration {
		request
			.timeout_secs
			.map(Duration::from_secs)
			.unwrap_or(self.default_timeout)
	}

	/// Build the argv for `request`.
	///
	/// The commands run in a function under `set -e` so the first failing
	/// command aborts the rest, with stdout and stderr redirected to the
	/// requested files. The whole script is percent-encoded into a single
	/// argument so no command text is split or reinterpreted by the exec
	/// transport.
	pub fn encode_command(&self, request: &ExecCommandRequest) -> TaskResult<Vec<String>> {
		if request.dialect == ScriptDialect::PowerShell {
			return Err(TaskError::configuration(
				"PowerShell scripts are not supported for in-container execution",
			));
		}
		if request.commands.is_empty() {
			return Err(TaskError::configuration("no commands to execute"));
		}

		let script = format!(
			"runCmd() {{ set -e; {}; }}; runCmd > {} 2> {}",
			request.commands.join("; "),
			request.stdout_path,
			request.stderr_path
		);

		Ok(vec![
			self.shell.clone(),
			"-c".to_string(),
			urlencoding::encode(&script).into_owned(),
		])
	}

	/// Run `request` through `client` and report how it finished.
	#[instrument(
		skip(self, client, request, interrupt),
		fields(pod = %request.pod_name, container = %request.container_name)
	)]
	pub async fn execute(
		&self,
		client: &dyn ClusterControlClient,
		request: &ExecCommandRequest,
		interrupt: &CancellationToken,
	) -> TaskResult<ExecOutcome> {
		let command = self.encode_command(request)?;
		let timeout = self.effective_timeout(request);
		debug!(
			commands = request.commands.len(),
			timeout_secs = timeout.as_secs(),
			"Encoded command sequence"
		);

		let params = ExecParams {
			pod: request.pod_name.clone(),
			container: request.container_name.clone(),
			namespace: request.namespace.clone(),
			command,
			timeout,
		};
		Ok(client.exec_in_container(params, interrupt).await?)
	}
}

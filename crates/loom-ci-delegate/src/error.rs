// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Task error types.

use loom_ci_k8s::K8sError;

pub type TaskResult<T> = Result<T, TaskError>;

/// Errors raised while running a delegate task.
///
/// Handlers never let these escape; they are folded into a
/// [`TaskExecutionResult`](crate::types::TaskExecutionResult) message.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
	/// Invalid or unsupported settings, detected before any network call.
	#[error("Configuration error: {message}")]
	Configuration { message: String },

	/// The request references a credential of the wrong kind.
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },

	/// A secret payload could not be serialized for transport.
	#[error("Failed to encode {what}: {message}")]
	Encoding { what: String, message: String },

	#[error("Failed to decrypt {field}: {message}")]
	Decryption { field: String, message: String },

	#[error("Failed to build pod spec: {message}")]
	PodSpec { message: String },

	#[error("Command timed out")]
	Timeout,

	#[error("Command execution was interrupted")]
	Interrupted,

	/// Cluster API or network failure.
	#[error(transparent)]
	Transport(K8sError),
}

impl TaskError {
	pub fn configuration(message: impl Into<String>) -> Self {
		TaskError::Configuration {
			message: message.into(),
		}
	}

	pub fn invalid_request(message: impl Into<String>) -> Self {
		TaskError::InvalidRequest {
			message: message.into(),
		}
	}

	pub fn encoding(what: impl Into<String>, message: impl ToString) -> Self {
		TaskError::Encoding {
			what: what.into(),
			message: message.to_string(),
		}
	}
}

impl From<K8sError> for TaskError {
	fn from(err: K8sError) -> Self {
		match err {
			K8sError::Timeout => TaskError::Timeout,
			K8sError::Interrupted => TaskError::Interrupted,
			other => TaskError::Transport(other),
		}
	}
}

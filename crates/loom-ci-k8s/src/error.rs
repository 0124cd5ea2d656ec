// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for cluster operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur while talking to the cluster.
///
/// `Timeout` and `Interrupted` are kept apart from transport failures so a
/// stuck command can be told apart from an unreachable cluster.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("Failed to connect to cluster at {master_url}: {message}")]
	Connection { master_url: String, message: String },

	#[error("Operation timed out")]
	Timeout,

	#[error("Operation interrupted")]
	Interrupted,

	#[error("Exec stream error: {message}")]
	StreamError { message: String },
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		K8sError::ApiError {
			message: err.to_string(),
		}
	}
}

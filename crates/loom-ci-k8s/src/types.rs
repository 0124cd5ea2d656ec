// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

use loom_common_secret::SecretString;

pub use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodStatus, Secret};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
pub use k8s_openapi::ByteString;

/// Websocket close code for an exec stream that finished normally.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Websocket close code for a stream that ended without a status frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;
/// Application close code for a command that reported a failure status.
pub const COMMAND_FAILED: u16 = 4000;

/// Everything needed to reach and authenticate against one cluster, with
/// credential material already decrypted.
#[derive(Debug, Clone)]
pub struct ClusterEndpoint {
	pub master_url: String,
	pub namespace: String,
	pub auth: ClusterAuth,
	/// Base64 PEM bundle for the API server CA.
	pub ca_cert_data: Option<String>,
	pub skip_tls_verify: bool,
	pub proxy_url: Option<String>,
}

/// Plaintext cluster authentication.
#[derive(Debug, Clone)]
pub enum ClusterAuth {
	None,
	Token(SecretString),
	Basic {
		username: String,
		password: SecretString,
	},
	ClientCertificate {
		/// Base64 PEM client certificate.
		cert_data: String,
		/// Base64 PEM private key.
		key_data: SecretString,
	},
}

/// A single command invocation inside a running container.
#[derive(Debug, Clone)]
pub struct ExecParams {
	pub pod: String,
	pub container: String,
	pub namespace: String,
	pub command: Vec<String>,
	pub timeout: Duration,
}

/// Result of a completed exec call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
	pub success: bool,
	/// Failure or close reason reported by the stream. Absent on success.
	pub reason: Option<String>,
}

impl ExecOutcome {
	pub fn succeeded() -> Self {
		Self {
			success: true,
			reason: None,
		}
	}

	pub fn failed(reason: Option<String>) -> Self {
		Self {
			success: false,
			reason,
		}
	}
}

/// Observable state of an exec stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecCompletionSignal {
	Pending,
	Succeeded,
	Failed,
}

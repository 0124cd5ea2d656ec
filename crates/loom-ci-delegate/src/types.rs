// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Task parameter and result types.
//!
//! Parameters arrive already deserialized from the dispatch layer. Encrypted
//! material is carried as [`EncryptedRef`]s and only resolved through the
//! [`EncryptionService`](crate::collaborators::EncryptionService).

use std::collections::BTreeMap;
use std::fmt;

use loom_common_secret::SecretString;
use serde::{Deserialize, Serialize};

/// Reference to an encrypted credential held by the secret manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedRef(pub String);

impl fmt::Display for EncryptedRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Describes how one encrypted field can be decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDataDetail {
	pub field_name: String,
	pub encrypted_ref: EncryptedRef,
	/// Secret manager that holds the key (e.g. "local", "vault", "gcp-kms").
	pub manager: String,
}

/// How to reach the target cluster. Built fresh for every task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConnectionConfig {
	pub master_url: String,
	pub namespace: String,
	#[serde(default)]
	pub auth: ConnectionAuth,
	/// Base64 PEM bundle for the API server CA.
	#[serde(default)]
	pub ca_cert_data: Option<String>,
	#[serde(default)]
	pub skip_tls_verify: bool,
}

/// Cluster authentication, with secret material still encrypted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectionAuth {
	#[default]
	None,
	ServiceAccountToken {
		token: EncryptedRef,
	},
	UsernamePassword {
		username: String,
		password: EncryptedRef,
	},
	ClientCertificate {
		cert_data: String,
		key: EncryptedRef,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitAuthScheme {
	Http,
	Ssh,
	Kerberos,
}

/// A host credential linked from a git connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCredential {
	SshKey { user: String, key: EncryptedRef },
	Password { user: String, password: EncryptedRef },
	Kerberos { principal: String, realm: String },
}

/// Git connector settings for the clone step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
	pub repo_url: String,
	#[serde(default)]
	pub branch: Option<String>,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<EncryptedRef>,
	pub auth_scheme: GitAuthScheme,
	#[serde(default)]
	pub ssh_credential: Option<HostCredential>,
}

/// Registry credentials for pulling one container image.
///
/// Already decrypted by the dispatch layer; any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryCredential {
	#[serde(default)]
	pub registry_url: Option<String>,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<SecretString>,
}

/// One container of the build pod, as handed to the pod-spec builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerParams {
	pub name: String,
	pub image: String,
	#[serde(default)]
	pub registry: Option<RegistryCredential>,
	#[serde(default)]
	pub commands: Vec<String>,
	#[serde(default)]
	pub args: Vec<String>,
	#[serde(default)]
	pub env: BTreeMap<String, String>,
	#[serde(default)]
	pub working_dir: Option<String>,
}

/// The build pod, as handed to the pod-spec builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodParams {
	pub name: String,
	pub namespace: String,
	#[serde(default)]
	pub labels: BTreeMap<String, String>,
	pub containers: Vec<ContainerParams>,
}

/// Names of the secrets applied before pod creation, so the pod spec can
/// mount or reference them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedSecrets {
	pub git: Option<String>,
	/// Container name to image pull secret name.
	pub registry: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTaskParams {
	pub connection: ClusterConnectionConfig,
	#[serde(default)]
	pub encryption_details: Vec<EncryptedDataDetail>,
	pub pod: PodParams,
	#[serde(default)]
	pub git: Option<GitConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupTaskParams {
	pub connection: ClusterConnectionConfig,
	#[serde(default)]
	pub encryption_details: Vec<EncryptedDataDetail>,
	pub pod_name: String,
	pub namespace: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptDialect {
	#[default]
	Posix,
	#[serde(rename = "powershell")]
	PowerShell,
}

/// A command sequence to run inside a live container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecCommandRequest {
	pub pod_name: String,
	pub container_name: String,
	pub namespace: String,
	pub commands: Vec<String>,
	pub stdout_path: String,
	pub stderr_path: String,
	/// Falls back to the configured default (one hour) when absent.
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub dialect: ScriptDialect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecCommandTaskParams {
	pub connection: ClusterConnectionConfig,
	#[serde(default)]
	pub encryption_details: Vec<EncryptedDataDetail>,
	pub request: ExecCommandRequest,
}

/// Routing tag for task payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
	Build,
	Cleanup,
	ExecCommand,
}

impl fmt::Display for TaskType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let tag = match self {
			TaskType::Build => "build",
			TaskType::Cleanup => "cleanup",
			TaskType::ExecCommand => "exec_command",
		};
		f.write_str(tag)
	}
}

/// A task payload, tagged by its [`TaskType`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskParams {
	Build(BuildTaskParams),
	Cleanup(CleanupTaskParams),
	ExecCommand(ExecCommandTaskParams),
}

impl TaskParams {
	pub fn task_type(&self) -> TaskType {
		match self {
			TaskParams::Build(_) => TaskType::Build,
			TaskParams::Cleanup(_) => TaskType::Cleanup,
			TaskParams::ExecCommand(_) => TaskType::ExecCommand,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandExecutionStatus {
	Success,
	Failure,
}

/// Uniform outcome every handler reports to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskExecutionResult {
	pub status: CommandExecutionStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
}

impl TaskExecutionResult {
	pub fn success() -> Self {
		Self {
			status: CommandExecutionStatus::Success,
			error_message: None,
		}
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			status: CommandExecutionStatus::Failure,
			error_message: Some(message.into()),
		}
	}

	pub fn is_success(&self) -> bool {
		self.status == CommandExecutionStatus::Success
	}
}

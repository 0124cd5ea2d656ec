// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delegate configuration.
//!
//! Values are resolved in order: built-in defaults, then an optional TOML
//! file, then `LOOM_CI_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::{DEFAULT_EXEC_TIMEOUT, DEFAULT_SHELL};

pub const ENV_PREFIX: &str = "LOOM_CI_";

const DEFAULT_POD_DELETE_GRACE_PERIOD_SECS: u32 = 30;
const DEFAULT_FIELD_MANAGER: &str = "loom-ci-delegate";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("Failed to parse TOML config at {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to initialize logging: {0}")]
	Logging(String),
}

impl ConfigError {
	fn invalid(key: &str, message: impl Into<String>) -> Self {
		ConfigError::InvalidValue {
			key: key.to_string(),
			message: message.into(),
		}
	}
}

/// Delegate configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DelegateConfigLayer {
	pub default_exec_timeout_secs: Option<u64>,
	pub shell: Option<String>,
	pub pod_delete_grace_period_secs: Option<u32>,
	pub field_manager: Option<String>,
	pub http_proxy: Option<String>,
	pub log_level: Option<String>,
	pub log_json: Option<bool>,
}

impl DelegateConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: Self) {
		if other.default_exec_timeout_secs.is_some() {
			self.default_exec_timeout_secs = other.default_exec_timeout_secs;
		}
		if other.shell.is_some() {
			self.shell = other.shell;
		}
		if other.pod_delete_grace_period_secs.is_some() {
			self.pod_delete_grace_period_secs = other.pod_delete_grace_period_secs;
		}
		if other.field_manager.is_some() {
			self.field_manager = other.field_manager;
		}
		if other.http_proxy.is_some() {
			self.http_proxy = other.http_proxy;
		}
		if other.log_level.is_some() {
			self.log_level = other.log_level;
		}
		if other.log_json.is_some() {
			self.log_json = other.log_json;
		}
	}

	pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
		toml::from_str(content).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}

	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content, path)
	}

	/// Build a layer from `LOOM_CI_*` variables, read through `lookup`.
	///
	/// Empty values are treated as unset.
	pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| {
			lookup(&format!("{ENV_PREFIX}{name}"))
				.map(|v| v.trim().to_string())
				.filter(|v| !v.is_empty())
		};

		Ok(Self {
			default_exec_timeout_secs: get("DEFAULT_EXEC_TIMEOUT_SECS")
				.map(|v| parse_env("DEFAULT_EXEC_TIMEOUT_SECS", &v))
				.transpose()?,
			shell: get("SHELL"),
			pod_delete_grace_period_secs: get("POD_DELETE_GRACE_PERIOD_SECS")
				.map(|v| parse_env("POD_DELETE_GRACE_PERIOD_SECS", &v))
				.transpose()?,
			field_manager: get("FIELD_MANAGER"),
			http_proxy: get("HTTP_PROXY"),
			log_level: get("LOG_LEVEL"),
			log_json: get("LOG_JSON")
				.map(|v| parse_env("LOG_JSON", &v))
				.transpose()?,
		})
	}

	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_env_with(|key| std::env::var(key).ok())
	}

	pub fn finalize(self) -> Result<DelegateConfig, ConfigError> {
		let default_exec_timeout_secs = self
			.default_exec_timeout_secs
			.unwrap_or(DEFAULT_EXEC_TIMEOUT.as_secs());
		if default_exec_timeout_secs == 0 {
			return Err(ConfigError::invalid(
				"default_exec_timeout_secs",
				"must be greater than zero",
			));
		}

		let shell = self.shell.unwrap_or_else(|| DEFAULT_SHELL.to_string());
		if shell.trim().is_empty() {
			return Err(ConfigError::invalid("shell", "must not be empty"));
		}

		let field_manager = self
			.field_manager
			.unwrap_or_else(|| DEFAULT_FIELD_MANAGER.to_string());
		if field_manager.trim().is_empty() {
			return Err(ConfigError::invalid("field_manager", "must not be empty"));
		}

		if let Some(proxy) = &self.http_proxy {
			url::Url::parse(proxy).map_err(|e| ConfigError::invalid("http_proxy", e.to_string()))?;
		}

		Ok(DelegateConfig {
			default_exec_timeout_secs,
			shell,
			pod_delete_grace_period_secs: self
				.pod_delete_grace_period_secs
				.unwrap_or(DEFAULT_POD_DELETE_GRACE_PERIOD_SECS),
			field_manager,
			http_proxy: self.http_proxy,
			log_level: self
				.log_level
				.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
			log_json: self.log_json.unwrap_or(false),
		})
	}
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	value
		.parse()
		.map_err(|e: T::Err| ConfigError::invalid(&format!("{ENV_PREFIX}{name}"), e.to_string()))
}

/// Resolved delegate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DelegateConfig {
	pub default_exec_timeout_secs: u64,
	pub shell: String,
	pub pod_delete_grace_period_secs: u32,
	pub field_manager: String,
	pub http_proxy: Option<String>,
	pub log_level: String,
	pub log_json: bool,
}

impl Default for DelegateConfig {
	fn default() -> Self {
		Self {
			default_exec_timeout_secs: DEFAULT_EXEC_TIMEOUT.as_secs(),
			shell: DEFAULT_SHELL.to_string(),
			pod_delete_grace_period_secs: DEFAULT_POD_DELETE_GRACE_PERIOD_SECS,
			field_manager: DEFAULT_FIELD_MANAGER.to_string(),
			http_proxy: None,
			log_level: DEFAULT_LOG_LEVEL.to_string(),
			log_json: false,
		}
	}
}

impl DelegateConfig {
	/// Load configuration from an optional TOML file and the environment.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let mut layer = DelegateConfigLayer::default();
		if let Some(path) = path {
			layer.merge(DelegateConfigLayer::from_file(path)?);
		}
		layer.merge(DelegateConfigLayer::from_env()?);
		layer.finalize()
	}

	pub fn default_exec_timeout(&self) -> Duration {
		Duration::from_secs(self.default_exec_timeout_secs)
	}
}

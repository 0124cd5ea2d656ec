// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ConfigError, DelegateConfig};

/// `RUST_LOG` when set, otherwise the configured level.
pub fn env_filter(config: &DelegateConfig) -> Result<EnvFilter, ConfigError> {
	match EnvFilter::try_from_default_env() {
		Ok(filter) => Ok(filter),
		Err(_) => EnvFilter::try_new(&config.log_level)
			.map_err(|e| ConfigError::Logging(format!("invalid log level {:?}: {e}", config.log_level))),
	}
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &DelegateConfig) -> Result<(), ConfigError> {
	let json = config
		.log_json
		.then(|| tracing_subscriber::fmt::layer().json());
	let plain = (!config.log_json).then(tracing_subscriber::fmt::layer);

	tracing_subscriber::registry()
		.with(env_filter(config)?)
		.with(json)
		.with(plain)
		.try_init()
		.map_err(|e| ConfigError::Logging(e.to_string()))
}

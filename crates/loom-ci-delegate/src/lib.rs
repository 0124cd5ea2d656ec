// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Delegate-side CI task execution on Kubernetes.
//!
//! This crate provides:
//! - Secret specs for git and container-registry credentials
//! - Build, cleanup and exec-command task handlers
//! - A dispatcher routing tagged task payloads to those handlers
//! - Delegate configuration and logging setup
//!
//! Cluster access goes through [`loom_ci_k8s::ClusterControlClient`];
//! decryption and pod-spec construction are injected via the traits in
//! [`collaborators`].

pub mod cluster;
pub mod collaborators;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod secrets;
pub mod types;

pub use cluster::KubeClusterClientFactory;
pub use collaborators::{ClusterClientFactory, EncryptionService, PodSpecBuilder};
pub use command::{CommandExecutor, DEFAULT_EXEC_TIMEOUT, DEFAULT_SHELL};
pub use config::{ConfigError, DelegateConfig, DelegateConfigLayer};
pub use dispatch::TaskDispatcher;
pub use error::{TaskError, TaskResult};
pub use handlers::{BuildTaskHandler, CleanupTaskHandler, ExecuteCommandTaskHandler, TaskHandler};
pub use secrets::SecretSpecBuilder;
pub use types::*;

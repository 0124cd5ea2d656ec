// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Cluster access for the Loom CI delegate.
//!
//! This crate provides:
//! - A trait-based cluster control client for testability
//! - Production implementation using the kube crate
//! - The exec completion listener that bounds in-container commands

mod client;
mod error;
mod exec_listener;
mod kube_client;
mod types;

pub use client::ClusterControlClient;
pub use error::{K8sError, K8sResult};
pub use exec_listener::ExecCompletionListener;
pub use kube_client::{KubeClient, KubeClientOptions};
pub use types::{
	ByteString, ClusterAuth, ClusterEndpoint, Container, ExecCompletionSignal, ExecOutcome, ExecParams,
	ObjectMeta, Pod, PodSpec, PodStatus, Secret, ABNORMAL_CLOSURE, COMMAND_FAILED, NORMAL_CLOSURE,
};

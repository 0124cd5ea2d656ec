// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Task handlers.
//!
//! Every handler reports through [`TaskExecutionResult`]; errors never
//! escape `execute_task_internal`.

mod build;
mod cleanup;
mod exec;

pub use build::BuildTaskHandler;
pub use cleanup::CleanupTaskHandler;
pub use exec::{
	ExecuteCommandTaskHandler, EXIT_FAILURE_MESSAGE, INTERRUPTED_MESSAGE, TIMED_OUT_MESSAGE,
};

use async_trait::async_trait;

use crate::types::{TaskExecutionResult, TaskType};

#[async_trait]
pub trait TaskHandler: Send + Sync {
	type Params: Send;

	fn task_type(&self) -> TaskType;

	async fn execute_task_internal(&self, params: Self::Params) -> TaskExecutionResult;
}

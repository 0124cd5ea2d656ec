// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Completion bridge for exec streams.
//!
//! The exec websocket is driven on its own task and reports back through the
//! `on_*` callbacks. The caller blocks on [`ExecCompletionListener::wait_for_completion`]
//! with an upper bound. A zero-permit semaphore acts as a single-fire latch:
//! whichever of failure or close arrives first releases it exactly once, and
//! every later callback is ignored.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{K8sError, K8sResult};
use crate::types::{ExecCompletionSignal, NORMAL_CLOSURE};

const PENDING: u8 = 0;
const SUCCEEDED: u8 = 1;
const FAILED: u8 = 2;

/// Single-use listener for one exec call.
#[derive(Debug)]
pub struct ExecCompletionListener {
	permit: Semaphore,
	state: AtomicU8,
	/// Reason carried by the winning event; set before the permit is released.
	reason: OnceLock<String>,
	stream: CancellationToken,
}

impl Default for ExecCompletionListener {
	fn default() -> Self {
		Self::new()
	}
}

impl ExecCompletionListener {
	pub fn new() -> Self {
		Self {
			permit: Semaphore::new(0),
			state: AtomicU8::new(PENDING),
			reason: OnceLock::new(),
			stream: CancellationToken::new(),
		}
	}

	/// Token the stream driver watches; cancelled when the waiter gives up.
	pub fn stream_token(&self) -> CancellationToken {
		self.stream.clone()
	}

	pub fn on_open(&self) {
		debug!("Exec stream opened");
	}

	pub fn on_failure(&self, error: &str) {
		if self.complete(FAILED, error) {
			warn!(error = %error, "Exec stream failed");
		} else {
			debug!(error = %error, "Ignoring exec failure after completion");
		}
	}

	pub fn on_close(&self, code: u16, reason: &str) {
		let outcome = if code == NORMAL_CLOSURE {
			SUCCEEDED
		} else {
			FAILED
		};
		if self.complete(outcome, reason) {
			debug!(code, reason = %reason, "Exec stream closed");
		} else {
			debug!(code, reason = %reason, "Ignoring exec close after completion");
		}
	}

	pub fn signal(&self) -> ExecCompletionSignal {
		match self.state.load(Ordering::Acquire) {
			SUCCEEDED => ExecCompletionSignal::Succeeded,
			FAILED => ExecCompletionSignal::Failed,
			_ => ExecCompletionSignal::Pending,
		}
	}

	/// Error or close reason of the event that completed the stream, if it
	/// carried one.
	pub fn reason(&self) -> Option<&str> {
		self.reason.get().map(String::as_str).filter(|r| !r.is_empty())
	}

	/// Ask the driver to tear down the stream. Does not signal the remote
	/// process; it may keep running.
	pub fn close_stream(&self) {
		self.stream.cancel();
	}

	/// Wait up to `timeout` for the stream to finish.
	///
	/// Returns whether the command succeeded. If the bound elapses or
	/// `interrupt` fires first, the stream is closed and `Timeout` or
	/// `Interrupted` is returned; no default outcome is ever reported.
	pub async fn wait_for_completion(
		&self,
		timeout: Duration,
		interrupt: &CancellationToken,
	) -> K8sResult<bool> {
		let acquire = async {
			tokio::select! {
				biased;
				permit = self.permit.acquire() => match permit {
					Ok(permit) => {
						permit.forget();
						Ok(())
					}
					Err(_) => Err(K8sError::StreamError {
						message: "exec completion latch closed".to_string(),
					}),
				},
				_ = interrupt.cancelled() => Err(K8sError::Interrupted),
			}
		};

		match tokio::time::timeout(timeout, acquire).await {
			Ok(Ok(())) => Ok(self.signal() == ExecCompletionSignal::Succeeded),
			Ok(Err(err)) => {
				self.close_stream();
				Err(err)
			}
			Err(_) => {
				warn!(timeout_secs = timeout.as_secs(), "Exec timed out, closing stream");
				self.close_stream();
				Err(K8sError::Timeout)
			}
		}
	}

	fn complete(&self, outcome: u8, reason: &str) -> bool {
		let won = self
			.state
			.compare_exchange(PENDING, outcome, Ordering::AcqRel, Ordering::Acquire)
			.is_ok();
		if won {
			let _ = self.reason.set(reason.to_string());
			self.permit.add_permits(1);
		}
		won
	}
}

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Holder for decrypted credential material.
//!
//! Delegate tasks carry registry passwords, git tokens and SSH keys between
//! the decryption service and the cluster. [`SecretString`] keeps those values
//! out of logs and task dumps:
//!
//! - `Debug`, `Display` and `Serialize` always render [`REDACTED`]
//! - the backing buffer is zeroed on drop
//! - reading the value needs an explicit [`SecretString::expose`]
//!
//! ```
//! use loom_common_secret::SecretString;
//!
//! let password = SecretString::new("hunter2");
//! assert_eq!(format!("{password}"), "[REDACTED]");
//! assert_eq!(password.expose(), "hunter2");
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

/// Placeholder rendered wherever a secret would otherwise be printed.
pub const REDACTED: &str = "[REDACTED]";

/// A plaintext credential that never prints itself.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(value: impl Into<String>) -> Self {
		Self(Zeroizing::new(value.into()))
	}

	/// Borrow the plaintext. Call sites opt in explicitly.
	pub fn expose(&self) -> &str {
		self.0.as_str()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Treats blank values as absent; credential fields often arrive as `""`.
	pub fn non_blank(value: Option<&SecretString>) -> Option<&SecretString> {
		value.filter(|s| !s.expose().trim().is_empty())
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretString").field(&REDACTED).finish()
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(Self::new)
	}
}

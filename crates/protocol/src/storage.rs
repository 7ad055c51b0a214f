//! Browser storage state persisted between runs.
//!
//! The shape follows the Playwright storage-state format so files can be
//! inspected with the same tooling.

use serde::{Deserialize, Serialize};

/// Cookie as captured from the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	/// Unix timestamp in seconds; `-1` or absent for session cookies.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<String>,
}

/// One `localStorage` key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
	pub name: String,
	pub value: String,
}

/// `localStorage` contents for one origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
	pub origin: String,
	#[serde(default)]
	pub local_storage: Vec<NameValue>,
}

/// Cookies plus per-origin `localStorage`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
	#[serde(default)]
	pub cookies: Vec<Cookie>,
	#[serde(default)]
	pub origins: Vec<OriginState>,
}

impl StorageState {
	pub fn is_empty(&self) -> bool {
		self.cookies.is_empty() && self.origins.iter().all(|o| o.local_storage.is_empty())
	}

	/// Returns the stored `localStorage` entries for `origin`, if any.
	pub fn origin(&self, origin: &str) -> Option<&OriginState> {
		self.origins.iter().find(|o| o.origin == origin)
	}
}

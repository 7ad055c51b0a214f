//! Runtime configuration: a JSON file plus command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use outreach::{ChromiumOptions, DelayRange, SurfaceConfig};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};
use crate::intake::{DEFAULT_TEMPLATE, RetryPolicy};

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Everything the intake server and operator commands need.
///
/// Every field has a default except `session_file`: the session location is
/// always chosen explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
	pub session_file: Option<PathBuf>,
	pub leads_file: PathBuf,
	pub ledger_file: PathBuf,
	pub bind: String,
	/// Supports `{job_title}`, `{location}`, `{linkedin_url}` and `{phone_number}`.
	pub message_template: String,
	pub surface: SurfaceSettings,
	pub browser: BrowserSettings,
	pub retry: RetryPolicy,
}

impl Default for RelayConfig {
	fn default() -> Self {
		Self {
			session_file: None,
			leads_file: PathBuf::from("leads.csv"),
			ledger_file: PathBuf::from("leads.db"),
			bind: DEFAULT_BIND.to_string(),
			message_template: DEFAULT_TEMPLATE.to_string(),
			surface: SurfaceSettings::default(),
			browser: BrowserSettings::default(),
			retry: RetryPolicy::default(),
		}
	}
}

/// Values taken from global flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
	pub session: Option<PathBuf>,
	pub leads: Option<PathBuf>,
	pub ledger: Option<PathBuf>,
	pub headless: bool,
}

impl RelayConfig {
	/// Reads `path`, or returns defaults when no file was given.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let Some(path) = path else {
			return Ok(Self::default());
		};
		let raw = std::fs::read_to_string(path).map_err(|e| CliError::Config(format!("Failed to read {}: {e}", path.display())))?;
		serde_json::from_str(&raw).map_err(|e| CliError::Config(format!("Invalid config {}: {e}", path.display())))
	}

	pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
		if let Some(session) = overrides.session {
			self.session_file = Some(session);
		}
		if let Some(leads) = overrides.leads {
			self.leads_file = leads;
		}
		if let Some(ledger) = overrides.ledger {
			self.ledger_file = ledger;
		}
		if overrides.headless {
			self.browser.headless = true;
		}
		self
	}

	pub fn session_path(&self) -> Result<&Path> {
		self.session_file
			.as_deref()
			.ok_or_else(|| CliError::Config("No session file configured; pass --session or set session_file".into()))
	}
}

/// Selectors, URLs and timeouts for WhatsApp Web.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceSettings {
	pub base_url: String,
	pub auth_marker: String,
	pub conversation_marker: String,
	pub auth_probe_timeout_ms: u64,
	pub conversation_timeout_ms: u64,
	pub navigation_timeout_ms: u64,
	pub send_delay_min_ms: u64,
	pub send_delay_max_ms: u64,
}

impl Default for SurfaceSettings {
	fn default() -> Self {
		let surface = SurfaceConfig::default();
		Self {
			base_url: surface.base_url,
			auth_marker: surface.auth_marker,
			conversation_marker: surface.conversation_marker,
			auth_probe_timeout_ms: surface.auth_probe_timeout.as_millis() as u64,
			conversation_timeout_ms: surface.conversation_timeout.as_millis() as u64,
			navigation_timeout_ms: surface.navigation_timeout.as_millis() as u64,
			send_delay_min_ms: surface.send_delay.min.as_millis() as u64,
			send_delay_max_ms: surface.send_delay.max.as_millis() as u64,
		}
	}
}

impl SurfaceSettings {
	pub fn to_surface_config(&self) -> SurfaceConfig {
		SurfaceConfig {
			base_url: self.base_url.clone(),
			auth_marker: self.auth_marker.clone(),
			conversation_marker: self.conversation_marker.clone(),
			auth_probe_timeout: Duration::from_millis(self.auth_probe_timeout_ms),
			conversation_timeout: Duration::from_millis(self.conversation_timeout_ms),
			navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
			send_delay: DelayRange::new(Duration::from_millis(self.send_delay_min_ms), Duration::from_millis(self.send_delay_max_ms)),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowserSettings {
	pub headless: bool,
	pub executable: Option<PathBuf>,
	/// Persistent Chrome profile directory; a fresh temporary profile per browser when unset.
	pub profile_dir: Option<PathBuf>,
	pub args: Vec<String>,
}

impl BrowserSettings {
	pub fn to_options(&self) -> ChromiumOptions {
		ChromiumOptions {
			headless: self.headless,
			executable: self.executable.clone(),
			profile_dir: self.profile_dir.clone(),
			args: self.args.clone(),
		}
	}
}

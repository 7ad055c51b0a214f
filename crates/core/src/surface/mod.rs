//! Messaging-surface driver seam.
//!
//! The send protocol only needs a handful of UI operations: open a context
//! (optionally seeded with a saved session), open pages, navigate and wait for
//! network idle, wait for a selector, press Enter, and export the session.
//! [`ChromiumDriver`] implements them over Chrome DevTools; [`FakeDriver`]
//! implements them in memory for tests.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::error::Result;
use crate::session::SessionState;

pub mod chromium;
pub mod deep_link;
pub mod fake;

pub use chromium::{ChromiumDriver, ChromiumOptions};
pub use deep_link::{DeepLink, normalize_recipient};
pub use fake::{FakeDriver, FakeLog, FakeScript};

/// WhatsApp Web root URL.
pub const DEFAULT_BASE_URL: &str = "https://web.whatsapp.com";
/// Present only once the surface is logged in.
pub const DEFAULT_AUTH_MARKER: &str = r#"div[title="Search input textbox"]"#;
/// Present once a deep-linked conversation has resolved.
pub const DEFAULT_CONVERSATION_MARKER: &str = r#"div[data-testid="conversation-panel-messages"]"#;

/// Opens browser contexts against the messaging surface.
#[async_trait]
pub trait SurfaceDriver: Send + Sync {
	/// Opens a fresh context, seeded with `state` when present.
	async fn open_context(&self, state: Option<&SessionState>) -> Result<Box<dyn SurfaceContext>>;
}

/// One isolated browser context. Owned by a single send attempt.
#[async_trait]
pub trait SurfaceContext: Send {
	async fn new_page(&mut self) -> Result<Box<dyn SurfacePage>>;

	/// Exports the context's current authentication state.
	async fn session_state(&mut self) -> Result<SessionState>;

	/// Releases the context and every page it owns.
	async fn close(&mut self) -> Result<()>;
}

/// One page inside a [`SurfaceContext`].
#[async_trait]
pub trait SurfacePage: Send {
	/// Navigates to `url` and waits for network idle, bounded by `timeout`.
	async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

	/// Waits for `selector` to be present. `None` waits without bound.
	async fn wait_for_selector(&mut self, selector: &str, timeout: Option<Duration>) -> Result<()>;

	/// Issues an Enter keystroke into the focused element.
	async fn press_enter(&mut self) -> Result<()>;

	async fn close(self: Box<Self>) -> Result<()>;
}

/// Inclusive range for the post-send pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
	pub min: Duration,
	pub max: Duration,
}

impl DelayRange {
	pub fn new(min: Duration, max: Duration) -> Self {
		if min <= max { Self { min, max } } else { Self { min: max, max: min } }
	}

	pub fn fixed(delay: Duration) -> Self {
		Self { min: delay, max: delay }
	}

	/// Draws a uniformly distributed delay from the range.
	pub fn sample(&self) -> Duration {
		let min = self.min.as_millis() as u64;
		let max = self.max.as_millis() as u64;
		if min == max {
			return self.min;
		}
		Duration::from_millis(rand::rng().random_range(min..=max))
	}
}

impl Default for DelayRange {
	fn default() -> Self {
		Self {
			min: Duration::from_millis(1500),
			max: Duration::from_millis(2500),
		}
	}
}

/// Selectors, URLs and timeouts describing the messaging surface.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
	pub base_url: String,
	pub auth_marker: String,
	pub conversation_marker: String,
	/// Bound on the "already logged in?" probe.
	pub auth_probe_timeout: Duration,
	/// Bound on the conversation panel appearing after the deep link.
	pub conversation_timeout: Duration,
	pub navigation_timeout: Duration,
	/// Rate-shaping pause after the send is committed.
	pub send_delay: DelayRange,
}

impl Default for SurfaceConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			auth_marker: DEFAULT_AUTH_MARKER.to_string(),
			conversation_marker: DEFAULT_CONVERSATION_MARKER.to_string(),
			auth_probe_timeout: Duration::from_secs(8),
			conversation_timeout: Duration::from_secs(20),
			navigation_timeout: Duration::from_secs(30),
			send_delay: DelayRange::default(),
		}
	}
}

impl SurfaceConfig {
	/// Origin of the surface, used to scope captured `localStorage`.
	pub fn origin(&self) -> String {
		url::Url::parse(&self.base_url)
			.map(|u| u.origin().ascii_serialization())
			.unwrap_or_else(|_| self.base_url.trim_end_matches('/').to_string())
	}
}

//! In-memory surface driver for exercising the send protocol without a browser.
//!
//! Pages classify waits by the URL they last navigated to: waits on a deep-link
//! page (`/send?`) are conversation waits, everything else is an auth probe.
//! An unbounded wait is the pairing wait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::{SurfaceContext, SurfaceDriver, SurfacePage};
use crate::error::{Error, Result};
use crate::session::SessionState;

/// Scripted behaviour of a [`FakeDriver`].
#[derive(Debug, Clone)]
pub struct FakeScript {
	/// Contexts seeded with a saved session pass the auth probe.
	pub authenticated_with_state: bool,
	/// Contexts opened without a session pass the auth probe.
	pub authenticated_without_state: bool,
	/// Pairing completes immediately instead of waiting for [`FakeDriver::approve_pairing`].
	pub auto_approve: bool,
	pub launch_error: Option<String>,
	/// Error returned when navigating to a deep link.
	pub navigation_error: Option<String>,
	pub conversation_resolves: bool,
	pub commit_error: Option<String>,
	pub state_error: Option<String>,
	/// Set once the browser went away: every wait fails with a browser error.
	pub browser_lost: Option<String>,
	/// Blob returned by `session_state` once a context is authenticated.
	pub issued_state: Vec<u8>,
}

impl Default for FakeScript {
	fn default() -> Self {
		Self {
			authenticated_with_state: true,
			authenticated_without_state: false,
			auto_approve: true,
			launch_error: None,
			navigation_error: None,
			conversation_resolves: true,
			commit_error: None,
			state_error: None,
			browser_lost: None,
			issued_state: b"fake-session".to_vec(),
		}
	}
}

/// Everything a [`FakeDriver`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct FakeLog {
	pub contexts_opened: usize,
	pub contexts_closed: usize,
	/// Session blob each context was opened with, in order.
	pub seeded_states: Vec<Option<Vec<u8>>>,
	pub visited: Vec<String>,
	/// Selectors waited on, in order.
	pub waits: Vec<String>,
	pub enters: usize,
	pub pages_closed: usize,
}

impl FakeLog {
	/// Contexts opened and not yet closed.
	pub fn open_contexts(&self) -> usize {
		self.contexts_opened - self.contexts_closed
	}

	/// Deep-link navigations issued.
	pub fn deep_links(&self) -> usize {
		self.visited.iter().filter(|url| is_deep_link(url)).count()
	}
}

struct Shared {
	script: Mutex<FakeScript>,
	log: Mutex<FakeLog>,
	approval: Notify,
}

/// Scriptable, counting [`SurfaceDriver`]. Clones share state.
#[derive(Clone)]
pub struct FakeDriver {
	shared: Arc<Shared>,
}

impl Default for FakeDriver {
	fn default() -> Self {
		Self::new(FakeScript::default())
	}
}

impl FakeDriver {
	pub fn new(script: FakeScript) -> Self {
		Self {
			shared: Arc::new(Shared {
				script: Mutex::new(script),
				log: Mutex::new(FakeLog::default()),
				approval: Notify::new(),
			}),
		}
	}

	/// Snapshot of the interaction log.
	pub fn log(&self) -> FakeLog {
		self.shared.log.lock().clone()
	}

	pub fn set_script(&self, script: FakeScript) {
		*self.shared.script.lock() = script;
	}

	pub fn update_script(&self, f: impl FnOnce(&mut FakeScript)) {
		f(&mut *self.shared.script.lock());
	}

	/// Completes a pending (or the next) pairing wait.
	pub fn approve_pairing(&self) {
		self.shared.approval.notify_one();
	}

	/// Simulates the browser exiting, waking a pending pairing wait.
	pub fn lose_browser(&self, message: impl Into<String>) {
		self.shared.script.lock().browser_lost = Some(message.into());
		self.shared.approval.notify_one();
	}

	fn script(&self) -> FakeScript {
		self.shared.script.lock().clone()
	}
}

#[async_trait]
impl SurfaceDriver for FakeDriver {
	async fn open_context(&self, state: Option<&SessionState>) -> Result<Box<dyn SurfaceContext>> {
		let script = self.script();
		if let Some(message) = script.launch_error {
			return Err(Error::BrowserLaunch(message));
		}

		{
			let mut log = self.shared.log.lock();
			log.contexts_opened += 1;
			log.seeded_states.push(state.map(|s| s.as_bytes().to_vec()));
		}

		let authenticated = if state.is_some() {
			script.authenticated_with_state
		} else {
			script.authenticated_without_state
		};
		Ok(Box::new(FakeContext {
			driver: self.clone(),
			authenticated: Arc::new(Mutex::new(authenticated)),
			closed: false,
		}))
	}
}

struct FakeContext {
	driver: FakeDriver,
	authenticated: Arc<Mutex<bool>>,
	closed: bool,
}

#[async_trait]
impl SurfaceContext for FakeContext {
	async fn new_page(&mut self) -> Result<Box<dyn SurfacePage>> {
		Ok(Box::new(FakePage {
			driver: self.driver.clone(),
			authenticated: Arc::clone(&self.authenticated),
			url: String::from("about:blank"),
		}))
	}

	async fn session_state(&mut self) -> Result<SessionState> {
		let script = self.driver.script();
		if let Some(message) = script.state_error {
			return Err(Error::Session(message));
		}
		if !*self.authenticated.lock() {
			return Err(Error::Session("context is not authenticated".into()));
		}
		Ok(SessionState::from_bytes(script.issued_state))
	}

	async fn close(&mut self) -> Result<()> {
		if !self.closed {
			self.closed = true;
			self.driver.shared.log.lock().contexts_closed += 1;
		}
		Ok(())
	}
}

struct FakePage {
	driver: FakeDriver,
	authenticated: Arc<Mutex<bool>>,
	url: String,
}

impl FakePage {
	fn timeout(selector: &str, timeout: Duration) -> Error {
		Error::Timeout {
			ms: timeout.as_millis() as u64,
			condition: selector.to_string(),
		}
	}
}

#[async_trait]
impl SurfacePage for FakePage {
	async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<()> {
		self.driver.shared.log.lock().visited.push(url.to_string());
		if is_deep_link(url) {
			if let Some(message) = self.driver.script().navigation_error {
				return Err(Error::Navigation {
					url: url.to_string(),
					message,
				});
			}
		}
		self.url = url.to_string();
		Ok(())
	}

	async fn wait_for_selector(&mut self, selector: &str, timeout: Option<Duration>) -> Result<()> {
		self.driver.shared.log.lock().waits.push(selector.to_string());
		let authenticated = *self.authenticated.lock();
		if let Some(message) = self.driver.script().browser_lost {
			return Err(Error::Browser(message));
		}

		let Some(timeout) = timeout else {
			if !authenticated && !self.driver.script().auto_approve {
				self.driver.shared.approval.notified().await;
			}
			if let Some(message) = self.driver.script().browser_lost {
				return Err(Error::Browser(message));
			}
			*self.authenticated.lock() = true;
			return Ok(());
		};

		if is_deep_link(&self.url) {
			if authenticated && self.driver.script().conversation_resolves {
				return Ok(());
			}
			return Err(Self::timeout(selector, timeout));
		}

		if authenticated { Ok(()) } else { Err(Self::timeout(selector, timeout)) }
	}

	async fn press_enter(&mut self) -> Result<()> {
		self.driver.shared.log.lock().enters += 1;
		match self.driver.script().commit_error {
			Some(message) => Err(Error::Commit(message)),
			None => Ok(()),
		}
	}

	async fn close(self: Box<Self>) -> Result<()> {
		self.driver.shared.log.lock().pages_closed += 1;
		Ok(())
	}
}

fn is_deep_link(url: &str) -> bool {
	url.contains("/send?")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn unseeded_context_fails_probe_until_paired() {
		let driver = FakeDriver::default();
		let mut context = driver.open_context(None).await.unwrap();
		let mut page = context.new_page().await.unwrap();
		page.goto("https://web.whatsapp.com", Duration::from_secs(1)).await.unwrap();

		let err = page.wait_for_selector("#auth", Some(Duration::from_millis(5))).await.unwrap_err();
		assert!(err.is_timeout());
		assert!(context.session_state().await.is_err());

		page.wait_for_selector("#auth", None).await.unwrap();
		assert_eq!(context.session_state().await.unwrap().as_bytes(), b"fake-session");
	}

	#[tokio::test]
	async fn lost_browser_ends_the_pairing_wait() {
		let driver = FakeDriver::new(FakeScript {
			auto_approve: false,
			..Default::default()
		});
		let mut context = driver.open_context(None).await.unwrap();
		let mut page = context.new_page().await.unwrap();

		driver.lose_browser("connection closed");
		let err = page.wait_for_selector("#auth", None).await.unwrap_err();
		assert!(matches!(err, Error::Browser(ref m) if m == "connection closed"));
		assert!(context.session_state().await.is_err());
	}

	#[tokio::test]
	async fn close_is_counted_once() {
		let driver = FakeDriver::default();
		let mut context = driver.open_context(None).await.unwrap();
		context.close().await.unwrap();
		context.close().await.unwrap();
		let log = driver.log();
		assert_eq!((log.contexts_opened, log.contexts_closed), (1, 1));
	}

	#[tokio::test]
	async fn launch_error_opens_nothing() {
		let driver = FakeDriver::new(FakeScript {
			launch_error: Some("no chrome".into()),
			..Default::default()
		});
		assert!(matches!(driver.open_context(None).await, Err(Error::BrowserLaunch(_))));
		assert_eq!(driver.log().contexts_opened, 0);
	}
}

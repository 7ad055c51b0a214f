//! Chrome DevTools implementation of the surface driver.
//!
//! Every context is its own browser process. Saved sessions are restored by
//! injecting cookies at launch and replaying the surface origin's
//! `localStorage` into each new document; they are exported the same way.
//! Without a configured profile directory each context launches with a fresh
//! temporary profile that is removed on close.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::network::{Cookie as CdpCookie, CookieParam, CookieSameSite, TimeSinceEpoch};
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, NavigateParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use outreach_protocol::{Cookie, NameValue, OriginState, StorageState};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::{SurfaceConfig, SurfaceContext, SurfaceDriver, SurfacePage};
use crate::error::{Error, Result};
use crate::session::SessionState;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Marks a document whose `localStorage` was already seeded from the saved session.
const SEEDED_KEY: &str = "__outreach_seeded";

/// Browser launch options.
#[derive(Debug, Clone, Default)]
pub struct ChromiumOptions {
	/// Pairing needs a visible window, so this defaults to `false`.
	pub headless: bool,
	pub executable: Option<PathBuf>,
	/// Persistent Chrome profile directory. When unset every context gets its
	/// own temporary profile, deleted when the context closes.
	pub profile_dir: Option<PathBuf>,
	pub args: Vec<String>,
}

impl ChromiumOptions {
	/// Profile used by one context: the configured directory, or a new temporary one.
	fn profile(&self) -> Result<Profile> {
		match &self.profile_dir {
			Some(dir) => Ok(Profile::Persistent(dir.clone())),
			None => tempfile::Builder::new()
				.prefix("outreach-profile-")
				.tempdir()
				.map(Profile::Temporary)
				.map_err(|e| Error::BrowserLaunch(format!("Failed to create a browser profile directory: {e}"))),
		}
	}

	fn browser_config(&self, profile: &Profile) -> Result<BrowserConfig> {
		let mut builder = BrowserConfig::builder();
		if !self.headless {
			builder = builder.with_head();
		}
		if let Some(path) = &self.executable {
			builder = builder.chrome_executable(path);
		}
		builder = builder.user_data_dir(profile.path());
		builder.args(self.args.iter().cloned()).build().map_err(Error::BrowserLaunch)
	}
}

enum Profile {
	Persistent(PathBuf),
	Temporary(TempDir),
}

impl Profile {
	fn path(&self) -> &Path {
		match self {
			Profile::Persistent(dir) => dir,
			Profile::Temporary(dir) => dir.path(),
		}
	}
}

/// Launches Chromium through `chromiumoxide`.
#[derive(Debug, Clone)]
pub struct ChromiumDriver {
	options: ChromiumOptions,
	origin: String,
}

impl ChromiumDriver {
	pub fn new(options: ChromiumOptions, surface: &SurfaceConfig) -> Self {
		Self {
			options,
			origin: surface.origin(),
		}
	}
}

#[async_trait]
impl SurfaceDriver for ChromiumDriver {
	async fn open_context(&self, state: Option<&SessionState>) -> Result<Box<dyn SurfaceContext>> {
		let storage = state.map(decode_storage_state).transpose()?;
		let profile = self.options.profile()?;
		let config = self.options.browser_config(&profile)?;

		debug!(
			target = "outreach.browser",
			headless = self.options.headless,
			restored = storage.is_some(),
			profile = %profile.path().display(),
			"launching chromium"
		);
		let (browser, mut handler) = Browser::launch(config).await.map_err(|e| Error::BrowserLaunch(e.to_string()))?;
		let handler_task = tokio::spawn(async move {
			while let Some(event) = handler.next().await {
				if let Err(err) = event {
					trace!(target = "outreach.browser", error = %err, "devtools handler error");
				}
			}
		});

		let mut context = ChromiumContext {
			browser,
			handler_task,
			profile: Some(profile),
			origin: self.origin.clone(),
			seeded_local_storage: Vec::new(),
			closed: false,
		};

		if let Some(storage) = storage {
			if let Err(err) = context.restore(storage).await {
				let _ = context.close().await;
				return Err(err);
			}
		}

		Ok(Box::new(context))
	}
}

struct ChromiumContext {
	browser: Browser,
	handler_task: JoinHandle<()>,
	profile: Option<Profile>,
	origin: String,
	seeded_local_storage: Vec<NameValue>,
	closed: bool,
}

impl ChromiumContext {
	async fn restore(&mut self, storage: StorageState) -> Result<()> {
		let cookies: Vec<CookieParam> = storage.cookies.iter().map(cookie_to_param).collect();
		if !cookies.is_empty() {
			self.browser
				.set_cookies(cookies)
				.await
				.map_err(|e| Error::Session(format!("Failed to restore cookies: {e}")))?;
		}
		if let Some(origin) = storage.origin(&self.origin) {
			self.seeded_local_storage = origin.local_storage.clone();
		}
		debug!(
			target = "outreach.browser",
			cookies = storage.cookies.len(),
			local_storage = self.seeded_local_storage.len(),
			"restored session state"
		);
		Ok(())
	}

	async fn capture_local_storage(&self) -> Result<Option<Vec<NameValue>>> {
		let script = format!("Object.entries(window.localStorage).filter(([k]) => k !== {})", serde_json::to_string(SEEDED_KEY)?);
		for page in self.browser.pages().await? {
			let Ok(Some(url)) = page.url().await else {
				continue;
			};
			if !url.starts_with(&self.origin) {
				continue;
			}
			let entries: Vec<(String, String)> = page.evaluate(script.as_str()).await?.into_value()?;
			return Ok(Some(entries.into_iter().map(|(name, value)| NameValue { name, value }).collect()));
		}
		Ok(None)
	}
}

#[async_trait]
impl SurfaceContext for ChromiumContext {
	async fn new_page(&mut self) -> Result<Box<dyn SurfacePage>> {
		let page = self.browser.new_page("about:blank").await?;
		if let Some(script) = seed_script(&self.origin, &self.seeded_local_storage)? {
			page.evaluate_on_new_document(script).await?;
		}
		Ok(Box::new(ChromiumPage { page }))
	}

	async fn session_state(&mut self) -> Result<SessionState> {
		let cookies: Vec<Cookie> = self.browser.get_cookies().await?.into_iter().map(cookie_from_cdp).collect();
		let local_storage = match self.capture_local_storage().await? {
			Some(entries) => entries,
			None => self.seeded_local_storage.clone(),
		};

		let mut state = StorageState {
			cookies,
			origins: Vec::new(),
		};
		if !local_storage.is_empty() {
			state.origins.push(OriginState {
				origin: self.origin.clone(),
				local_storage,
			});
		}

		Ok(SessionState::from_bytes(serde_json::to_vec_pretty(&state)?))
	}

	async fn close(&mut self) -> Result<()> {
		if self.closed {
			return Ok(());
		}
		self.closed = true;

		let closed = self.browser.close().await.map(|_| ());
		if let Err(err) = self.browser.wait().await {
			debug!(target = "outreach.browser", error = %err, "waiting for browser exit failed");
		}
		self.handler_task.abort();
		if let Some(Profile::Temporary(dir)) = self.profile.take() {
			let path = dir.path().to_path_buf();
			if let Err(err) = dir.close() {
				debug!(target = "outreach.browser", profile = %path.display(), error = %err, "failed to remove temporary profile");
			}
		}
		closed.map_err(Error::from)
	}
}

struct ChromiumPage {
	page: Page,
}

#[async_trait]
impl SurfacePage for ChromiumPage {
	async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
		let navigation = async {
			let mut lifecycle = self.page.event_listener::<EventLifecycleEvent>().await?;
			let response = self.page.execute(NavigateParams::new(url)).await?;
			if let Some(err) = response.result.error_text.clone() {
				return Err(Error::Navigation {
					url: url.to_string(),
					message: err,
				});
			}

			let loader = response.result.loader_id.clone();
			while let Some(event) = lifecycle.next().await {
				if event.name == "networkIdle" && loader.as_ref().is_none_or(|id| *id == event.loader_id) {
					break;
				}
			}
			Ok::<(), Error>(())
		};

		match tokio::time::timeout(timeout, navigation).await {
			Ok(Ok(())) => Ok(()),
			Ok(Err(Error::Browser(message))) => Err(Error::Navigation {
				url: url.to_string(),
				message,
			}),
			Ok(Err(err)) => Err(err),
			Err(_) => Err(Error::Timeout {
				ms: timeout.as_millis() as u64,
				condition: format!("network idle at {url}"),
			}),
		}
	}

	async fn wait_for_selector(&mut self, selector: &str, timeout: Option<Duration>) -> Result<()> {
		let script = presence_script(selector)?;
		let deadline = timeout.map(|t| Instant::now() + t);
		loop {
			match self.page.evaluate(script.as_str()).await {
				Ok(result) => {
					if result.into_value::<bool>()? {
						return Ok(());
					}
				}
				Err(err) if is_navigation_race(&err) => {
					trace!(target = "outreach.browser", selector, error = %err, "document replaced while polling");
				}
				Err(err) => return Err(Error::Browser(format!("Lost the page while waiting for {selector}: {err}"))),
			}
			if let (Some(deadline), Some(timeout)) = (deadline, timeout) {
				if Instant::now() >= deadline {
					return Err(Error::Timeout {
						ms: timeout.as_millis() as u64,
						condition: selector.to_string(),
					});
				}
			}
			tokio::time::sleep(POLL_INTERVAL).await;
		}
	}

	async fn press_enter(&mut self) -> Result<()> {
		for event in enter_key_events()? {
			self.page.execute(event).await.map_err(|e| Error::Commit(e.to_string()))?;
		}
		Ok(())
	}

	async fn close(self: Box<Self>) -> Result<()> {
		if let Err(err) = self.page.close().await {
			warn!(target = "outreach.browser", error = %err, "failed to close page");
			return Err(err.into());
		}
		Ok(())
	}
}

/// Expression that is `true` once `selector` matches a node in the current document.
fn presence_script(selector: &str) -> Result<String> {
	Ok(format!("document.querySelector({}) !== null", serde_json::to_string(selector)?))
}

/// Evaluation failed because the page navigated between polls.
fn is_navigation_race(err: &CdpError) -> bool {
	match err {
		CdpError::Chrome(err) => {
			let message = err.message.to_ascii_lowercase();
			message.contains("execution context was destroyed") || message.contains("cannot find context")
		}
		_ => false,
	}
}

/// Key down and key up for Enter, dispatched to whatever the page has focused.
fn enter_key_events() -> Result<[DispatchKeyEventParams; 2]> {
	let enter = DispatchKeyEventParams::builder()
		.key("Enter")
		.code("Enter")
		.windows_virtual_key_code(13)
		.native_virtual_key_code(13);
	let down = enter.clone().r#type(DispatchKeyEventType::KeyDown).text("\r").build().map_err(Error::Commit)?;
	let up = enter.r#type(DispatchKeyEventType::KeyUp).build().map_err(Error::Commit)?;
	Ok([down, up])
}

fn decode_storage_state(state: &SessionState) -> Result<StorageState> {
	serde_json::from_slice(state.as_bytes()).map_err(|e| Error::Session(format!("Saved session is not a browser storage state: {e}")))
}

/// Script replaying `entries` into the surface origin's `localStorage` once per browser profile.
fn seed_script(origin: &str, entries: &[NameValue]) -> Result<Option<String>> {
	if entries.is_empty() {
		return Ok(None);
	}
	let pairs: Vec<(&str, &str)> = entries.iter().map(|e| (e.name.as_str(), e.value.as_str())).collect();
	Ok(Some(format!(
		"(() => {{\n\
		   if (window.location.origin !== {origin}) return;\n\
		   try {{\n\
		     if (window.localStorage.getItem({key})) return;\n\
		     for (const [k, v] of {pairs}) window.localStorage.setItem(k, v);\n\
		     window.localStorage.setItem({key}, '1');\n\
		   }} catch (e) {{}}\n\
		 }})();",
		origin = serde_json::to_string(origin)?,
		key = serde_json::to_string(SEEDED_KEY)?,
		pairs = serde_json::to_string(&pairs)?,
	)))
}

fn cookie_from_cdp(cookie: CdpCookie) -> Cookie {
	Cookie {
		expires: Some(if cookie.session { -1.0 } else { cookie.expires }),
		same_site: cookie.same_site.map(|s| s.as_ref().to_string()),
		domain: Some(cookie.domain),
		path: Some(cookie.path),
		http_only: Some(cookie.http_only),
		secure: Some(cookie.secure),
		name: cookie.name,
		value: cookie.value,
	}
}

fn cookie_to_param(cookie: &Cookie) -> CookieParam {
	let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
	param.domain = cookie.domain.clone();
	param.path = cookie.path.clone();
	param.secure = cookie.secure;
	param.http_only = cookie.http_only;
	param.same_site = cookie.same_site.as_deref().and_then(|s| s.parse::<CookieSameSite>().ok());
	param.expires = cookie.expires.filter(|e| *e >= 0.0).map(TimeSinceEpoch::new);
	param
}

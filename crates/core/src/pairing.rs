//! First-run interactive authentication.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::phase::{PhaseTracker, SendPhase};
use crate::session::SessionStore;
use crate::surface::{SurfaceConfig, SurfaceContext, SurfacePage};

/// How [`PairingFlow::run`] left the context authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStatus {
	/// The restored session was still valid.
	AlreadyAuthenticated,
	/// An operator approved the link and the new session was saved.
	Paired,
}

impl PairingStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			PairingStatus::AlreadyAuthenticated => "already_authenticated",
			PairingStatus::Paired => "paired",
		}
	}
}

/// Ensures a context is authenticated, pairing interactively when it is not.
pub struct PairingFlow<'a> {
	config: &'a SurfaceConfig,
	store: &'a SessionStore,
	phases: &'a PhaseTracker,
}

impl<'a> PairingFlow<'a> {
	pub fn new(config: &'a SurfaceConfig, store: &'a SessionStore, phases: &'a PhaseTracker) -> Self {
		Self { config, store, phases }
	}

	/// Probes for the logged-in marker and, if it never shows, waits without a
	/// bound for an operator to approve the pairing.
	///
	/// Only a probe timeout leads to pairing. Any other probe error is returned.
	pub async fn run(&self, context: &mut dyn SurfaceContext) -> Result<PairingStatus> {
		let mut page = context.new_page().await?;
		let result = self.authenticate(context, page.as_mut()).await;
		if let Err(err) = page.close().await {
			debug!(target = "outreach.pairing", error = %err, "failed to close probe page");
		}
		result
	}

	async fn authenticate(&self, context: &mut dyn SurfaceContext, page: &mut dyn SurfacePage) -> Result<PairingStatus> {
		page.goto(&self.config.base_url, self.config.navigation_timeout).await?;

		match page.wait_for_selector(&self.config.auth_marker, Some(self.config.auth_probe_timeout)).await {
			Ok(()) => {
				debug!(target = "outreach.pairing", "saved session accepted");
				self.phases.advance(SendPhase::FastAuthenticated);
				return Ok(PairingStatus::AlreadyAuthenticated);
			}
			Err(err) if err.is_timeout() => {}
			Err(err) => return Err(err),
		}

		self.phases.advance(SendPhase::PairingPending);
		warn!(
			target = "outreach.pairing",
			url = %self.config.base_url,
			"awaiting external approval: open WhatsApp on the phone, go to Linked devices and scan the QR code shown in the browser"
		);

		page.wait_for_selector(&self.config.auth_marker, None).await?;
		let state = context.session_state().await?;
		self.store.save(&state)?;
		self.phases.advance(SendPhase::Authenticated);

		info!(target = "outreach.pairing", path = %self.store.path().display(), "pairing approved, session saved");
		Ok(PairingStatus::Paired)
	}
}

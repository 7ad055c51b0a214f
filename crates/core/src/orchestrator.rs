//! Composition root for sends and pairing.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::info;

use crate::error::Result;
use crate::handle::ConversationHandle;
use crate::outcome::SendOutcome;
use crate::pairing::{PairingFlow, PairingStatus};
use crate::phase::{PhaseTracker, SendPhase};
use crate::sender::MessageSender;
use crate::session::SessionStore;
use crate::surface::{SurfaceConfig, SurfaceDriver};

/// Entry point for everything that talks to the messaging surface.
///
/// Sends and pairings on one orchestrator run one at a time, so the session
/// file is only ever read and rewritten by a single attempt.
pub struct SendOrchestrator {
	driver: Arc<dyn SurfaceDriver>,
	store: SessionStore,
	config: SurfaceConfig,
	phases: PhaseTracker,
	guard: Mutex<()>,
}

impl SendOrchestrator {
	pub fn new(driver: Arc<dyn SurfaceDriver>, store: SessionStore, config: SurfaceConfig) -> Self {
		Self {
			driver,
			store,
			config,
			phases: PhaseTracker::new(),
			guard: Mutex::new(()),
		}
	}

	/// Sends `message` to `recipient`, returning whether it was delivered.
	pub async fn attempt_send(&self, recipient: &str, message: &str) -> bool {
		self.send(recipient, message).await.is_delivered()
	}

	/// Sends `message` to `recipient` with full diagnostics.
	pub async fn send(&self, recipient: &str, message: &str) -> SendOutcome {
		let _guard = self.guard.lock().await;
		MessageSender::new(self.driver.as_ref(), &self.store, &self.config, &self.phases)
			.send(recipient, message)
			.await
	}

	/// Runs only the pairing flow, for first-time setup.
	pub async fn pair(&self) -> Result<PairingStatus> {
		let _guard = self.guard.lock().await;
		self.phases.advance(SendPhase::Start);

		let result = self.pair_locked().await;
		self.phases.advance(SendPhase::Closed { success: result.is_ok() });
		if let Ok(status) = &result {
			info!(target = "outreach.pairing", status = status.as_str(), "pairing finished");
		}
		result
	}

	async fn pair_locked(&self) -> Result<PairingStatus> {
		let state = self.store.load()?;
		self.phases.advance(SendPhase::SessionLoaded);

		let mut handle = ConversationHandle::open(self.driver.as_ref(), state.as_ref()).await?;
		let result = PairingFlow::new(&self.config, &self.store, &self.phases).run(handle.context()).await;
		handle.release().await;
		result
	}

	/// Subscribes to phase changes, including the pending-approval state.
	pub fn phases(&self) -> watch::Receiver<SendPhase> {
		self.phases.subscribe()
	}

	pub fn current_phase(&self) -> SendPhase {
		self.phases.current()
	}

	pub fn store(&self) -> &SessionStore {
		&self.store
	}

	pub fn config(&self) -> &SurfaceConfig {
		&self.config
	}
}

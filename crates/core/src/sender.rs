//! Single-message send protocol.

use tracing::{debug, error, info};

use crate::error::Error;
use crate::handle::ConversationHandle;
use crate::outcome::{FailureStage, SendFailure, SendOutcome};
use crate::pairing::PairingFlow;
use crate::phase::{PhaseTracker, SendPhase};
use crate::session::SessionStore;
use crate::surface::{DeepLink, SurfaceConfig, SurfaceContext, SurfaceDriver, SurfacePage};

/// Drives one conversation from a deep link to a committed message.
///
/// Never retries and never returns an error: every failure becomes a
/// [`SendOutcome`] naming the stage it happened at.
pub struct MessageSender<'a> {
	driver: &'a dyn SurfaceDriver,
	store: &'a SessionStore,
	config: &'a SurfaceConfig,
	phases: &'a PhaseTracker,
}

impl<'a> MessageSender<'a> {
	pub fn new(driver: &'a dyn SurfaceDriver, store: &'a SessionStore, config: &'a SurfaceConfig, phases: &'a PhaseTracker) -> Self {
		Self {
			driver,
			store,
			config,
			phases,
		}
	}

	pub async fn send(&self, recipient: &str, message: &str) -> SendOutcome {
		self.phases.advance(SendPhase::Start);

		let outcome = match self.run(recipient, message).await {
			Ok(()) => {
				info!(target = "outreach.send", recipient, "message delivered");
				SendOutcome::delivered(recipient)
			}
			Err(failure) => {
				error!(
					target = "outreach.send",
					recipient,
					message,
					stage = %failure.stage,
					detail = %failure.detail,
					"send failed"
				);
				SendOutcome::failed(recipient, failure)
			}
		};

		self.phases.advance(SendPhase::Closed {
			success: outcome.is_delivered(),
		});
		outcome
	}

	async fn run(&self, recipient: &str, message: &str) -> Result<(), SendFailure> {
		if message.trim().is_empty() {
			return Err(SendFailure::new(FailureStage::InvalidInput, "message is empty"));
		}
		let link = DeepLink::new(&self.config.base_url, recipient, message).map_err(at(FailureStage::InvalidInput))?;

		let state = self.store.load().map_err(at(FailureStage::Session))?;
		self.phases.advance(SendPhase::SessionLoaded);

		let mut handle = ConversationHandle::open(self.driver, state.as_ref())
			.await
			.map_err(at(FailureStage::Launch))?;
		let result = self.deliver(handle.context(), &link).await;
		handle.release().await;
		result
	}

	async fn deliver(&self, context: &mut dyn SurfaceContext, link: &DeepLink) -> Result<(), SendFailure> {
		PairingFlow::new(self.config, self.store, self.phases)
			.run(context)
			.await
			.map_err(at(FailureStage::Pairing))?;

		self.phases.advance(SendPhase::ConversationOpening);
		let mut page = context.new_page().await.map_err(at(FailureStage::Navigation))?;
		let result = self.converse(context, page.as_mut(), link).await;
		if let Err(err) = page.close().await {
			debug!(target = "outreach.send", error = %err, "failed to close conversation page");
		}
		result
	}

	async fn converse(&self, context: &mut dyn SurfaceContext, page: &mut dyn SurfacePage, link: &DeepLink) -> Result<(), SendFailure> {
		page.goto(link.as_str(), self.config.navigation_timeout)
			.await
			.map_err(at(FailureStage::Navigation))?;

		page.wait_for_selector(&self.config.conversation_marker, Some(self.config.conversation_timeout))
			.await
			.map_err(at(FailureStage::ConversationReady))?;
		self.phases.advance(SendPhase::ConversationReady);

		page.press_enter().await.map_err(at(FailureStage::Commit))?;
		self.phases.advance(SendPhase::Sent);

		let pause = self.config.send_delay.sample();
		debug!(target = "outreach.send", pause_ms = pause.as_millis() as u64, "pausing after send");
		tokio::time::sleep(pause).await;

		let state = context.session_state().await.map_err(at(FailureStage::Persist))?;
		self.store.save(&state).map_err(at(FailureStage::Persist))?;
		self.phases.advance(SendPhase::SessionPersisted);
		Ok(())
	}
}

fn at(stage: FailureStage) -> impl FnOnce(Error) -> SendFailure {
	move |err| SendFailure::new(stage, err.to_string())
}

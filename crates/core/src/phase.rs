//! Observable per-attempt state machine.

use std::fmt;

use tokio::sync::watch;
use tracing::{trace, warn};

/// Where a send attempt (or a pairing run) currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
	#[default]
	Idle,
	Start,
	SessionLoaded,
	/// The saved session was accepted without pairing.
	FastAuthenticated,
	/// Waiting for an operator to approve the link on their phone.
	PairingPending,
	Authenticated,
	ConversationOpening,
	ConversationReady,
	/// The Enter keystroke was issued. Nothing after this point may re-send.
	Sent,
	SessionPersisted,
	/// The attempt is over and its conversation handle released.
	Closed { success: bool },
}

impl SendPhase {
	pub fn as_str(&self) -> &'static str {
		match self {
			SendPhase::Idle => "idle",
			SendPhase::Start => "start",
			SendPhase::SessionLoaded => "session_loaded",
			SendPhase::FastAuthenticated => "fast_authenticated",
			SendPhase::PairingPending => "pairing_pending",
			SendPhase::Authenticated => "authenticated",
			SendPhase::ConversationOpening => "conversation_opening",
			SendPhase::ConversationReady => "conversation_ready",
			SendPhase::Sent => "sent",
			SendPhase::SessionPersisted => "session_persisted",
			SendPhase::Closed { success: true } => "closed_success",
			SendPhase::Closed { success: false } => "closed_failure",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, SendPhase::Closed { .. })
	}

	pub fn is_awaiting_approval(&self) -> bool {
		matches!(self, SendPhase::PairingPending)
	}

	/// Legal transitions.
	///
	/// A pairing-only run closes straight from an authenticated phase; every
	/// non-terminal phase may close with failure.
	pub fn can_advance_to(&self, next: SendPhase) -> bool {
		use SendPhase::*;

		match (*self, next) {
			(Idle | Closed { .. }, Start) => true,
			(Idle | Closed { .. }, _) => false,
			(_, Closed { success: false }) => true,
			(Start, SessionLoaded) => true,
			(SessionLoaded, FastAuthenticated | PairingPending) => true,
			(PairingPending, Authenticated) => true,
			(FastAuthenticated | Authenticated, ConversationOpening) => true,
			(FastAuthenticated | Authenticated, Closed { success: true }) => true,
			(ConversationOpening, ConversationReady) => true,
			(ConversationReady, Sent) => true,
			(Sent, SessionPersisted) => true,
			(SessionPersisted, Closed { success: true }) => true,
			_ => false,
		}
	}
}

impl fmt::Display for SendPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Publishes [`SendPhase`] changes on a watch channel.
#[derive(Debug)]
pub struct PhaseTracker {
	tx: watch::Sender<SendPhase>,
}

impl Default for PhaseTracker {
	fn default() -> Self {
		Self::new()
	}
}

impl PhaseTracker {
	pub fn new() -> Self {
		let (tx, _) = watch::channel(SendPhase::Idle);
		Self { tx }
	}

	pub fn subscribe(&self) -> watch::Receiver<SendPhase> {
		self.tx.subscribe()
	}

	pub fn current(&self) -> SendPhase {
		*self.tx.borrow()
	}

	/// Moves to `next`. Illegal transitions are logged and applied anyway.
	pub fn advance(&self, next: SendPhase) {
		let previous = self.tx.send_replace(next);
		if previous.can_advance_to(next) {
			trace!(target = "outreach.send", from = %previous, to = %next, "phase");
		} else {
			warn!(target = "outreach.send", from = %previous, to = %next, "unexpected phase transition");
		}
	}
}

//! Results of a send attempt.

use std::fmt;

/// Step of the send protocol that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
	InvalidInput,
	Session,
	Launch,
	Pairing,
	Navigation,
	ConversationReady,
	Commit,
	/// The message went out but the refreshed session could not be saved.
	Persist,
}

impl FailureStage {
	pub fn as_str(&self) -> &'static str {
		match self {
			FailureStage::InvalidInput => "invalid_input",
			FailureStage::Session => "session",
			FailureStage::Launch => "launch",
			FailureStage::Pairing => "pairing",
			FailureStage::Navigation => "navigation",
			FailureStage::ConversationReady => "conversation_ready",
			FailureStage::Commit => "commit",
			FailureStage::Persist => "persist",
		}
	}

	/// Whether the message was already committed when this stage failed.
	pub fn after_commit(&self) -> bool {
		matches!(self, FailureStage::Persist)
	}
}

impl fmt::Display for FailureStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailure {
	pub stage: FailureStage,
	pub detail: String,
}

impl SendFailure {
	pub fn new(stage: FailureStage, detail: impl Into<String>) -> Self {
		Self {
			stage,
			detail: detail.into(),
		}
	}
}

impl fmt::Display for SendFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.stage, self.detail)
	}
}

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
	pub recipient: String,
	pub failure: Option<SendFailure>,
}

impl SendOutcome {
	pub fn delivered(recipient: impl Into<String>) -> Self {
		Self {
			recipient: recipient.into(),
			failure: None,
		}
	}

	pub fn failed(recipient: impl Into<String>, failure: SendFailure) -> Self {
		Self {
			recipient: recipient.into(),
			failure: Some(failure),
		}
	}

	/// `true` only when every step, including persisting the session, completed.
	pub fn is_delivered(&self) -> bool {
		self.failure.is_none()
	}

	/// `true` once the message was committed, whether or not the session was saved.
	///
	/// Callers recording contacts use this rather than [`is_delivered`](Self::is_delivered)
	/// so a recipient is never messaged twice.
	pub fn committed(&self) -> bool {
		self.failure.as_ref().is_none_or(|f| f.stage.after_commit())
	}

	pub fn stage(&self) -> Option<FailureStage> {
		self.failure.as_ref().map(|f| f.stage)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn persist_failure_is_committed_but_not_delivered() {
		let outcome = SendOutcome::failed("+1", SendFailure::new(FailureStage::Persist, "disk full"));
		assert!(!outcome.is_delivered());
		assert!(outcome.committed());
	}

	#[test]
	fn pre_commit_failures_are_not_committed() {
		for stage in [FailureStage::InvalidInput, FailureStage::ConversationReady, FailureStage::Commit] {
			let outcome = SendOutcome::failed("+1", SendFailure::new(stage, "x"));
			assert!(!outcome.committed(), "{stage}");
			assert_eq!(outcome.stage(), Some(stage));
		}
		assert!(SendOutcome::delivered("+1").committed());
	}
}

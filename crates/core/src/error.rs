//! Error types for the messaging core.

use thiserror::Error;

/// Errors raised by the session store, the surface drivers and the send protocol.
///
/// Inside [`MessageSender`](crate::sender::MessageSender) these never escape:
/// they are mapped to a [`FailureStage`](crate::outcome::FailureStage) and a
/// diagnostic string on the returned outcome.
#[derive(Debug, Error)]
pub enum Error {
	#[error("Failed to launch browser: {0}")]
	BrowserLaunch(String),

	#[error("Navigation to {url} failed: {message}")]
	Navigation { url: String, message: String },

	#[error("Timed out after {ms}ms waiting for {condition}")]
	Timeout { ms: u64, condition: String },

	#[error("Failed to commit message: {0}")]
	Commit(String),

	#[error("Invalid input: {0}")]
	InvalidInput(String),

	#[error("Session state error: {0}")]
	Session(String),

	#[error("Browser error: {0}")]
	Browser(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns `true` for bounded-wait expiry.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}
}

impl From<chromiumoxide::error::CdpError> for Error {
	fn from(err: chromiumoxide::error::CdpError) -> Self {
		Error::Browser(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, Error>;

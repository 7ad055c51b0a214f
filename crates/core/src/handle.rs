//! Exclusive ownership of one browser context for one send attempt.

use tracing::{debug, warn};

use crate::error::Result;
use crate::session::SessionState;
use crate::surface::{SurfaceContext, SurfaceDriver};

/// The open browser context (and its pages) belonging to a single attempt.
///
/// Must be finished with [`release`](Self::release). Dropping an unreleased
/// handle skips the orderly close and logs a warning.
pub struct ConversationHandle {
	context: Box<dyn SurfaceContext>,
	released: bool,
}

impl ConversationHandle {
	/// Opens a context, restoring `state` when present.
	pub async fn open(driver: &dyn SurfaceDriver, state: Option<&SessionState>) -> Result<Self> {
		let context = driver.open_context(state).await?;
		debug!(target = "outreach.send", restored = state.is_some(), "conversation handle opened");
		Ok(Self {
			context,
			released: false,
		})
	}

	pub fn context(&mut self) -> &mut dyn SurfaceContext {
		&mut *self.context
	}

	/// Closes the context. Close errors are logged, never returned.
	pub async fn release(mut self) {
		self.released = true;
		match self.context.close().await {
			Ok(()) => debug!(target = "outreach.send", "conversation handle released"),
			Err(err) => warn!(target = "outreach.send", error = %err, "failed to release conversation handle"),
		}
	}
}

impl Drop for ConversationHandle {
	fn drop(&mut self) {
		if !self.released {
			warn!(target = "outreach.send", "conversation handle dropped without release");
		}
	}
}

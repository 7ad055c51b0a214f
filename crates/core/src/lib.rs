//! Session-managed one-time outbound messaging over WhatsApp Web.
//!
//! [`SendOrchestrator`] is the only entry point: it loads the saved session,
//! pairs interactively when the session is missing or rejected, deep-links to
//! the recipient's conversation, commits the message and saves the refreshed
//! session. The browser sits behind the [`surface`] traits so the protocol can
//! run against [`surface::FakeDriver`] in tests.

pub mod error;
pub mod handle;
pub mod outcome;
pub mod pairing;
pub mod phase;
pub mod sender;
pub mod session;
pub mod surface;

mod orchestrator;

pub use error::{Error, Result};
pub use handle::ConversationHandle;
pub use orchestrator::SendOrchestrator;
pub use outcome::{FailureStage, SendFailure, SendOutcome};
pub use pairing::{PairingFlow, PairingStatus};
pub use phase::{PhaseTracker, SendPhase};
pub use sender::MessageSender;
pub use session::{SessionState, SessionStore};
pub use surface::{ChromiumDriver, ChromiumOptions, DelayRange, SurfaceConfig, SurfaceDriver};

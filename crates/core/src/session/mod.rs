//! Session persistence.
//!
//! The session file holds the authenticated browser state for the messaging
//! surface. It is read once at the start and written once at the end of each
//! send, and only ever deleted by an operator.

/// Opaque persisted session blob.
pub mod state;
/// File-backed session store with atomic replace.
pub mod store;

pub use state::SessionState;
pub use store::SessionStore;

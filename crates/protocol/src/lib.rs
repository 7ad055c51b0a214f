//! Wire types for outreach.
//!
//! This crate contains the serde-serializable shapes exchanged at the edges
//! of the system: the rows of the lead file, the intake request and response
//! bodies, and the browser storage state persisted between runs.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization and small accessors
//! * Stable: Changes only when a file or HTTP format changes
//!
//! Session handling and the send protocol are built on top of these types in `outreach-rs`.

pub mod intake;
pub mod lead;
pub mod storage;

pub use intake::*;
pub use lead::*;
pub use storage::*;

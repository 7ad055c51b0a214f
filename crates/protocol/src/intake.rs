//! Request and response bodies for the intake endpoint.

use serde::{Deserialize, Serialize};

use crate::lead::LeadRecord;

/// Filter accepted by `POST /fetch-leads/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRequest {
	pub job_title: String,
	pub location: String,
}

impl LeadRequest {
	pub fn new(job_title: impl Into<String>, location: impl Into<String>) -> Self {
		Self {
			job_title: job_title.into(),
			location: location.into(),
		}
	}
}

/// Successful intake response listing the leads contacted by this request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentLeadsResponse {
	pub sent_leads: Vec<LeadRecord>,
}

/// Error body returned by the intake endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
	pub detail: String,
}

impl ErrorDetail {
	pub fn new(detail: impl Into<String>) -> Self {
		Self { detail: detail.into() }
	}
}

/// Snapshot returned by `GET /session/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
	/// Current phase of the send state machine (snake_case name).
	pub phase: String,
	/// True while a pairing is blocked on out-of-band approval.
	pub awaiting_approval: bool,
	pub session_file: String,
	pub session_present: bool,
}

//! Lead intake: match, dedup, send, record.

use std::sync::Arc;
use std::time::Duration;

use outreach::{SendOrchestrator, SendOutcome};
use outreach_protocol::{LeadRecord, LeadRequest};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::leads::LeadSource;
use crate::ledger::SqliteLedger;

pub const DEFAULT_TEMPLATE: &str = "Hi, we have an opportunity matching your profile ({job_title} in {location})!";

/// Message body with `{field}` placeholders for lead columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate(String);

impl Default for MessageTemplate {
	fn default() -> Self {
		Self(DEFAULT_TEMPLATE.to_string())
	}
}

impl MessageTemplate {
	pub fn new(template: impl Into<String>) -> Self {
		Self(template.into())
	}

	pub fn render(&self, lead: &LeadRecord) -> String {
		self.0
			.replace("{job_title}", &lead.job_title)
			.replace("{location}", &lead.location)
			.replace("{linkedin_url}", &lead.linkedin_url)
			.replace("{phone_number}", &lead.phone_number)
	}
}

/// Retries for sends that failed before the message was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
	/// Total attempts per lead, including the first. Zero is treated as one.
	pub max_attempts: u32,
	/// Pause before the first retry; doubles for each further retry.
	pub backoff_ms: u64,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 1,
			backoff_ms: 5_000,
		}
	}
}

impl RetryPolicy {
	/// Pause before attempt number `attempt` (1-based, so attempt 2 is the first retry).
	pub fn backoff_before(&self, attempt: u32) -> Duration {
		let doublings = attempt.saturating_sub(2).min(16);
		Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << doublings))
	}
}

/// Runs intake passes against one orchestrator.
///
/// Passes are serialized; leads inside a pass are processed one at a time in
/// file order.
pub struct IntakeService {
	orchestrator: Arc<SendOrchestrator>,
	leads: LeadSource,
	ledger: SqliteLedger,
	template: MessageTemplate,
	retry: RetryPolicy,
	pass: Mutex<()>,
}

impl IntakeService {
	pub fn new(orchestrator: Arc<SendOrchestrator>, leads: LeadSource, ledger: SqliteLedger) -> Self {
		Self {
			orchestrator,
			leads,
			ledger,
			template: MessageTemplate::default(),
			retry: RetryPolicy::default(),
			pass: Mutex::new(()),
		}
	}

	pub fn with_template(mut self, template: MessageTemplate) -> Self {
		self.template = template;
		self
	}

	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;
		self
	}

	pub fn orchestrator(&self) -> &SendOrchestrator {
		&self.orchestrator
	}

	pub fn ledger(&self) -> &SqliteLedger {
		&self.ledger
	}

	/// Messages every matching lead not yet in the ledger and returns those
	/// that were sent.
	///
	/// A lead is recorded as soon as its message is committed, even if the
	/// session could not be saved afterwards, so it is never messaged again.
	pub async fn process(&self, request: &LeadRequest) -> Result<Vec<LeadRecord>> {
		let _pass = self.pass.lock().await;
		let matched = self.leads.matching(request)?;
		info!(
			target = "outreach.intake",
			job_title = %request.job_title,
			location = %request.location,
			matched = matched.len(),
			"intake pass started"
		);

		let mut sent = Vec::new();
		for lead in matched {
			if self.ledger.has_been_contacted(lead.recipient())? {
				debug!(target = "outreach.intake", recipient = lead.recipient(), "already contacted");
				continue;
			}

			let message = self.template.render(&lead);
			let outcome = self.send_with_retry(lead.recipient(), &message).await;
			if outcome.committed() {
				self.ledger.record_contacted(&lead)?;
				sent.push(lead);
			}
		}

		info!(target = "outreach.intake", sent = sent.len(), "intake pass finished");
		Ok(sent)
	}

	async fn send_with_retry(&self, recipient: &str, message: &str) -> SendOutcome {
		let attempts = self.retry.max_attempts.max(1);
		let mut attempt = 1;
		loop {
			let outcome = self.orchestrator.send(recipient, message).await;
			if outcome.committed() || attempt >= attempts {
				return outcome;
			}

			attempt += 1;
			let pause = self.retry.backoff_before(attempt);
			warn!(
				target = "outreach.intake",
				recipient,
				attempt,
				of = attempts,
				pause_ms = pause.as_millis() as u64,
				"retrying send"
			);
			tokio::time::sleep(pause).await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_template_matches_lead_fields() {
		let lead = LeadRecord {
			job_title: "Chef".into(),
			location: "Paris".into(),
			linkedin_url: String::new(),
			phone_number: "+33600000000".into(),
		};
		assert_eq!(
			MessageTemplate::default().render(&lead),
			"Hi, we have an opportunity matching your profile (Chef in Paris)!"
		);
		assert_eq!(MessageTemplate::new("{phone_number}/{unknown}").render(&lead), "+33600000000/{unknown}");
	}

	#[test]
	fn backoff_doubles_per_retry() {
		let retry = RetryPolicy {
			max_attempts: 4,
			backoff_ms: 100,
		};
		assert_eq!(retry.backoff_before(2), Duration::from_millis(100));
		assert_eq!(retry.backoff_before(3), Duration::from_millis(200));
		assert_eq!(retry.backoff_before(4), Duration::from_millis(400));
	}
}

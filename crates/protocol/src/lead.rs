//! Lead rows as they appear in the lead source file.

use serde::{Deserialize, Serialize};

/// One row of the lead source file.
///
/// The recipient identifier, `phone_number` without its optional leading `+`,
/// uniquely identifies a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
	pub job_title: String,
	pub location: String,
	#[serde(default)]
	pub linkedin_url: String,
	pub phone_number: String,
}

impl LeadRecord {
	/// Recipient identifier used for dedup and delivery.
	pub fn recipient(&self) -> &str {
		let phone = self.phone_number.trim();
		phone.strip_prefix('+').unwrap_or(phone)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn linkedin_url_defaults_when_absent() {
		let json = r#"{"job_title":"Chef","location":"Paris","phone_number":"+33600000000"}"#;
		let lead: LeadRecord = serde_json::from_str(json).unwrap();
		assert_eq!(lead.linkedin_url, "");
		assert_eq!(lead.recipient(), "33600000000");
	}

	#[test]
	fn recipient_ignores_plus_prefix() {
		let with_plus = LeadRecord {
			job_title: "Chef".into(),
			location: "Paris".into(),
			linkedin_url: String::new(),
			phone_number: "+33600000001".into(),
		};
		let without = LeadRecord {
			phone_number: "33600000001".into(),
			..with_plus.clone()
		};
		assert_eq!(with_plus.recipient(), without.recipient());
		assert_eq!(with_plus.phone_number, "+33600000001");
	}
}

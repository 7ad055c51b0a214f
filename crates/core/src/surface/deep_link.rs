//! Deep-link construction for pre-filled conversations.

use url::form_urlencoded;

use crate::error::{Error, Result};

/// E.164 allows at most 15 digits.
const MAX_RECIPIENT_DIGITS: usize = 15;

/// Strips an optional leading `+` and checks the rest is 1-15 ASCII digits.
pub fn normalize_recipient(recipient: &str) -> Result<&str> {
	let digits = recipient.strip_prefix('+').unwrap_or(recipient);
	if digits.is_empty() || digits.len() > MAX_RECIPIENT_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return Err(Error::InvalidInput(format!("recipient {recipient:?} is not an E.164 phone number")));
	}
	Ok(digits)
}

/// `<base>/send?phone=..&text=..&app_absent=0` for one recipient and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
	url: String,
}

impl DeepLink {
	/// Builds the link. The message is form-encoded (spaces become `+`).
	pub fn new(base_url: &str, recipient: &str, message: &str) -> Result<Self> {
		let phone = normalize_recipient(recipient)?;
		let text: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
		let url = format!("{}/send?phone={}&text={}&app_absent=0", base_url.trim_end_matches('/'), phone, text);
		Ok(Self { url })
	}

	pub fn as_str(&self) -> &str {
		&self.url
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_plus_and_escapes_text() {
		let link = DeepLink::new("https://web.whatsapp.com", "+33600000000", "Hi, Chef in Paris!").unwrap();
		assert_eq!(
			link.as_str(),
			"https://web.whatsapp.com/send?phone=33600000000&text=Hi%2C+Chef+in+Paris%21&app_absent=0"
		);
	}

	#[test]
	fn escapes_reserved_and_unicode_characters() {
		let link = DeepLink::new("https://web.whatsapp.com/", "919876543210", "a&b=c (é)").unwrap();
		assert!(link.as_str().ends_with("&text=a%26b%3Dc+%28%C3%A9%29&app_absent=0"), "{}", link.as_str());
		assert!(link.as_str().starts_with("https://web.whatsapp.com/send?phone=919876543210"));
	}

	#[test]
	fn rejects_non_phone_recipients() {
		for bad in ["", "+", "+33 600", "abc", "1234567890123456", "++33"] {
			assert!(normalize_recipient(bad).is_err(), "{bad:?} should be rejected");
		}
		assert_eq!(normalize_recipient("+1").unwrap(), "1");
	}
}

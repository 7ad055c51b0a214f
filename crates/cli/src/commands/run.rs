use outreach_protocol::{LeadRequest, SentLeadsResponse};

use crate::config::RelayConfig;
use crate::error::Result;

/// One intake pass from the command line; prints the sent leads as JSON.
pub async fn execute(config: &RelayConfig, job_title: String, location: String) -> Result<()> {
	let intake = super::intake(config)?;
	let sent_leads = intake.process(&LeadRequest { job_title, location }).await?;
	if sent_leads.is_empty() {
		eprintln!("No new leads found");
	}
	println!("{}", serde_json::to_string_pretty(&SentLeadsResponse { sent_leads })?);
	Ok(())
}

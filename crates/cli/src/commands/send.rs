use colored::Colorize;

use crate::config::RelayConfig;
use crate::error::{CliError, Result};

/// One-off send. Nothing is recorded in the ledger.
pub async fn execute(config: &RelayConfig, phone: &str, message: &str) -> Result<()> {
	let orchestrator = super::orchestrator(config)?;
	let outcome = orchestrator.send(phone, message).await;

	match outcome.failure {
		None => {
			println!("{} message delivered to {}", "ok".green(), outcome.recipient);
			Ok(())
		}
		Some(failure) => Err(CliError::Delivery {
			recipient: outcome.recipient,
			stage: failure.stage.to_string(),
			detail: failure.detail,
		}),
	}
}

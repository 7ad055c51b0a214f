use colored::Colorize;
use outreach::PairingStatus;
use tracing::warn;

use crate::config::RelayConfig;
use crate::error::Result;

pub async fn execute(config: &RelayConfig) -> Result<()> {
	if config.browser.headless {
		warn!(target = "outreach.pairing", "pairing in headless mode: the QR code will not be visible");
	}

	let orchestrator = super::orchestrator(config)?;
	match orchestrator.pair().await? {
		PairingStatus::AlreadyAuthenticated => println!("{} session at {} is still valid", "ok".green(), orchestrator.store().path().display()),
		PairingStatus::Paired => println!("{} paired, session saved to {}", "ok".green(), orchestrator.store().path().display()),
	}
	Ok(())
}

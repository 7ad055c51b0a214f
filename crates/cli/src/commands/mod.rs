mod pair;
mod run;
mod send;
mod serve;
mod session;

use std::sync::Arc;

use outreach::{ChromiumDriver, SendOrchestrator, SessionStore};

use crate::cli::{Cli, Commands, SessionAction};
use crate::config::{ConfigOverrides, RelayConfig};
use crate::error::Result;
use crate::intake::{IntakeService, MessageTemplate};
use crate::leads::LeadSource;
use crate::ledger::SqliteLedger;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let config = RelayConfig::load(cli.config.as_deref())?.apply(ConfigOverrides {
		session: cli.session,
		leads: cli.leads,
		ledger: cli.ledger,
		headless: cli.headless,
	});

	match cli.command {
		Commands::Serve { bind } => serve::execute(&config, bind).await?,
		Commands::Run { job_title, location } => run::execute(&config, job_title, location).await?,
		Commands::Pair => pair::execute(&config).await?,
		Commands::Send { phone, message } => send::execute(&config, &phone, &message).await?,
		Commands::Session { action } => match action {
			SessionAction::Show => session::show(&config)?,
			SessionAction::Clear => session::clear(&config)?,
		},
	}

	Ok(())
}

/// Orchestrator over a real Chromium browser.
fn orchestrator(config: &RelayConfig) -> Result<SendOrchestrator> {
	let store = SessionStore::new(config.session_path()?);
	let surface = config.surface.to_surface_config();
	let driver = ChromiumDriver::new(config.browser.to_options(), &surface);
	Ok(SendOrchestrator::new(Arc::new(driver), store, surface))
}

fn intake(config: &RelayConfig) -> Result<IntakeService> {
	let ledger = SqliteLedger::open(&config.ledger_file)?;
	Ok(IntakeService::new(Arc::new(orchestrator(config)?), LeadSource::new(&config.leads_file), ledger)
		.with_template(MessageTemplate::new(config.message_template.clone()))
		.with_retry(config.retry))
}

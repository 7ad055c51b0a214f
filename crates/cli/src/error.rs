use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Lead file error: {0}")]
	LeadSource(#[from] csv::Error),

	#[error("Ledger error: {0}")]
	Ledger(#[from] rusqlite::Error),

	#[error(transparent)]
	Core(#[from] outreach::Error),

	#[error("Message to {recipient} was not delivered ({stage}): {detail}")]
	Delivery { recipient: String, stage: String, detail: String },

	#[error("Server error: {0}")]
	Server(String),

	#[error("IO error: {0}")]
	Io(#[from] io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

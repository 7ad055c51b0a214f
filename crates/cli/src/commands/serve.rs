use std::sync::Arc;

use crate::config::RelayConfig;
use crate::error::Result;
use crate::server;

pub async fn execute(config: &RelayConfig, bind: Option<String>) -> Result<()> {
	let intake = Arc::new(super::intake(config)?);
	let bind = bind.unwrap_or_else(|| config.bind.clone());
	server::serve(intake, &bind).await
}

use colored::Colorize;
use outreach::SessionStore;
use outreach_protocol::StorageState;

use crate::config::RelayConfig;
use crate::error::Result;

pub fn show(config: &RelayConfig) -> Result<()> {
	let store = SessionStore::new(config.session_path()?);
	let path = store.path().display();

	let Some(state) = store.load()? else {
		println!("{} no session at {path}; run `outreach pair` first", "missing".yellow());
		return Ok(());
	};

	println!("{} {path} ({} bytes)", "session".green(), state.len());
	match serde_json::from_slice::<StorageState>(state.as_bytes()) {
		Ok(storage) => {
			let local_storage: usize = storage.origins.iter().map(|o| o.local_storage.len()).sum();
			println!("  cookies: {}", storage.cookies.len());
			println!("  origins: {}", storage.origins.len());
			println!("  localStorage entries: {local_storage}");
		}
		Err(_) => println!("  {}", "not a browser storage state".dimmed()),
	}
	Ok(())
}

pub fn clear(config: &RelayConfig) -> Result<()> {
	let store = SessionStore::new(config.session_path()?);
	if store.clear()? {
		println!("{} removed {}; the next send will pair again", "cleared".green(), store.path().display());
	} else {
		println!("{} nothing to remove at {}", "missing".yellow(), store.path().display());
	}
	Ok(())
}

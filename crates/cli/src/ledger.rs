//! SQLite ledger of leads that were already messaged.

use std::path::Path;

use outreach_protocol::LeadRecord;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::Result;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS leads (
	job_title TEXT,
	location TEXT,
	linkedin_url TEXT,
	phone_number TEXT PRIMARY KEY,
	request_sent INTEGER
)";

/// Dedup ledger keyed by recipient identifier (phone number without `+`).
///
/// Rows written with a `+` prefix still count as contacted.
pub struct SqliteLedger {
	conn: Mutex<Connection>,
}

impl SqliteLedger {
	/// Opens (creating if needed) the ledger at `path`.
	pub fn open(path: &Path) -> Result<Self> {
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() {
				std::fs::create_dir_all(parent)?;
			}
		}
		Self::init(Connection::open(path)?)
	}

	pub fn open_in_memory() -> Result<Self> {
		Self::init(Connection::open_in_memory()?)
	}

	fn init(conn: Connection) -> Result<Self> {
		conn.execute(SCHEMA, [])?;
		Ok(Self { conn: Mutex::new(conn) })
	}

	/// Whether `recipient` already has a ledger entry, with or without `+`.
	pub fn has_been_contacted(&self, recipient: &str) -> Result<bool> {
		let key = ledger_key(recipient);
		let row: Option<Option<i64>> = self
			.conn
			.lock()
			.query_row(
				"SELECT request_sent FROM leads WHERE phone_number IN (?1, '+' || ?1) LIMIT 1",
				params![key],
				|row| row.get(0),
			)
			.optional()?;
		Ok(row.is_some())
	}

	/// Records `lead` as contacted. Returns `false` if it was already recorded.
	pub fn record_contacted(&self, lead: &LeadRecord) -> Result<bool> {
		let key = lead.recipient();
		if self.has_been_contacted(key)? {
			debug!(target = "outreach.intake", recipient = key, inserted = false, "ledger updated");
			return Ok(false);
		}
		let inserted = self.conn.lock().execute(
			"INSERT OR IGNORE INTO leads (job_title, location, linkedin_url, phone_number, request_sent) VALUES (?1, ?2, ?3, ?4, 1)",
			params![lead.job_title, lead.location, lead.linkedin_url, key],
		)?;
		debug!(target = "outreach.intake", recipient = key, inserted = inserted > 0, "ledger updated");
		Ok(inserted > 0)
	}

	pub fn contacted_count(&self) -> Result<u64> {
		let count: i64 = self.conn.lock().query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
		Ok(count as u64)
	}
}

fn ledger_key(recipient: &str) -> &str {
	let recipient = recipient.trim();
	recipient.strip_prefix('+').unwrap_or(recipient)
}

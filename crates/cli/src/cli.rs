use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "outreach")]
#[command(about = "Match job leads and message them once over WhatsApp Web", long_about = None)]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	pub verbose: u8,

	/// JSON configuration file
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Session file holding the paired WhatsApp Web state
	#[arg(long, global = true, value_name = "FILE")]
	pub session: Option<PathBuf>,

	/// Lead CSV (job_title,location,linkedin_url,phone_number)
	#[arg(long, global = true, value_name = "FILE")]
	pub leads: Option<PathBuf>,

	/// SQLite ledger of contacted leads
	#[arg(long, global = true, value_name = "FILE")]
	pub ledger: Option<PathBuf>,

	/// Run the browser without a window (pairing needs a window)
	#[arg(long, global = true)]
	pub headless: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Serve the lead intake endpoint
	Serve {
		/// Address to listen on
		#[arg(long, value_name = "ADDR")]
		bind: Option<String>,
	},

	/// Run one intake pass and print the contacted leads as JSON
	Run {
		#[arg(long)]
		job_title: String,
		#[arg(long)]
		location: String,
	},

	/// Pair with WhatsApp Web and save the session
	Pair,

	/// Send one message outside the lead pipeline (not recorded in the ledger)
	Send {
		/// Recipient phone number, E.164 with optional leading +
		phone: String,
		message: String,
	},

	/// Inspect or invalidate the stored session
	Session {
		#[command(subcommand)]
		action: SessionAction,
	},
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
	/// Summarize the session file
	Show,
	/// Delete the session file, forcing a new pairing
	Clear,
}

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod intake;
pub mod leads;
pub mod ledger;
pub mod logging;
pub mod server;

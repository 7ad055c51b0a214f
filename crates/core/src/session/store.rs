//! File-backed session persistence.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::state::SessionState;
use crate::error::{Error, Result};

/// Stores one [`SessionState`] at an explicit path.
///
/// Callers must serialize access; [`SendOrchestrator`](crate::SendOrchestrator)
/// holds a lock around every load/save pair.
#[derive(Debug, Clone)]
pub struct SessionStore {
	path: PathBuf,
}

impl SessionStore {
	/// Creates a store for `path`. Nothing is touched on disk until `load`/`save`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn exists(&self) -> bool {
		self.path.is_file()
	}

	/// Reads the persisted blob. A missing file yields `Ok(None)`.
	pub fn load(&self) -> Result<Option<SessionState>> {
		match fs::read(&self.path) {
			Ok(bytes) => {
				debug!(target = "outreach.session", path = %self.path.display(), bytes = bytes.len(), "loaded session state");
				Ok(Some(SessionState::from_bytes(bytes)))
			}
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				debug!(target = "outreach.session", path = %self.path.display(), "no session state on disk");
				Ok(None)
			}
			Err(err) => Err(Error::Session(format!("Failed to read {}: {}", self.path.display(), err))),
		}
	}

	/// Atomically replaces the persisted blob.
	///
	/// Writes a sibling temp file, syncs it, then renames it over the target so
	/// readers see either the previous blob or the new one.
	pub fn save(&self, state: &SessionState) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() && !parent.exists() {
				fs::create_dir_all(parent)?;
			}
		}

		let tmp = self.temp_path();
		let written = File::create(&tmp).and_then(|mut file| {
			file.write_all(state.as_bytes())?;
			file.sync_all()
		});
		if let Err(err) = written {
			let _ = fs::remove_file(&tmp);
			return Err(Error::Session(format!("Failed to write {}: {}", tmp.display(), err)));
		}

		fs::rename(&tmp, &self.path).map_err(|err| {
			let _ = fs::remove_file(&tmp);
			Error::Session(format!("Failed to replace {}: {}", self.path.display(), err))
		})?;

		debug!(target = "outreach.session", path = %self.path.display(), bytes = state.len(), "saved session state");
		Ok(())
	}

	/// Deletes the session file. Returns `false` when there was nothing to delete.
	pub fn clear(&self) -> Result<bool> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(true),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
			Err(err) => Err(err.into()),
		}
	}

	fn temp_path(&self) -> PathBuf {
		let name = self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "session".to_string());
		self.path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
	}
}

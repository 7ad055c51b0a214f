//! CSV lead source.

use std::path::{Path, PathBuf};

use outreach_protocol::{LeadRecord, LeadRequest};
use tracing::debug;

use crate::error::Result;

/// Lead CSV with header `job_title,location,linkedin_url,phone_number`.
#[derive(Debug, Clone)]
pub struct LeadSource {
	path: PathBuf,
}

impl LeadSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Every row, in file order. The file is re-read on each call.
	pub fn read_all(&self) -> Result<Vec<LeadRecord>> {
		let mut reader = csv::Reader::from_path(&self.path)?;
		let leads = reader.deserialize().collect::<std::result::Result<Vec<LeadRecord>, _>>()?;
		debug!(target = "outreach.intake", path = %self.path.display(), rows = leads.len(), "read lead file");
		Ok(leads)
	}

	/// Rows matching `request`, in file order.
	pub fn matching(&self, request: &LeadRequest) -> Result<Vec<LeadRecord>> {
		Ok(self.read_all()?.into_iter().filter(|lead| matches(lead, request)).collect())
	}
}

/// Case-insensitive exact match on job title and location. No trimming.
pub fn matches(lead: &LeadRecord, request: &LeadRequest) -> bool {
	lead.job_title.to_lowercase() == request.job_title.to_lowercase() && lead.location.to_lowercase() == request.location.to_lowercase()
}

use std::fmt;

/// Serialized authentication state for the messaging surface.
///
/// The bytes belong to whichever [`SurfaceDriver`](crate::surface::SurfaceDriver)
/// produced them; nothing else parses them.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionState {
	blob: Vec<u8>,
}

impl SessionState {
	pub fn from_bytes(blob: impl Into<Vec<u8>>) -> Self {
		Self { blob: blob.into() }
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.blob
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.blob
	}

	pub fn len(&self) -> usize {
		self.blob.len()
	}

	pub fn is_empty(&self) -> bool {
		self.blob.is_empty()
	}
}

// Session blobs carry live credentials; keep them out of logs.
impl fmt::Debug for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionState").field("len", &self.blob.len()).finish()
	}
}

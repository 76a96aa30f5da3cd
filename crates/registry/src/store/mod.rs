//! Persistence collaborators.
//!
//! The whole collection lives under one key and is always written whole. Each
//! write names the revision it was computed from; a store refuses the write
//! when its revision has moved on, which is how lost updates are detected.

mod file;
mod memory;

pub use self::file::JsonFileStore;
pub use self::memory::MemoryStore;
use crate::record::EngineRecord;

/// Monotonic collection version. Zero means never written.
pub type Revision = u64;

/// Collection as read from a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
	pub revision: Revision,
	pub records: Vec<EngineRecord>,
}

/// Storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	/// The collection changed since `expected` was read.
	#[error("stale write: expected revision {expected}, store is at {actual}")]
	Conflict { expected: Revision, actual: Revision },
	#[error("store unavailable: {0}")]
	Unavailable(String),
	#[error("store io: {0}")]
	Io(#[from] std::io::Error),
	#[error("store encoding: {0}")]
	Encoding(#[from] serde_json::Error),
}

impl StoreError {
	/// Failures worth retrying unchanged after a short wait.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Unavailable(_) => true,
			Self::Io(err) => matches!(
				err.kind(),
				std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
			),
			Self::Conflict { .. } | Self::Encoding(_) => false,
		}
	}
}

/// Key-value store holding the engine collection.
pub trait EngineStore: Send + Sync {
	/// Reads the collection and its revision.
	fn load(&self) -> Result<Snapshot, StoreError>;

	/// Replaces the collection if the stored revision still equals `expected`.
	///
	/// Returns the new revision.
	fn store(&self, expected: Revision, records: &[EngineRecord]) -> Result<Revision, StoreError>;
}

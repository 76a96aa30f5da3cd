use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{EngineStore, Revision, Snapshot, StoreError};
use crate::record::EngineRecord;

/// In-process store with lock-free reads.
///
/// Writes publish a new snapshot with compare-and-swap, so a writer that lost
/// the race sees the newer revision and reports a conflict.
#[derive(Debug)]
pub struct MemoryStore {
	snap: ArcSwap<Snapshot>,
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryStore {
	/// Creates an empty, never written store.
	pub fn new() -> Self {
		Self {
			snap: ArcSwap::from_pointee(Snapshot::default()),
		}
	}

	/// Creates a store that already holds `records` at revision 1.
	pub fn with_records(records: Vec<EngineRecord>) -> Self {
		Self {
			snap: ArcSwap::from_pointee(Snapshot { revision: 1, records }),
		}
	}
}

impl EngineStore for MemoryStore {
	fn load(&self) -> Result<Snapshot, StoreError> {
		Ok(Snapshot::clone(&self.snap.load()))
	}

	fn store(&self, expected: Revision, records: &[EngineRecord]) -> Result<Revision, StoreError> {
		let cur = self.snap.load_full();
		if cur.revision != expected {
			return Err(StoreError::Conflict {
				expected,
				actual: cur.revision,
			});
		}

		let next = Arc::new(Snapshot {
			revision: expected + 1,
			records: records.to_vec(),
		});
		let prev = self.snap.compare_and_swap(&cur, next);
		if Arc::ptr_eq(&prev, &cur) {
			Ok(expected + 1)
		} else {
			Err(StoreError::Conflict {
				expected,
				actual: prev.revision,
			})
		}
	}
}

//! Reconciles incoming records into an existing collection.
//!
//! # Role
//!
//! Both import and single-record upsert go through [`merge_records`]. Every
//! referential gap and every id collision is put to a [`DecisionPolicy`];
//! nothing is dropped without a decision.
//!
//! # Invariants
//!
//! - The input collection is never modified; callers commit the returned
//!   collection in a single write.
//! - Overwrites keep the replaced record's position.
//! - The merged collection builds into a forest, otherwise the merge fails.
//! - A policy that cannot answer fails the whole merge.

mod policy;

use rustc_hash::FxHashMap;
use serde_json::Value;

pub use self::policy::{AlwaysOverwrite, AlwaysSkip, DecisionError, DecisionPolicy, Fixed, Prompt, Scripted};
pub(crate) use self::policy::Remembered;
use crate::record::EngineRecord;
use crate::transfer::{self, FormatError};
use crate::tree::{self, TreeError};

/// Merge failure. The current collection is untouched in every case.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
	#[error(transparent)]
	Format(#[from] FormatError),
	#[error(transparent)]
	Decision(#[from] DecisionError),
	#[error("merged collection is malformed: {0}")]
	Structure(#[from] TreeError),
}

/// What a merge did, by record id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
	pub added: Vec<String>,
	pub overwritten: Vec<String>,
	pub placeholders: Vec<String>,
	pub skipped_duplicates: Vec<String>,
	pub skipped_orphans: Vec<String>,
}

impl MergeReport {
	/// True when the merged collection differs from the input.
	pub fn changed(&self) -> bool {
		!(self.added.is_empty() && self.overwritten.is_empty() && self.placeholders.is_empty())
	}
}

/// Merged collection plus the decisions that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
	pub records: Vec<EngineRecord>,
	pub report: MergeReport,
}

/// Merges a raw import payload into `current`.
///
/// The payload must be a JSON array of record-shaped objects; it is validated
/// completely before the first candidate is considered.
pub fn merge(current: &[EngineRecord], incoming: &Value, policy: &mut dyn DecisionPolicy) -> Result<MergeOutcome, MergeError> {
	let candidates = transfer::candidates(incoming)?;
	merge_records(current, candidates, policy)
}

/// Merges already validated candidates into `current`, in order.
pub fn merge_records(
	current: &[EngineRecord],
	candidates: impl IntoIterator<Item = EngineRecord>,
	policy: &mut dyn DecisionPolicy,
) -> Result<MergeOutcome, MergeError> {
	let mut working = WorkingSet::new(current);
	let mut report = MergeReport::default();

	for candidate in candidates {
		if let Some(parent_id) = candidate.parent_id.as_deref()
			&& !working.contains(parent_id)
		{
			if policy.should_create_placeholder(parent_id)? {
				tracing::debug!(parent = parent_id, child = %candidate.id, "merge.placeholder");
				report.placeholders.push(parent_id.to_string());
				working.append(EngineRecord::placeholder(parent_id));
			} else {
				tracing::debug!(parent = parent_id, child = %candidate.id, "merge.skip_orphan");
				report.skipped_orphans.push(candidate.id);
				continue;
			}
		}

		match working.position(&candidate.id) {
			Some(pos) => {
				if policy.should_overwrite(&candidate.id)? {
					tracing::debug!(id = %candidate.id, "merge.overwrite");
					report.overwritten.push(candidate.id.clone());
					working.records[pos] = candidate;
				} else {
					tracing::debug!(id = %candidate.id, "merge.skip_duplicate");
					report.skipped_duplicates.push(candidate.id);
				}
			}
			None => {
				report.added.push(candidate.id.clone());
				working.append(candidate);
			}
		}
	}

	tree::build(&working.records)?;
	Ok(MergeOutcome {
		records: working.records,
		report,
	})
}

/// Working copy with an id index. The first occurrence of an id is the one
/// overwrites target.
struct WorkingSet {
	records: Vec<EngineRecord>,
	index: FxHashMap<String, usize>,
}

impl WorkingSet {
	fn new(current: &[EngineRecord]) -> Self {
		let mut index = FxHashMap::default();
		for (pos, record) in current.iter().enumerate() {
			index.entry(record.id.clone()).or_insert(pos);
		}
		Self {
			records: current.to_vec(),
			index,
		}
	}

	fn contains(&self, id: &str) -> bool {
		self.index.contains_key(id)
	}

	fn position(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	fn append(&mut self, record: EngineRecord) {
		self.index.entry(record.id.clone()).or_insert(self.records.len());
		self.records.push(record);
	}
}

#[cfg(test)]
mod tests;

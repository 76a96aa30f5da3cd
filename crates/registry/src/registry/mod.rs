//! Registry facade over an [`EngineStore`].
//!
//! # Role
//!
//! Owns every mutation of the engine collection: single-record upsert,
//! removal, import, and first-run seeding. Reads go straight to the store.
//!
//! # Invariants
//!
//! - Mutations run one at a time behind the writer lock.
//! - Every write names the revision it was computed from. A conflicting write
//!   is recomputed from a fresh read, never replayed.
//! - A write is committed only if the resulting collection builds into a
//!   forest and every question was answered.
//! - Listeners run after the write, outside every registry lock.

mod events;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use backon::{BackoffBuilder, ExponentialBuilder};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

pub use self::events::{ChangeCause, RegistryEvent, SubscriptionId};
use self::events::Listener;
use crate::config::{Config, RegistryConfig};
use crate::error::{RegistryError, ValidationError};
use crate::merge::{self, DecisionPolicy, MergeReport, Remembered};
use crate::record::{self, EngineRecord};
use crate::store::{EngineStore, Revision, Snapshot, StoreError};
use crate::transfer;

/// How an upsert ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
	pub status: UpsertStatus,
	/// Id of the placeholder parent created on the way, if any.
	pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStatus {
	Inserted,
	Replaced,
	Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// The id exists and overwrite was declined.
	Duplicate,
	/// The parent is unknown and a placeholder was declined.
	MissingParent,
}

/// Result of one recompute: the collection to write (if any) and the value
/// handed back to the caller.
struct Mutation<T> {
	records: Option<Vec<EngineRecord>>,
	value: T,
}

impl<T> Mutation<T> {
	fn write(records: Vec<EngineRecord>, value: T) -> Self {
		Self {
			records: Some(records),
			value,
		}
	}

	fn unchanged(value: T) -> Self {
		Self { records: None, value }
	}
}

pub struct EngineRegistry {
	store: Arc<dyn EngineStore>,
	config: RegistryConfig,
	selection_token: String,
	writer: Mutex<()>,
	listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
	next_subscription: AtomicU64,
}

impl EngineRegistry {
	pub fn new(store: Arc<dyn EngineStore>, config: &Config) -> Self {
		Self {
			store,
			config: config.registry.clone(),
			selection_token: config.engines.selection_token.clone(),
			writer: Mutex::new(()),
			listeners: RwLock::new(Vec::new()),
			next_subscription: AtomicU64::new(0),
		}
	}

	/// Registry with default configuration.
	pub fn with_store(store: Arc<dyn EngineStore>) -> Self {
		Self::new(store, &Config::default())
	}

	pub fn selection_token(&self) -> &str {
		&self.selection_token
	}

	pub fn snapshot(&self) -> Result<Snapshot, RegistryError> {
		Ok(self.load()?)
	}

	pub fn records(&self) -> Result<Vec<EngineRecord>, RegistryError> {
		Ok(self.load()?.records)
	}

	pub fn revision(&self) -> Result<Revision, RegistryError> {
		Ok(self.load()?.revision)
	}

	/// First record with `id`.
	pub fn get(&self, id: &str) -> Result<Option<EngineRecord>, RegistryError> {
		Ok(self.load()?.records.into_iter().find(|record| record.id == id))
	}

	/// Inserts or replaces a single record.
	///
	/// An unknown parent is put to `policy` as a placeholder question, an
	/// existing id as an overwrite question. Each question is asked once even
	/// if a concurrent write forces a recompute.
	pub fn upsert(&self, record: EngineRecord, policy: &mut dyn DecisionPolicy) -> Result<UpsertOutcome, RegistryError> {
		let record = record.normalized();
		validate(&record)?;
		if let Some(query) = record.query_format.as_deref()
			&& !query.contains(self.selection_token.as_str())
		{
			tracing::warn!(id = %record.id, token = %self.selection_token, "registry.upsert.no_selection_token");
		}

		let mut policy = Remembered::new(policy);
		self.mutate(ChangeCause::Upsert, |snapshot| {
			policy.rewind();
			let outcome = merge::merge_records(&snapshot.records, [record.clone()], &mut policy)?;
			let report = &outcome.report;
			let status = if !report.added.is_empty() {
				UpsertStatus::Inserted
			} else if !report.overwritten.is_empty() {
				UpsertStatus::Replaced
			} else if !report.skipped_orphans.is_empty() {
				UpsertStatus::Skipped(SkipReason::MissingParent)
			} else {
				UpsertStatus::Skipped(SkipReason::Duplicate)
			};
			let value = UpsertOutcome {
				status,
				placeholder: report.placeholders.first().cloned(),
			};
			Ok(if report.changed() {
				Mutation::write(outcome.records, value)
			} else {
				Mutation::unchanged(value)
			})
		})
	}

	/// Removes every record with `id`. Children are left in place as orphans.
	///
	/// Returns false, without writing, when no record matched.
	pub fn remove(&self, id: &str) -> Result<bool, RegistryError> {
		self.mutate(ChangeCause::Remove, |snapshot| {
			if !snapshot.records.iter().any(|record| record.id == id) {
				return Ok(Mutation::unchanged(false));
			}
			let remaining = snapshot.records.iter().filter(|record| record.id != id).cloned().collect();
			Ok(Mutation::write(remaining, true))
		})
	}

	/// Imports an exported collection given as JSON text.
	pub fn import_json(&self, text: &str, policy: &mut dyn DecisionPolicy) -> Result<MergeReport, RegistryError> {
		let payload = transfer::parse_json(text)?;
		self.import_value(&payload, policy)
	}

	/// Merges `payload` into the collection and writes the result once.
	pub fn import_value(&self, payload: &Value, policy: &mut dyn DecisionPolicy) -> Result<MergeReport, RegistryError> {
		// Fail on malformed payloads before touching the store.
		transfer::candidates(payload)?;
		let mut policy = Remembered::new(policy);
		self.mutate(ChangeCause::Import, |snapshot| {
			policy.rewind();
			let outcome = merge::merge(&snapshot.records, payload, &mut policy)?;
			tracing::info!(
				added = outcome.report.added.len(),
				overwritten = outcome.report.overwritten.len(),
				placeholders = outcome.report.placeholders.len(),
				skipped = outcome.report.skipped_duplicates.len() + outcome.report.skipped_orphans.len(),
				"registry.import"
			);
			Ok(if outcome.report.changed() {
				Mutation::write(outcome.records, outcome.report)
			} else {
				Mutation::unchanged(outcome.report)
			})
		})
	}

	/// Pretty-printed JSON array of the whole collection.
	pub fn export_json(&self) -> Result<String, RegistryError> {
		let records = self.records()?;
		transfer::export_json(&records).map_err(RegistryError::Export)
	}

	/// Writes the default collection if the store has never been written.
	///
	/// Returns true when it seeded.
	pub fn seed_defaults_if_empty(&self) -> Result<bool, RegistryError> {
		self.mutate(ChangeCause::Seed, |snapshot| {
			if snapshot.revision != 0 || !snapshot.records.is_empty() {
				return Ok(Mutation::unchanged(false));
			}
			Ok(Mutation::write(record::default_records(), true))
		})
	}

	/// Registers a change listener.
	pub fn subscribe(&self, listener: impl Fn(&RegistryEvent) + Send + Sync + 'static) -> SubscriptionId {
		let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
		self.listeners.write().push((id, Arc::new(listener)));
		id
	}

	/// Drops a listener. Returns false if it was not registered.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut listeners = self.listeners.write();
		let before = listeners.len();
		listeners.retain(|(sub, _)| *sub != id);
		listeners.len() != before
	}

	/// Read-modify-write loop shared by every mutation.
	///
	/// `compute` may run more than once; it sees a fresh snapshot each time.
	fn mutate<T>(
		&self,
		cause: ChangeCause,
		mut compute: impl FnMut(&Snapshot) -> Result<Mutation<T>, RegistryError>,
	) -> Result<T, RegistryError> {
		let (revision, value) = {
			let _writer = self.writer.lock();
			let mut attempts = 0;
			loop {
				attempts += 1;
				let snapshot = self.load()?;
				let Mutation { records, value } = compute(&snapshot)?;
				let Some(records) = records else {
					return Ok(value);
				};
				match self.with_backoff("store", || self.store.store(snapshot.revision, &records)) {
					Ok(revision) => {
						tracing::debug!(?cause, revision, records = records.len(), "registry.write");
						break (revision, value);
					}
					Err(StoreError::Conflict { expected, actual }) if attempts <= self.config.conflict_retries => {
						tracing::warn!(?cause, expected, actual, attempt = attempts, "registry.write.conflict");
					}
					Err(StoreError::Conflict { .. }) => return Err(RegistryError::StaleWrite { attempts }),
					Err(err) => return Err(err.into()),
				}
			}
		};
		self.notify(RegistryEvent::Changed { revision, cause });
		Ok(value)
	}

	fn load(&self) -> Result<Snapshot, StoreError> {
		self.with_backoff("load", || self.store.load())
	}

	/// Retries transient store failures with exponential backoff.
	fn with_backoff<R>(&self, op: &'static str, mut f: impl FnMut() -> Result<R, StoreError>) -> Result<R, StoreError> {
		let mut delays = ExponentialBuilder::default()
			.with_min_delay(self.config.backoff_min())
			.with_max_delay(self.config.backoff_max())
			.with_factor(2.0)
			.with_max_times(self.config.io_retries)
			.build();
		loop {
			match f() {
				Err(err) if err.is_transient() => {
					let Some(delay) = delays.next() else {
						return Err(err);
					};
					tracing::warn!(op, error = %err, ?delay, "registry.store.retry");
					std::thread::sleep(delay);
				}
				other => return other,
			}
		}
	}

	fn notify(&self, event: RegistryEvent) {
		let listeners: Vec<Listener> = self.listeners.read().iter().map(|(_, l)| Arc::clone(l)).collect();
		for listener in listeners {
			listener(&event);
		}
	}
}

fn validate(record: &EngineRecord) -> Result<(), ValidationError> {
	if record.id.is_empty() {
		return Err(ValidationError::MissingId);
	}
	if record.display_name.is_empty() {
		return Err(ValidationError::MissingDisplayName);
	}
	Ok(())
}

//! Contextual search engine collection.
//!
//! Records form a parent/child hierarchy that is persisted flat and rebuilt
//! into a forest on every read. This crate owns the record model, the tree
//! builder, the import merge, persistence, and the [`EngineRegistry`] that
//! serializes every mutation.
//!
//! # Modules
//!
//! - [`record`] - The persisted record and the default collection
//! - [`tree`] - Flat collection to forest, with cycle rejection
//! - [`merge`] - Reconciling imported records, with a decision policy
//! - [`transfer`] - Export and import JSON
//! - [`store`] - Revisioned persistence (file and in-memory)
//! - [`config`] - TOML configuration

pub mod config;
mod error;
pub mod merge;
pub mod record;
mod registry;
pub mod store;
pub mod transfer;
pub mod tree;

pub use config::{Config, ConfigError};
pub use error::{RegistryError, ValidationError};
pub use merge::{DecisionError, DecisionPolicy, MergeError, MergeReport};
pub use record::{DEFAULT_SELECTION_TOKEN, EngineRecord};
pub use registry::{
	ChangeCause, EngineRegistry, RegistryEvent, SkipReason, SubscriptionId, UpsertOutcome, UpsertStatus,
};
pub use store::{EngineStore, JsonFileStore, MemoryStore, Revision, Snapshot, StoreError};
pub use tree::{Forest, TreeError, TreeNode};

use std::sync::Arc;

use crate::store::Revision;

/// Which operation produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
	Seed,
	Upsert,
	Remove,
	Import,
}

/// Notification delivered to registry subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
	/// The collection was written and now sits at `revision`.
	Changed { revision: Revision, cause: ChangeCause },
}

/// Handle returned by [`super::EngineRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(super) u64);

pub(super) type Listener = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

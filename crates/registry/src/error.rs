use crate::merge::{DecisionError, MergeError};
use crate::store::StoreError;
use crate::transfer::FormatError;
use crate::tree::TreeError;

/// Record rejected before any store call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("id is required")]
	MissingId,
	#[error("display name is required")]
	MissingDisplayName,
}

/// Registry operation failure.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	#[error("invalid engine: {0}")]
	Validation(#[from] ValidationError),
	#[error("failed to import: {0}")]
	Format(#[from] FormatError),
	#[error("rejected: {0}")]
	Structure(#[from] TreeError),
	/// The policy could not answer; nothing was written.
	#[error("cancelled: {0}")]
	Decision(#[from] DecisionError),
	/// The collection kept changing underneath us.
	#[error("collection changed concurrently, gave up after {attempts} attempts")]
	StaleWrite { attempts: usize },
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error("failed to export: {0}")]
	Export(#[source] serde_json::Error),
}

impl From<MergeError> for RegistryError {
	fn from(err: MergeError) -> Self {
		match err {
			MergeError::Format(err) => Self::Format(err),
			MergeError::Structure(err) => Self::Structure(err),
			MergeError::Decision(err) => Self::Decision(err),
		}
	}
}

//! The selection menu derived from the engine collection.
//!
//! Records are laid out as a forest, given namespaced menu ids by
//! [`MenuIdAllocator`], and written to a host [`MenuSurface`] by
//! [`MenuSynchronizer`]. [`RebuildScheduler`] keeps the surface in step with
//! registry changes; [`dispatch`] turns a click back into a search URL.

mod alloc;
mod dispatch;
mod scheduler;
mod surface;
mod sync;

pub use alloc::{
	MANAGE_ID, MenuAllocation, MenuId, MenuIdAllocator, MenuParent, Namespace, ROOT_ID, SEPARATOR_ID,
};
pub use dispatch::{ClickAction, ClickEvent, Destination, DispatchError, dispatch, expand_query};
pub use scheduler::{RebuildScheduler, SchedulerStats};
pub use surface::{MenuItem, MenuItemKind, MenuSurface, RecordingSurface, SELECTION_CONTEXT, SurfaceError};
pub use sync::{MenuSynchronizer, RebuildReport, SyncError};

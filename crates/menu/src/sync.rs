//! Total menu rebuilds.
//!
//! # Role
//!
//! Replaces everything on a [`MenuSurface`] with the entries derived from a
//! record collection. There is no diffing: each rebuild clears the surface
//! and recreates the whole menu.
//!
//! # Invariants
//!
//! - `remove_all` completes before the first create.
//! - The root entry is created first; every other entry is created after its
//!   parent entry.
//! - A malformed collection leaves only the root entry on the surface.

use contextual_registry::config::MenuConfig;
use contextual_registry::{EngineRecord, TreeError, tree};

use crate::alloc::{MANAGE_ID, MenuIdAllocator, MenuParent, ROOT_ID, SEPARATOR_ID};
use crate::surface::{MenuItem, MenuItemKind, MenuSurface, SurfaceError};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
	#[error("menu surface rejected rebuild: {0}")]
	Surface(#[from] SurfaceError),
	#[error("engine collection is malformed: {0}")]
	Structure(#[from] TreeError),
}

/// Counts of entries created by one rebuild, root and trailer excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
	pub containers: usize,
	pub searches: usize,
}

impl RebuildReport {
	pub fn entries(&self) -> usize {
		self.containers + self.searches
	}
}

pub struct MenuSynchronizer<S> {
	surface: S,
	allocator: MenuIdAllocator,
	root_title: String,
	manage_title: Option<String>,
}

impl<S: MenuSurface> MenuSynchronizer<S> {
	pub fn new(surface: S, config: &MenuConfig) -> Self {
		Self {
			surface,
			allocator: MenuIdAllocator::new(config.surface_token.clone()),
			root_title: config.root_title.clone(),
			manage_title: config.show_manage_entry.then(|| config.manage_title.clone()),
		}
	}

	pub fn surface(&self) -> &S {
		&self.surface
	}

	pub fn allocator(&self) -> &MenuIdAllocator {
		&self.allocator
	}

	/// Clears the surface and recreates the menu for `records`.
	pub fn rebuild(&mut self, records: &[EngineRecord]) -> Result<RebuildReport, SyncError> {
		self.surface.remove_all()?;
		self.surface
			.create_item(&MenuItem::new(ROOT_ID, self.root_title.as_str(), None, MenuItemKind::Root))?;

		let forest = match tree::build(records) {
			Ok(forest) => forest,
			Err(err) => {
				tracing::warn!(error = %err, "menu.rebuild.malformed");
				return Err(err.into());
			}
		};

		let mut report = RebuildReport::default();
		// Menu ids of the current node's ancestors, indexed by depth.
		let mut path: Vec<String> = Vec::new();
		for step in forest.walk() {
			path.truncate(step.depth);
			let parent = match path.last() {
				Some(menu_id) => MenuParent::Entry(menu_id),
				None => MenuParent::Root,
			};
			let record = step.node.record();
			let alloc = self.allocator.allocate(record, parent);
			let kind = if record.is_container() {
				report.containers += 1;
				MenuItemKind::Container
			} else {
				report.searches += 1;
				MenuItemKind::Search
			};
			self.surface
				.create_item(&MenuItem::new(alloc.menu_id.as_str(), alloc.title, Some(alloc.parent_menu_id.as_str()), kind))?;
			path.push(alloc.menu_id);
		}

		if let Some(title) = &self.manage_title {
			self.surface
				.create_item(&MenuItem::new(SEPARATOR_ID, "", Some(ROOT_ID), MenuItemKind::Separator))?;
			self.surface
				.create_item(&MenuItem::new(MANAGE_ID, title.as_str(), Some(ROOT_ID), MenuItemKind::Manage))?;
		}

		tracing::debug!(containers = report.containers, searches = report.searches, "menu.rebuild");
		Ok(report)
	}
}

#[cfg(test)]
mod tests;

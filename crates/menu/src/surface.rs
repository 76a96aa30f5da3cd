//! Host menu surface.

use std::fmt::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

/// Context every entry is shown in.
pub const SELECTION_CONTEXT: &str = "selection";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItemKind {
	Root,
	Container,
	Search,
	Separator,
	Manage,
}

/// One entry handed to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
	pub id: String,
	pub title: String,
	/// `None` only for top-level entries of the host menu.
	pub parent_id: Option<String>,
	pub contexts: Vec<String>,
	pub kind: MenuItemKind,
}

impl MenuItem {
	pub fn new(id: impl Into<String>, title: impl Into<String>, parent_id: Option<&str>, kind: MenuItemKind) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			parent_id: parent_id.map(str::to_string),
			contexts: vec![SELECTION_CONTEXT.to_string()],
			kind,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
	#[error("menu item '{0}' already exists")]
	DuplicateId(String),
	#[error("menu item '{id}' references missing parent '{parent}'")]
	MissingParent { id: String, parent: String },
	#[error("menu surface unavailable: {0}")]
	Unavailable(String),
}

/// Item creation and removal primitives of the host menu.
///
/// A create returns only after the item exists, so children can reference it
/// right away.
pub trait MenuSurface: Send {
	fn remove_all(&mut self) -> Result<(), SurfaceError>;
	fn create_item(&mut self, item: &MenuItem) -> Result<(), SurfaceError>;
}

impl<S: MenuSurface + ?Sized> MenuSurface for Box<S> {
	fn remove_all(&mut self) -> Result<(), SurfaceError> {
		(**self).remove_all()
	}

	fn create_item(&mut self, item: &MenuItem) -> Result<(), SurfaceError> {
		(**self).create_item(item)
	}
}

#[derive(Debug, Default)]
struct Recorded {
	items: Vec<MenuItem>,
	ids: FxHashSet<String>,
	clears: usize,
}

/// In-memory surface with the host's ordering rules.
///
/// Clones share the same items, so one handle can be given to a synchronizer
/// and another kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
	inner: Arc<Mutex<Recorded>>,
}

impl RecordingSurface {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn items(&self) -> Vec<MenuItem> {
		self.inner.lock().items.clone()
	}

	pub fn ids(&self) -> Vec<String> {
		self.inner.lock().items.iter().map(|item| item.id.clone()).collect()
	}

	/// Number of `remove_all` calls so far.
	pub fn clears(&self) -> usize {
		self.inner.lock().clears
	}

	/// Indented outline of the current items.
	pub fn render(&self) -> String {
		let recorded = self.inner.lock();
		let mut depths: Vec<(&str, usize)> = Vec::with_capacity(recorded.items.len());
		let mut out = String::new();
		for item in &recorded.items {
			let depth = item
				.parent_id
				.as_deref()
				.and_then(|parent| depths.iter().rev().find(|(id, _)| *id == parent))
				.map_or(0, |(_, depth)| depth + 1);
			depths.push((item.id.as_str(), depth));
			let title = if item.kind == MenuItemKind::Separator { "----" } else { item.title.as_str() };
			let _ = writeln!(out, "{:indent$}{title}  [{}]", "", item.id, indent = depth * 2);
		}
		out
	}
}

impl MenuSurface for RecordingSurface {
	fn remove_all(&mut self) -> Result<(), SurfaceError> {
		let mut recorded = self.inner.lock();
		recorded.items.clear();
		recorded.ids.clear();
		recorded.clears += 1;
		Ok(())
	}

	fn create_item(&mut self, item: &MenuItem) -> Result<(), SurfaceError> {
		let mut recorded = self.inner.lock();
		if let Some(parent) = item.parent_id.as_deref()
			&& !recorded.ids.contains(parent)
		{
			return Err(SurfaceError::MissingParent {
				id: item.id.clone(),
				parent: parent.to_string(),
			});
		}
		if !recorded.ids.insert(item.id.clone()) {
			return Err(SurfaceError::DuplicateId(item.id.clone()));
		}
		recorded.items.push(item.clone());
		Ok(())
	}
}

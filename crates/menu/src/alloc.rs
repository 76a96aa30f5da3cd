//! Menu identifiers for engine records.
//!
//! # Role
//!
//! Maps each record to the id and title of its menu entry, and maps a clicked
//! id back to a record id without looking anything up.
//!
//! # Invariants
//!
//! - Containers and nested records use the custom namespace; top-level leaves
//!   use the direct namespace.
//! - The two namespaces and the reserved ids never overlap, so [`MenuId::parse`]
//!   classifies every id it produced.

use std::fmt;

use contextual_registry::EngineRecord;

/// Id of the synthetic root entry.
pub const ROOT_ID: &str = "contextual";
/// Id of the trailing "manage" entry.
pub const MANAGE_ID: &str = "contextual:manage";
/// Id of the separator before the manage entry.
pub const SEPARATOR_ID: &str = "contextual:separator";

const CUSTOM_PREFIX: &str = "custom:";
const DIRECT_PREFIX: &str = "engine:";

/// Record id namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
	/// Containers and anything nested under a resolved parent.
	Custom,
	/// Top-level leaves.
	Direct,
}

impl Namespace {
	pub fn prefix(self) -> &'static str {
		match self {
			Self::Custom => CUSTOM_PREFIX,
			Self::Direct => DIRECT_PREFIX,
		}
	}
}

/// A classified menu id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuId<'a> {
	Root,
	Manage,
	Separator,
	Direct(&'a str),
	Custom(&'a str),
}

impl<'a> MenuId<'a> {
	/// Classifies a surface id. Returns `None` for ids this crate never
	/// produces.
	pub fn parse(id: &'a str) -> Option<Self> {
		match id {
			ROOT_ID => return Some(Self::Root),
			MANAGE_ID => return Some(Self::Manage),
			SEPARATOR_ID => return Some(Self::Separator),
			_ => {}
		}
		if let Some(record_id) = id.strip_prefix(DIRECT_PREFIX) {
			return Some(Self::Direct(record_id));
		}
		id.strip_prefix(CUSTOM_PREFIX).map(Self::Custom)
	}

	pub fn record(namespace: Namespace, record_id: &'a str) -> Self {
		match namespace {
			Namespace::Custom => Self::Custom(record_id),
			Namespace::Direct => Self::Direct(record_id),
		}
	}

	/// Record id carried by a record entry.
	pub fn record_id(self) -> Option<&'a str> {
		match self {
			Self::Direct(id) | Self::Custom(id) => Some(id),
			Self::Root | Self::Manage | Self::Separator => None,
		}
	}
}

impl fmt::Display for MenuId<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Root => f.write_str(ROOT_ID),
			Self::Manage => f.write_str(MANAGE_ID),
			Self::Separator => f.write_str(SEPARATOR_ID),
			Self::Direct(id) => write!(f, "{DIRECT_PREFIX}{id}"),
			Self::Custom(id) => write!(f, "{CUSTOM_PREFIX}{id}"),
		}
	}
}

/// Where an entry is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuParent<'a> {
	/// Directly under the synthetic root.
	Root,
	/// Under the entry of a resolved parent record, by menu id.
	Entry(&'a str),
}

impl MenuParent<'_> {
	pub fn menu_id(&self) -> &str {
		match self {
			Self::Root => ROOT_ID,
			Self::Entry(id) => id,
		}
	}
}

/// Id and title assigned to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuAllocation {
	pub menu_id: String,
	pub title: String,
	pub parent_menu_id: String,
	pub namespace: Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuIdAllocator {
	surface_token: String,
}

impl MenuIdAllocator {
	/// `surface_token` is left in leaf titles for the surface to expand.
	pub fn new(surface_token: impl Into<String>) -> Self {
		Self {
			surface_token: surface_token.into(),
		}
	}

	pub fn namespace(record: &EngineRecord, parent: MenuParent<'_>) -> Namespace {
		if record.is_container() || matches!(parent, MenuParent::Entry(_)) {
			Namespace::Custom
		} else {
			Namespace::Direct
		}
	}

	pub fn allocate(&self, record: &EngineRecord, parent: MenuParent<'_>) -> MenuAllocation {
		let namespace = Self::namespace(record, parent);
		let title = if record.is_container() {
			record.display_name.clone()
		} else {
			format!("{}: {}", record.display_name, self.surface_token)
		};
		MenuAllocation {
			menu_id: MenuId::record(namespace, &record.id).to_string(),
			title,
			parent_menu_id: parent.menu_id().to_string(),
			namespace,
		}
	}
}

impl Default for MenuIdAllocator {
	fn default() -> Self {
		Self::new(contextual_registry::DEFAULT_SELECTION_TOKEN)
	}
}

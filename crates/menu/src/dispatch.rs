//! Click handling: menu id back to a search URL.

use contextual_registry::{EngineRegistry, RegistryError};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::alloc::MenuId;

/// Bytes escaped in a selection; everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const SELECTION: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'!')
	.remove(b'~')
	.remove(b'*')
	.remove(b'\'')
	.remove(b'(')
	.remove(b')');

/// A click reported by the menu surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
	pub menu_id: String,
	pub selection_text: String,
}

impl ClickEvent {
	pub fn new(menu_id: impl Into<String>, selection_text: impl Into<String>) -> Self {
		Self {
			menu_id: menu_id.into(),
			selection_text: selection_text.into(),
		}
	}
}

/// Where a search click leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
	pub record_id: String,
	pub url: String,
}

/// What the host should do for a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
	Search(Destination),
	/// The manage entry was clicked.
	Manage,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
	#[error("menu item '{0}' does not open a search")]
	NotARecord(String),
	#[error("no engine with id '{0}'")]
	UnknownRecord(String),
	#[error("engine '{0}' is a container")]
	Container(String),
	#[error(transparent)]
	Registry(#[from] RegistryError),
}

/// Replaces every `token` in `query_format` with the escaped selection.
///
/// An empty token matches nothing.
pub fn expand_query(query_format: &str, token: &str, selection: &str) -> String {
	if token.is_empty() {
		return query_format.to_string();
	}
	let encoded = utf8_percent_encode(selection, SELECTION).to_string();
	query_format.replace(token, &encoded)
}

/// Resolves a click against the registry's current collection.
pub fn dispatch(registry: &EngineRegistry, event: &ClickEvent) -> Result<ClickAction, DispatchError> {
	let record_id = match MenuId::parse(&event.menu_id) {
		Some(MenuId::Manage) => return Ok(ClickAction::Manage),
		Some(MenuId::Direct(id) | MenuId::Custom(id)) => id,
		Some(MenuId::Root | MenuId::Separator) | None => {
			return Err(DispatchError::NotARecord(event.menu_id.clone()));
		}
	};
	let record = registry
		.get(record_id)?
		.ok_or_else(|| DispatchError::UnknownRecord(record_id.to_string()))?;
	let Some(query_format) = record.query_format.as_deref() else {
		return Err(DispatchError::Container(record.id));
	};

	let url = expand_query(query_format, registry.selection_token(), &event.selection_text);
	tracing::debug!(record = %record.id, menu_id = %event.menu_id, "menu.click");
	Ok(ClickAction::Search(Destination { record_id: record.id, url }))
}

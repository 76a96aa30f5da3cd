//! The persisted search engine record.

use serde::{Deserialize, Serialize};

/// Default token marking where the selected text goes in a query template.
pub const DEFAULT_SELECTION_TOKEN: &str = "{sel}";

/// One entry of the engine collection.
///
/// A record with no `query_format` is a container: it only groups children and
/// is never searchable. A record whose `parent_id` names no known record is an
/// orphan and is laid out as a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRecord {
	pub id: String,
	pub display_name: String,
	#[serde(default)]
	pub query_format: Option<String>,
	#[serde(default)]
	pub parent_id: Option<String>,
}

impl EngineRecord {
	/// Creates a searchable top-level record.
	pub fn leaf(id: impl Into<String>, display_name: impl Into<String>, query_format: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			display_name: display_name.into(),
			query_format: Some(query_format.into()),
			parent_id: None,
		}
	}

	/// Creates a top-level container.
	pub fn container(id: impl Into<String>, display_name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			display_name: display_name.into(),
			query_format: None,
			parent_id: None,
		}
	}

	/// Synthetic container standing in for a referenced but missing parent.
	pub fn placeholder(id: &str) -> Self {
		Self::container(id, id)
	}

	/// Returns this record nested under `parent_id`.
	pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
		self.parent_id = Some(parent_id.into());
		self
	}

	pub fn is_container(&self) -> bool {
		self.query_format.is_none()
	}

	/// Trims the text fields and folds blank optional fields to `None`.
	///
	/// An empty query template turns the record into a container.
	pub fn normalized(self) -> Self {
		fn non_blank(value: Option<String>) -> Option<String> {
			value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
		}
		Self {
			id: self.id.trim().to_string(),
			display_name: self.display_name.trim().to_string(),
			query_format: non_blank(self.query_format),
			parent_id: non_blank(self.parent_id),
		}
	}
}

/// Collection written on first run when storage holds nothing.
pub fn default_records() -> Vec<EngineRecord> {
	vec![
		EngineRecord::leaf("google", "Google", "https://www.google.com/search?q={sel}"),
		EngineRecord::leaf("ddg", "DuckDuckGo", "https://duckduckgo.com/?q={sel}"),
		EngineRecord::container("reference", "Reference"),
		EngineRecord::leaf("wikipedia", "Wikipedia", "https://en.wikipedia.org/wiki/Special:Search?search={sel}").with_parent("reference"),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn serializes_with_camel_case_keys_and_nulls() {
		let record = EngineRecord::container("shopping", "Shopping");
		let json = serde_json::to_value(&record).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"id": "shopping",
				"displayName": "Shopping",
				"queryFormat": null,
				"parentId": null,
			})
		);
	}

	#[test]
	fn missing_optional_fields_default_to_none() {
		let record: EngineRecord = serde_json::from_str(r#"{"id":"a","displayName":"A"}"#).unwrap();
		assert!(record.is_container());
		assert_eq!(record.parent_id, None);
	}

	#[test]
	fn normalized_folds_blank_query_to_container() {
		let record = EngineRecord {
			id: "  x ".into(),
			display_name: " X ".into(),
			query_format: Some("   ".into()),
			parent_id: Some("".into()),
		}
		.normalized();
		assert_eq!(record, EngineRecord::container("x", "X"));
	}

	#[test]
	fn default_set_has_two_leaves_a_container_and_a_nested_leaf() {
		let records = default_records();
		let roots: Vec<_> = records.iter().filter(|r| r.parent_id.is_none()).collect();
		assert_eq!(roots.iter().filter(|r| !r.is_container()).count(), 2);
		assert_eq!(roots.iter().filter(|r| r.is_container()).count(), 1);
		let nested: Vec<_> = records.iter().filter(|r| r.parent_id.is_some()).collect();
		assert_eq!(nested.len(), 1);
		assert!(!nested[0].is_container());
	}
}

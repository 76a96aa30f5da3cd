//! Export and import payloads.
//!
//! The transport is a JSON array of records. Import validates the whole
//! payload before anything is merged.

use serde::Deserialize;
use serde_json::Value;

use crate::record::EngineRecord;

/// File name offered for exports.
pub const EXPORT_FILE_NAME: &str = "contextualSearchEngines.json";

/// Import payload rejected before any mutation.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
	#[error("import is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
	#[error("invalid format: expected an array")]
	NotArray,
	#[error("entry {index} is not an engine record: {reason}")]
	InvalidRecord { index: usize, reason: String },
}

/// Serializes the collection as a pretty-printed JSON array.
pub fn export_json(records: &[EngineRecord]) -> Result<String, serde_json::Error> {
	serde_json::to_string_pretty(records)
}

/// Parses raw import text into a JSON value.
pub fn parse_json(text: &str) -> Result<Value, FormatError> {
	Ok(serde_json::from_str(text)?)
}

/// Extracts normalized merge candidates from an import payload.
pub fn candidates(payload: &Value) -> Result<Vec<EngineRecord>, FormatError> {
	let Value::Array(items) = payload else {
		return Err(FormatError::NotArray);
	};

	items
		.iter()
		.enumerate()
		.map(|(index, item)| {
			let record = EngineRecord::deserialize(item)
				.map_err(|err| FormatError::InvalidRecord {
					index,
					reason: err.to_string(),
				})?
				.normalized();
			if record.id.is_empty() {
				return Err(FormatError::InvalidRecord {
					index,
					reason: "empty id".into(),
				});
			}
			if record.display_name.is_empty() {
				return Err(FormatError::InvalidRecord {
					index,
					reason: "empty displayName".into(),
				});
			}
			Ok(record)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn export_is_a_pretty_array() {
		let text = export_json(&[EngineRecord::container("a", "A")]).unwrap();
		assert!(text.starts_with("[\n"));
		assert!(text.contains("\"displayName\": \"A\""));
	}

	#[test]
	fn object_payload_is_not_an_array() {
		let err = candidates(&json!({"id": "a"})).unwrap_err();
		assert!(matches!(err, FormatError::NotArray));
	}

	#[test]
	fn malformed_text_is_a_json_error() {
		assert!(matches!(parse_json("[{"), Err(FormatError::Json(_))));
	}

	#[test]
	fn element_without_display_name_is_rejected_with_its_index() {
		let payload = json!([
			{"id": "ok", "displayName": "Ok"},
			{"id": "broken"},
		]);
		let err = candidates(&payload).unwrap_err();
		assert!(matches!(err, FormatError::InvalidRecord { index: 1, .. }), "{err}");
	}

	#[test]
	fn blank_id_is_rejected() {
		let payload = json!([{"id": "  ", "displayName": "Blank"}]);
		assert!(matches!(candidates(&payload), Err(FormatError::InvalidRecord { index: 0, .. })));
	}

	#[test]
	fn candidates_are_normalized() {
		let payload = json!([{"id": " a ", "displayName": "A", "queryFormat": "", "parentId": null}]);
		assert_eq!(candidates(&payload).unwrap(), [EngineRecord::container("a", "A")]);
	}
}

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

fn ddg() -> EngineRecord {
	EngineRecord::leaf("ddg", "DuckDuckGo", "https://duckduckgo.com/?q={sel}")
}

fn current() -> Vec<EngineRecord> {
	vec![
		EngineRecord::leaf("google", "Google", "https://google.com/?q={sel}"),
		ddg(),
		EngineRecord::container("shopping", "Shopping"),
	]
}

#[test]
fn non_array_payload_is_a_format_error() {
	let err = merge(&current(), &json!({"id": "a"}), &mut AlwaysOverwrite).unwrap_err();
	assert!(matches!(err, MergeError::Format(FormatError::NotArray)));
}

#[test]
fn one_bad_element_rejects_the_whole_batch_before_any_question() {
	let payload = json!([
		{"id": "ddg", "displayName": "Dup"},
		{"displayName": "no id"},
	]);
	let mut policy = Scripted::new([true]);
	let err = merge(&current(), &payload, &mut policy).unwrap_err();
	assert!(matches!(err, MergeError::Format(FormatError::InvalidRecord { index: 1, .. })));
	assert!(policy.asked().is_empty());
}

#[test]
fn new_records_are_appended_in_order() {
	let payload = json!([
		{"id": "bing", "displayName": "Bing", "queryFormat": "https://bing.com/?q={sel}"},
		{"id": "amazon", "displayName": "Amazon", "queryFormat": "https://x/?q={sel}", "parentId": "shopping"},
	]);
	let outcome = merge(&current(), &payload, &mut AlwaysSkip).unwrap();
	let ids: Vec<_> = outcome.records.iter().map(|r| r.id.as_str()).collect();
	assert_eq!(ids, ["google", "ddg", "shopping", "bing", "amazon"]);
	assert_eq!(outcome.report.added, ["bing", "amazon"]);
	assert!(outcome.report.changed());
}

#[test]
fn always_overwrite_replaces_duplicate_in_place() {
	let payload = json!([{"id": "ddg", "displayName": "Duck", "queryFormat": "https://ddg.gg/?q={sel}"}]);
	let outcome = merge(&current(), &payload, &mut AlwaysOverwrite).unwrap();

	assert_eq!(outcome.records.len(), 3);
	assert_eq!(outcome.records[1], EngineRecord::leaf("ddg", "Duck", "https://ddg.gg/?q={sel}"));
	assert_eq!(outcome.report.overwritten, ["ddg"]);
}

#[test]
fn always_skip_leaves_existing_record_untouched() {
	let payload = json!([{"id": "ddg", "displayName": "Duck", "queryFormat": "https://ddg.gg/?q={sel}"}]);
	let outcome = merge(&current(), &payload, &mut AlwaysSkip).unwrap();

	assert_eq!(outcome.records, current());
	assert_eq!(outcome.report.skipped_duplicates, ["ddg"]);
	assert!(!outcome.report.changed());
}

#[test]
fn missing_parent_gets_placeholder_before_child() {
	let payload = json!([{"id": "a", "displayName": "A", "queryFormat": "q={sel}", "parentId": "missing"}]);
	let outcome = merge(&[], &payload, &mut AlwaysOverwrite).unwrap();

	assert_eq!(
		outcome.records,
		[
			EngineRecord::placeholder("missing"),
			EngineRecord::leaf("a", "A", "q={sel}").with_parent("missing"),
		]
	);
	assert_eq!(outcome.report.placeholders, ["missing"]);

	let forest = crate::tree::build(&outcome.records).unwrap();
	assert_eq!(forest.roots().len(), 1);
	assert_eq!(forest.roots()[0].children()[0].record().id, "a");
}

#[test]
fn declined_placeholder_skips_the_candidate() {
	let payload = json!([{"id": "a", "displayName": "A", "queryFormat": "q={sel}", "parentId": "missing"}]);
	let mut policy = Scripted::new([false]);
	let outcome = merge(&current(), &payload, &mut policy).unwrap();

	assert_eq!(outcome.records, current());
	assert_eq!(outcome.report.skipped_orphans, ["a"]);
	assert_eq!(policy.asked(), [Prompt::Placeholder("missing".into())]);
}

#[test]
fn parent_merged_earlier_in_the_batch_resolves() {
	let payload = json!([
		{"id": "news", "displayName": "News"},
		{"id": "hn", "displayName": "HN", "queryFormat": "https://hn.algolia.com/?q={sel}", "parentId": "news"},
	]);
	let mut policy = Scripted::new([]);
	let outcome = merge(&[], &payload, &mut policy).unwrap();
	assert_eq!(outcome.records.len(), 2);
	assert!(policy.asked().is_empty());
}

#[test]
fn scripted_answers_are_consumed_in_question_order() {
	let payload = json!([
		{"id": "google", "displayName": "G2", "queryFormat": "g2={sel}"},
		{"id": "x", "displayName": "X", "queryFormat": "x={sel}", "parentId": "gone"},
		{"id": "ddg", "displayName": "D2", "queryFormat": "d2={sel}"},
	]);
	let mut policy = Scripted::new([false, true, true]);
	let outcome = merge(&current(), &payload, &mut policy).unwrap();

	assert_eq!(
		policy.asked(),
		[
			Prompt::Overwrite("google".into()),
			Prompt::Placeholder("gone".into()),
			Prompt::Overwrite("ddg".into()),
		]
	);
	assert_eq!(outcome.records[0].display_name, "Google");
	assert_eq!(outcome.records[1].display_name, "D2");
	let ids: Vec<_> = outcome.records.iter().map(|r| r.id.as_str()).collect();
	assert_eq!(ids, ["google", "ddg", "shopping", "gone", "x"]);
}

#[test]
fn placeholder_later_claimed_by_real_record_asks_to_overwrite() {
	let payload = json!([
		{"id": "kid", "displayName": "Kid", "queryFormat": "k={sel}", "parentId": "box"},
		{"id": "box", "displayName": "Real Box"},
	]);
	let outcome = merge(&[], &payload, &mut AlwaysOverwrite).unwrap();
	assert_eq!(outcome.records[0], EngineRecord::container("box", "Real Box"));
	assert_eq!(outcome.report.placeholders, ["box"]);
	assert_eq!(outcome.report.overwritten, ["box"]);
}

#[test]
fn merge_producing_a_cycle_fails() {
	let existing = vec![EngineRecord::container("a", "A").with_parent("b")];
	let payload = json!([{"id": "b", "displayName": "B", "parentId": "a"}]);
	let err = merge(&existing, &payload, &mut AlwaysOverwrite).unwrap_err();
	assert!(matches!(err, MergeError::Structure(TreeError::Cycle { .. })));
}

#[test]
fn remembered_answers_replay_by_occurrence_after_rewind() {
	let payload = json!([
		{"id": "a", "displayName": "A", "parentId": "gap"},
		{"id": "b", "displayName": "B", "parentId": "gap"},
	]);
	let mut script = Scripted::new([false, true]);
	let mut remembered = Remembered::new(&mut script);

	let first = merge(&[], &payload, &mut remembered).unwrap();
	remembered.rewind();
	let second = merge(&[], &payload, &mut remembered).unwrap();
	drop(remembered);

	assert_eq!(first, second);
	assert_eq!(first.report.skipped_orphans, ["a"]);
	assert_eq!(first.report.placeholders, ["gap"]);
	assert_eq!(script.asked(), &[Prompt::Placeholder("gap".into()), Prompt::Placeholder("gap".into())]);
}

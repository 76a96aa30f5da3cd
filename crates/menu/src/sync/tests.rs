use contextual_registry::record::default_records;
use pretty_assertions::assert_eq;

use super::*;
use crate::surface::RecordingSurface;

fn synchronizer(config: &MenuConfig) -> (RecordingSurface, MenuSynchronizer<RecordingSurface>) {
	let surface = RecordingSurface::new();
	(surface.clone(), MenuSynchronizer::new(surface, config))
}

fn without_manage() -> MenuConfig {
	MenuConfig {
		show_manage_entry: false,
		..MenuConfig::default()
	}
}

fn rows(surface: &RecordingSurface) -> Vec<(String, String, Option<String>)> {
	surface
		.items()
		.into_iter()
		.map(|item| (item.id, item.title, item.parent_id))
		.collect()
}

fn row(id: &str, title: &str, parent: Option<&str>) -> (String, String, Option<String>) {
	(id.into(), title.into(), parent.map(Into::into))
}

#[test]
fn container_with_nested_leaf() {
	let (surface, mut sync) = synchronizer(&without_manage());
	let records = vec![
		EngineRecord::container("shopping", "Shopping"),
		EngineRecord::leaf("amazon", "Amazon", "https://x/?q={sel}").with_parent("shopping"),
	];

	let report = sync.rebuild(&records).unwrap();
	assert_eq!(report, RebuildReport { containers: 1, searches: 1 });
	assert_eq!(
		rows(&surface),
		vec![
			row("contextual", "Contextual", None),
			row("custom:shopping", "Shopping", Some("contextual")),
			row("custom:amazon", "Amazon: {sel}", Some("custom:shopping")),
		]
	);
}

#[test]
fn top_level_leaf_hangs_off_root() {
	let (surface, mut sync) = synchronizer(&without_manage());
	let records = vec![EngineRecord::leaf("ddg", "DuckDuckGo", "https://duckduckgo.com/?q={sel}")];

	sync.rebuild(&records).unwrap();
	assert_eq!(
		rows(&surface),
		vec![
			row("contextual", "Contextual", None),
			row("engine:ddg", "DuckDuckGo: {sel}", Some("contextual")),
		]
	);
}

#[test]
fn manage_entry_follows_all_record_entries() {
	let (surface, mut sync) = synchronizer(&MenuConfig::default());
	sync.rebuild(&default_records()).unwrap();

	let items = surface.items();
	let kinds: Vec<_> = items.iter().map(|item| item.kind).collect();
	assert_eq!(
		kinds,
		vec![
			MenuItemKind::Root,
			MenuItemKind::Search,
			MenuItemKind::Search,
			MenuItemKind::Container,
			MenuItemKind::Search,
			MenuItemKind::Separator,
			MenuItemKind::Manage,
		]
	);
	let manage = items.last().unwrap();
	assert_eq!(manage.id, "contextual:manage");
	assert_eq!(manage.title, "Manage search engines");
	assert_eq!(manage.parent_id.as_deref(), Some("contextual"));
}

#[test]
fn rebuild_is_idempotent() {
	let (surface, mut sync) = synchronizer(&MenuConfig::default());
	sync.rebuild(&default_records()).unwrap();
	let first = surface.items();
	sync.rebuild(&default_records()).unwrap();
	assert_eq!(surface.items(), first);
	assert_eq!(surface.clears(), 2);
}

#[test]
fn children_of_a_leaf_attach_to_its_entry() {
	let (surface, mut sync) = synchronizer(&without_manage());
	let records = vec![
		EngineRecord::leaf("g", "Google", "https://g/?q={sel}"),
		EngineRecord::leaf("gi", "Images", "https://g/img?q={sel}").with_parent("g"),
	];
	sync.rebuild(&records).unwrap();
	assert_eq!(
		rows(&surface)[2],
		row("custom:gi", "Images: {sel}", Some("engine:g"))
	);
}

#[test]
fn deep_siblings_resume_under_the_right_parent() {
	let (surface, mut sync) = synchronizer(&without_manage());
	let records = vec![
		EngineRecord::container("a", "A"),
		EngineRecord::container("b", "B").with_parent("a"),
		EngineRecord::leaf("c", "C", "https://c/{sel}").with_parent("b"),
		EngineRecord::leaf("d", "D", "https://d/{sel}").with_parent("a"),
		EngineRecord::leaf("e", "E", "https://e/{sel}"),
	];
	sync.rebuild(&records).unwrap();
	let parents: Vec<_> = surface.items().into_iter().map(|item| (item.id, item.parent_id)).collect();
	assert_eq!(
		parents,
		vec![
			("contextual".to_string(), None),
			("custom:a".to_string(), Some("contextual".to_string())),
			("custom:b".to_string(), Some("custom:a".to_string())),
			("custom:c".to_string(), Some("custom:b".to_string())),
			("custom:d".to_string(), Some("custom:a".to_string())),
			("engine:e".to_string(), Some("contextual".to_string())),
		]
	);
}

#[test]
fn cycle_leaves_only_the_root() {
	let (surface, mut sync) = synchronizer(&MenuConfig::default());
	sync.rebuild(&default_records()).unwrap();

	let looped = vec![
		EngineRecord::container("x", "X").with_parent("y"),
		EngineRecord::container("y", "Y").with_parent("x"),
	];
	let err = sync.rebuild(&looped).unwrap_err();
	assert!(matches!(err, SyncError::Structure(TreeError::Cycle { .. })));
	assert_eq!(surface.ids(), vec!["contextual".to_string()]);
}

/// Fails the `fail_at`-th create call, counting from one.
struct FailingSurface {
	inner: RecordingSurface,
	creates: usize,
	fail_at: usize,
}

impl MenuSurface for FailingSurface {
	fn remove_all(&mut self) -> Result<(), SurfaceError> {
		self.inner.remove_all()
	}

	fn create_item(&mut self, item: &MenuItem) -> Result<(), SurfaceError> {
		self.creates += 1;
		if self.creates == self.fail_at {
			return Err(SurfaceError::Unavailable("host busy".into()));
		}
		self.inner.create_item(item)
	}
}

#[test]
fn surface_failure_aborts_and_next_rebuild_starts_clean() {
	let recording = RecordingSurface::new();
	let failing = FailingSurface {
		inner: recording.clone(),
		creates: 0,
		fail_at: 3,
	};
	let mut sync = MenuSynchronizer::new(failing, &MenuConfig::default());

	let err = sync.rebuild(&default_records()).unwrap_err();
	assert!(matches!(err, SyncError::Surface(SurfaceError::Unavailable(_))));
	assert_eq!(recording.items().len(), 2);

	sync.rebuild(&default_records()).unwrap();
	assert_eq!(recording.items().len(), 7);
}

#[test]
fn duplicate_ids_are_reported_by_the_surface() {
	let (_, mut sync) = synchronizer(&without_manage());
	let records = vec![EngineRecord::container("a", "A"), EngineRecord::container("a", "Again")];
	let err = sync.rebuild(&records).unwrap_err();
	assert!(matches!(err, SyncError::Surface(SurfaceError::DuplicateId(id)) if id == "custom:a"));
}

use std::sync::Arc;

use clap::Parser;
use contextual_registry::{Config, EngineRegistry, MemoryStore};
use pretty_assertions::assert_eq;

use crate::cli::{Cli, Command, answer};
use crate::commands::App;

fn seeded_app() -> App {
	let registry = Arc::new(EngineRegistry::with_store(Arc::new(MemoryStore::new())));
	registry.seed_defaults_if_empty().unwrap();
	App::new(registry, Config::default())
}

fn empty_app() -> App {
	App::new(
		Arc::new(EngineRegistry::with_store(Arc::new(MemoryStore::new()))),
		Config::default(),
	)
}

fn command(args: &[&str]) -> Command {
	let argv = std::iter::once("contextual").chain(args.iter().copied());
	Cli::try_parse_from(argv).unwrap().command
}

async fn run(app: &App, args: &[&str]) -> anyhow::Result<String> {
	let mut out = Vec::new();
	app.run(command(args), &mut out).await?;
	Ok(String::from_utf8(out).unwrap())
}

#[test]
fn flag_pairs_fold_into_answers() {
	assert_eq!(answer(true, false), Some(true));
	assert_eq!(answer(false, true), Some(false));
	assert_eq!(answer(false, false), None);
}

#[test]
fn conflicting_flags_are_rejected() {
	assert!(Cli::try_parse_from(["contextual", "add", "--id", "a", "--name", "A", "--yes", "--no"]).is_err());
	assert!(Cli::try_parse_from(["contextual", "import", "f.json", "--overwrite", "--skip"]).is_err());
	assert!(Cli::try_parse_from(["contextual", "import", "f.json", "--placeholders", "--no-placeholders"]).is_err());
}

#[test]
fn global_options_parse_after_subcommand() {
	let cli = Cli::try_parse_from(["contextual", "list", "-v", "--store", "/tmp/e.json"]).unwrap();
	assert!(cli.verbose);
	assert_eq!(cli.store.as_deref(), Some(std::path::Path::new("/tmp/e.json")));
	assert_eq!(cli.command, Command::List);
}

#[tokio::test]
async fn list_prints_storage_order() {
	let out = run(&seeded_app(), &["list"]).await.unwrap();
	assert_eq!(
		out,
		"Google (google): https://www.google.com/search?q={sel}\n\
		 DuckDuckGo (ddg): https://duckduckgo.com/?q={sel}\n\
		 Reference (reference)/\n\
		 Wikipedia (wikipedia): https://en.wikipedia.org/wiki/Special:Search?search={sel} [in reference]\n"
	);
}

#[tokio::test]
async fn tree_indents_children() {
	let out = run(&seeded_app(), &["tree"]).await.unwrap();
	assert_eq!(
		out,
		"Google (google)\nDuckDuckGo (ddg)\nReference/ (reference)\n  Wikipedia (wikipedia)\n"
	);
}

#[tokio::test]
async fn add_under_missing_parent_creates_folder_first() {
	let app = empty_app();
	let out = run(
		&app,
		&["add", "--id", "amazon", "--name", "Amazon", "--query", "https://amazon.com/s?k={sel}", "--parent", "shopping", "--yes"],
	)
	.await
	.unwrap();
	assert_eq!(out, "created folder shopping\nadded amazon\n");

	let tree = run(&app, &["tree"]).await.unwrap();
	assert_eq!(tree, "shopping/ (shopping)\n  Amazon (amazon)\n");
}

#[tokio::test]
async fn add_duplicate_with_no_is_skipped() {
	let out = run(&seeded_app(), &["add", "--id", "ddg", "--name", "Duck", "--no"])
		.await
		.unwrap();
	assert_eq!(out, "skipped ddg: id already exists\n");
}

#[tokio::test]
async fn add_with_blank_name_fails() {
	let err = run(&empty_app(), &["add", "--id", "x", "--name", "  ", "--yes"]).await.unwrap_err();
	assert!(err.to_string().contains("display name is required"));
}

#[tokio::test]
async fn remove_unknown_id_is_an_error() {
	let app = seeded_app();
	assert_eq!(run(&app, &["remove", "google"]).await.unwrap(), "removed google\n");
	assert!(run(&app, &["remove", "google"]).await.is_err());
}

#[tokio::test]
async fn export_to_directory_then_import_elsewhere() {
	let dir = tempfile::tempdir().unwrap();
	let dir_arg = dir.path().to_str().unwrap();
	let out = run(&seeded_app(), &["export", "--output", dir_arg]).await.unwrap();
	let file = dir.path().join("contextualSearchEngines.json");
	assert_eq!(out, format!("exported to {}\n", file.display()));

	let target = empty_app();
	let out = run(&target, &["import", file.to_str().unwrap(), "--skip", "--no-placeholders"])
		.await
		.unwrap();
	assert_eq!(out, "added: google, ddg, reference, wikipedia\n");

	let again = run(&target, &["import", file.to_str().unwrap(), "--skip"]).await.unwrap();
	assert_eq!(again, "kept existing: google, ddg, reference, wikipedia\nnothing changed\n");
}

#[tokio::test]
async fn import_rejects_non_array() {
	let dir = tempfile::tempdir().unwrap();
	let file = dir.path().join("bad.json");
	std::fs::write(&file, r#"{"id": "x"}"#).unwrap();
	let app = seeded_app();
	let err = run(&app, &["import", file.to_str().unwrap(), "--overwrite"]).await.unwrap_err();
	assert!(err.to_string().contains("array"), "{err}");
	assert_eq!(run(&app, &["list"]).await.unwrap().lines().count(), 4);
}

#[tokio::test]
async fn menu_prints_rendered_surface() {
	let out = run(&seeded_app(), &["menu"]).await.unwrap();
	assert_eq!(
		out,
		"Contextual  [contextual]\n\
		 \x20 Google: {sel}  [engine:google]\n\
		 \x20 DuckDuckGo: {sel}  [engine:ddg]\n\
		 \x20 Reference  [custom:reference]\n\
		 \x20   Wikipedia: {sel}  [custom:wikipedia]\n\
		 \x20 ----  [contextual:separator]\n\
		 \x20 Manage search engines  [contextual:manage]\n"
	);
}

#[tokio::test]
async fn open_resolves_click_to_url() {
	let app = seeded_app();
	assert_eq!(
		run(&app, &["open", "engine:ddg", "cats"]).await.unwrap(),
		"https://duckduckgo.com/?q=cats\n"
	);
	assert!(run(&app, &["open", "custom:reference", "cats"]).await.is_err());
}

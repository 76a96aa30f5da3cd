use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use contextual_menu::{ClickAction, ClickEvent, MenuSynchronizer, RebuildScheduler, RecordingSurface};
use contextual_registry::transfer::EXPORT_FILE_NAME;
use contextual_registry::{Config, EngineRecord, EngineRegistry, MergeReport, SkipReason, UpsertStatus, tree};

use crate::cli::{AddArgs, Command, ImportArgs, answer};
use crate::prompt::PromptPolicy;

/// Executes commands against one registry.
pub struct App {
	registry: Arc<EngineRegistry>,
	config: Config,
}

impl App {
	pub fn new(registry: Arc<EngineRegistry>, config: Config) -> Self {
		Self { registry, config }
	}

	pub async fn run(&self, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
		match command {
			Command::List => self.list(out),
			Command::Tree => self.tree(out),
			Command::Add(args) => self.add(args, out),
			Command::Remove { id } => self.remove(&id, out),
			Command::Export { output } => self.export(output.as_deref(), out),
			Command::Import(args) => self.import(args, out),
			Command::Menu => self.menu(out).await,
			Command::Open { menu_id, selection } => self.open(menu_id, selection, out),
		}
	}

	fn list(&self, out: &mut impl Write) -> anyhow::Result<()> {
		for record in self.registry.records()? {
			writeln!(out, "{}", describe(&record))?;
		}
		Ok(())
	}

	fn tree(&self, out: &mut impl Write) -> anyhow::Result<()> {
		let records = self.registry.records()?;
		let forest = tree::build(&records)?;
		for step in forest.walk() {
			let record = step.node.record();
			let marker = if record.is_container() { "/" } else { "" };
			writeln!(
				out,
				"{:indent$}{}{marker} ({})",
				"",
				record.display_name,
				record.id,
				indent = step.depth * 2
			)?;
		}
		Ok(())
	}

	fn add(&self, args: AddArgs, out: &mut impl Write) -> anyhow::Result<()> {
		let fixed = answer(args.yes, args.no);
		let mut policy = PromptPolicy::new(fixed, fixed);
		let record = EngineRecord {
			id: args.id,
			display_name: args.name,
			query_format: args.query,
			parent_id: args.parent,
		};
		let outcome = self.registry.upsert(record.clone(), &mut policy)?;

		if let Some(parent) = &outcome.placeholder {
			writeln!(out, "created folder {parent}")?;
		}
		let id = record.id.trim();
		match outcome.status {
			UpsertStatus::Inserted => writeln!(out, "added {id}")?,
			UpsertStatus::Replaced => writeln!(out, "replaced {id}")?,
			UpsertStatus::Skipped(reason) => writeln!(out, "skipped {id}: {}", skip_reason(reason))?,
		}
		Ok(())
	}

	fn remove(&self, id: &str, out: &mut impl Write) -> anyhow::Result<()> {
		if !self.registry.remove(id)? {
			bail!("no engine with id '{id}'");
		}
		writeln!(out, "removed {id}")?;
		Ok(())
	}

	fn export(&self, output: Option<&Path>, out: &mut impl Write) -> anyhow::Result<()> {
		let json = self.registry.export_json()?;
		let Some(output) = output else {
			writeln!(out, "{json}")?;
			return Ok(());
		};
		let path = if output.is_dir() {
			output.join(EXPORT_FILE_NAME)
		} else {
			output.to_path_buf()
		};
		std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
		writeln!(out, "exported to {}", path.display())?;
		Ok(())
	}

	fn import(&self, args: ImportArgs, out: &mut impl Write) -> anyhow::Result<()> {
		let text = std::fs::read_to_string(&args.file)
			.with_context(|| format!("failed to read {}", args.file.display()))?;
		let mut policy = PromptPolicy::new(
			answer(args.overwrite, args.skip),
			answer(args.placeholders, args.no_placeholders),
		);
		let report = self.registry.import_json(&text, &mut policy)?;
		write_report(&report, out)
	}

	async fn menu(&self, out: &mut impl Write) -> anyhow::Result<()> {
		let surface = RecordingSurface::new();
		let synchronizer = MenuSynchronizer::new(surface.clone(), &self.config.menu);
		let scheduler = RebuildScheduler::start(Arc::clone(&self.registry), synchronizer);
		let stats = scheduler.shutdown().await;
		if stats.last_rendered.is_none() {
			bail!("menu rebuild failed");
		}
		write!(out, "{}", surface.render())?;
		Ok(())
	}

	fn open(&self, menu_id: String, selection: String, out: &mut impl Write) -> anyhow::Result<()> {
		match contextual_menu::dispatch(&self.registry, &ClickEvent::new(menu_id, selection))? {
			ClickAction::Search(destination) => writeln!(out, "{}", destination.url)?,
			ClickAction::Manage => writeln!(out, "manage engines with `contextual list`, `add`, `remove` and `import`")?,
		}
		Ok(())
	}
}

fn describe(record: &EngineRecord) -> String {
	let mut line = match &record.query_format {
		Some(query) => format!("{} ({}): {query}", record.display_name, record.id),
		None => format!("{} ({})/", record.display_name, record.id),
	};
	if let Some(parent) = &record.parent_id {
		line.push_str(&format!(" [in {parent}]"));
	}
	line
}

fn skip_reason(reason: SkipReason) -> &'static str {
	match reason {
		SkipReason::Duplicate => "id already exists",
		SkipReason::MissingParent => "parent folder is missing",
	}
}

fn write_report(report: &MergeReport, out: &mut impl Write) -> anyhow::Result<()> {
	let groups = [
		("added", &report.added),
		("overwritten", &report.overwritten),
		("created folders", &report.placeholders),
		("kept existing", &report.skipped_duplicates),
		("skipped, parent missing", &report.skipped_orphans),
	];
	for (label, ids) in groups {
		if !ids.is_empty() {
			writeln!(out, "{label}: {}", ids.join(", "))?;
		}
	}
	if !report.changed() {
		writeln!(out, "nothing changed")?;
	}
	Ok(())
}

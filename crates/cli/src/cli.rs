use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "contextual")]
#[command(about = "Manage contextual search engines and their selection menu")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Config file (defaults to the platform config directory)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Engine collection file, overriding the configured one
	#[arg(long, value_name = "PATH", global = true)]
	pub store: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
	/// List engines in storage order
	List,
	/// Show engines as a tree
	Tree,
	/// Add or replace an engine
	Add(AddArgs),
	/// Remove an engine; its children stay and surface at the top level
	Remove {
		/// Engine id.
		id: String,
	},
	/// Export all engines as JSON
	Export {
		/// Output file or directory (stdout if omitted)
		#[arg(long, short = 'o', value_name = "PATH")]
		output: Option<PathBuf>,
	},
	/// Merge engines from an exported JSON file
	Import(ImportArgs),
	/// Rebuild the selection menu and print it
	Menu,
	/// Resolve a menu click to its search URL
	Open {
		/// Clicked menu id, e.g. `engine:ddg`.
		menu_id: String,
		/// Selected text.
		selection: String,
	},
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct AddArgs {
	/// Engine id
	#[arg(long)]
	pub id: String,

	/// Display name
	#[arg(long)]
	pub name: String,

	/// Query template; omit to create a folder
	#[arg(long, value_name = "TEMPLATE")]
	pub query: Option<String>,

	/// Parent folder id
	#[arg(long)]
	pub parent: Option<String>,

	/// Answer yes to every question
	#[arg(long, conflicts_with = "no")]
	pub yes: bool,

	/// Answer no to every question
	#[arg(long)]
	pub no: bool,
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct ImportArgs {
	/// File written by `export`
	pub file: PathBuf,

	/// Replace engines whose id already exists
	#[arg(long, conflicts_with = "skip")]
	pub overwrite: bool,

	/// Keep engines whose id already exists
	#[arg(long)]
	pub skip: bool,

	/// Create missing parent folders
	#[arg(long, conflicts_with = "no_placeholders")]
	pub placeholders: bool,

	/// Skip engines whose parent folder is missing
	#[arg(long)]
	pub no_placeholders: bool,
}

/// Folds a `--flag`/`--no-flag` pair into a fixed answer, if one was given.
pub fn answer(yes: bool, no: bool) -> Option<bool> {
	match (yes, no) {
		(true, _) => Some(true),
		(_, true) => Some(false),
		_ => None,
	}
}

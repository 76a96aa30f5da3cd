//! `contextual` binary.
//!
//! Manages the engine collection on disk and previews the selection menu
//! derived from it.

mod cli;
mod commands;
mod prompt;
#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use commands::App;
use contextual_registry::{Config, EngineRegistry, JsonFileStore};

/// Env var holding a `tracing` filter directive.
const LOG_ENV: &str = "CONTEXTUAL_LOG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let config = load_config(cli.config.as_deref())?;
	let path = cli.store.clone().unwrap_or_else(|| config.storage.resolved_path());
	tracing::debug!(path = %path.display(), "cli.store");

	let registry = Arc::new(EngineRegistry::new(Arc::new(JsonFileStore::new(path)), &config));
	if registry.seed_defaults_if_empty()? {
		tracing::info!("cli.seeded_defaults");
	}

	App::new(registry, config).run(cli.command, &mut std::io::stdout()).await
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
	match path {
		Some(path) => Config::load(path).with_context(|| format!("failed to load config {}", path.display())),
		None => Ok(Config::load_default()?),
	}
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("debug")
		} else {
			EnvFilter::new("warn")
		}
	});
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

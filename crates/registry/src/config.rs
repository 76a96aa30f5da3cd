//! Configuration.
//!
//! Read from TOML. Every section and field is optional; anything missing takes
//! its default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::record::DEFAULT_SELECTION_TOKEN;

const APP_DIR: &str = "contextual";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("invalid config: `{field}` {reason}")]
	Invalid { field: &'static str, reason: &'static str },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub storage: StorageConfig,
	pub engines: EngineConfig,
	pub menu: MenuConfig,
	pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
	/// Collection file. Defaults to the platform data directory.
	pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
	/// Token in query templates replaced by the encoded selection.
	pub selection_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenuConfig {
	pub root_title: String,
	/// Token the menu surface expands to the selection in item titles.
	pub surface_token: String,
	pub show_manage_entry: bool,
	pub manage_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	/// Re-read and recompute attempts after a stale write.
	pub conflict_retries: usize,
	/// Retries of transient store failures.
	pub io_retries: usize,
	pub backoff_min_ms: u64,
	pub backoff_max_ms: u64,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			selection_token: DEFAULT_SELECTION_TOKEN.to_string(),
		}
	}
}

impl Default for MenuConfig {
	fn default() -> Self {
		Self {
			root_title: "Contextual".to_string(),
			surface_token: DEFAULT_SELECTION_TOKEN.to_string(),
			show_manage_entry: true,
			manage_title: "Manage search engines".to_string(),
		}
	}
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			conflict_retries: 3,
			io_retries: 3,
			backoff_min_ms: 20,
			backoff_max_ms: 500,
		}
	}
}

impl RegistryConfig {
	pub fn backoff_min(&self) -> Duration {
		Duration::from_millis(self.backoff_min_ms)
	}

	pub fn backoff_max(&self) -> Duration {
		Duration::from_millis(self.backoff_max_ms.max(self.backoff_min_ms))
	}
}

impl StorageConfig {
	/// Configured path, else `<data dir>/contextual/engines.json`, else a
	/// file in the working directory.
	pub fn resolved_path(&self) -> PathBuf {
		if let Some(path) = &self.path {
			return path.clone();
		}
		dirs::data_dir()
			.map(|dir| dir.join(APP_DIR).join("engines.json"))
			.unwrap_or_else(|| PathBuf::from("engines.json"))
	}
}

impl Config {
	/// Default config file location, if the platform has one.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
	}

	pub fn parse(text: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks constraints the field types cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.engines.selection_token.is_empty() {
			return Err(ConfigError::Invalid {
				field: "engines.selection_token",
				reason: "must not be empty",
			});
		}
		if self.menu.surface_token.is_empty() {
			return Err(ConfigError::Invalid {
				field: "menu.surface_token",
				reason: "must not be empty",
			});
		}
		Ok(())
	}

	/// Loads `path`, which must exist.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::parse(&text)
	}

	/// Loads the default config file, falling back to defaults when absent.
	pub fn load_default() -> Result<Self, ConfigError> {
		match Self::default_path() {
			Some(path) if path.exists() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}
}

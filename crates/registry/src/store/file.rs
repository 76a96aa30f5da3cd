use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::{EngineStore, Revision, Snapshot, StoreError};
use crate::record::EngineRecord;

#[derive(Deserialize)]
struct StoreFile {
	#[serde(default)]
	revision: Revision,
	#[serde(rename = "contextualSearchEngines", default)]
	engines: Vec<EngineRecord>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
	revision: Revision,
	#[serde(rename = "contextualSearchEngines")]
	engines: &'a [EngineRecord],
}

/// JSON file store.
///
/// Writes go to a temporary file in the same directory and are renamed over
/// the target, so readers never observe a half-written collection. The
/// revision check and the rename happen under an exclusive advisory lock on
/// a `<path>.lock` sidecar, which serializes writers across processes and
/// across handles within one process.
#[derive(Debug)]
pub struct JsonFileStore {
	path: PathBuf,
}

impl JsonFileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn lock_path(&self) -> PathBuf {
		let mut name = self.path.as_os_str().to_owned();
		name.push(".lock");
		PathBuf::from(name)
	}

	/// Blocks until this process holds the writer lock. Released when the
	/// returned file is dropped.
	fn lock_writers(&self) -> Result<File, StoreError> {
		let lock_file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(false)
			.open(self.lock_path())?;
		lock_file.lock_exclusive()?;
		Ok(lock_file)
	}

	fn read(&self) -> Result<StoreFile, StoreError> {
		match fs::read(&self.path) {
			Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoreFile {
				revision: 0,
				engines: Vec::new(),
			}),
			Err(err) => Err(err.into()),
		}
	}
}

impl EngineStore for JsonFileStore {
	fn load(&self) -> Result<Snapshot, StoreError> {
		let file = self.read()?;
		Ok(Snapshot {
			revision: file.revision,
			records: file.engines,
		})
	}

	fn store(&self, expected: Revision, records: &[EngineRecord]) -> Result<Revision, StoreError> {
		let dir = match self.path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir,
			_ => Path::new("."),
		};
		fs::create_dir_all(dir)?;
		let _lock = self.lock_writers()?;

		let actual = self.read()?.revision;
		if actual != expected {
			return Err(StoreError::Conflict { expected, actual });
		}

		let next = StoreFileRef {
			revision: expected + 1,
			engines: records,
		};
		let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
		{
			let mut writer = BufWriter::new(tmp.as_file_mut());
			serde_json::to_writer_pretty(&mut writer, &next)?;
			writer.flush()?;
		}
		tmp.as_file().sync_all()?;
		tmp.persist(&self.path).map_err(|err| err.error)?;

		tracing::debug!(path = %self.path.display(), revision = next.revision, count = records.len(), "store.file.write");
		Ok(next.revision)
	}
}

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use watcher_core::Snapshot;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed state file: {0}")]
    Format(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSnapshot {
    networks: Vec<String>,
    #[serde(default)]
    saved_utc: Option<String>,
}

/// Last accepted snapshot on disk, as a flat list of names.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no state has been written yet.
    pub fn load(&self) -> Result<Option<Vec<String>>, PersistError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let state: PersistedSnapshot =
            ron::from_str(&content).map_err(|err| PersistError::Format(err.to_string()))?;
        Ok(Some(state.networks))
    }

    /// Writes to a temp file next to the target and renames it into place.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        let state = PersistedSnapshot {
            networks: snapshot.to_strings(),
            saved_utc: Some(Utc::now().to_rfc3339()),
        };
        let content = ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new())
            .map_err(|err| PersistError::Format(err.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|err| PersistError::Io(err.error))?;
        Ok(())
    }
}

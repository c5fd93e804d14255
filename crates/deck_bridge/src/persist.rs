//! Durable storage for committed settings.
//!
//! The whole document is rewritten on every save through a sibling temp
//! file, so readers see either the previous or the new settings, never a
//! truncated mix.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use deck_core::Settings;
use tempfile::NamedTempFile;
use thiserror::Error;

pub const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot use {} as settings directory: {reason}", path.display())]
    Dir { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("settings document is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Creates `dir` and its parents unless it already is a directory.
pub fn ensure_dir(dir: &Path) -> Result<(), PersistError> {
    fs::create_dir_all(dir).map_err(|err| PersistError::Dir {
        path: dir.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Replaces `path` with `bytes` via a temp file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| PersistError::Io(err.error))?;
    Ok(())
}

/// Where committed settings live. Saves replace the whole document.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings, PersistError>;
    fn save(&self, settings: &Settings) -> Result<(), PersistError>;
}

/// Settings kept as one pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    /// Store at `{dir}/settings.json`.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            path: dir.join(SETTINGS_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    /// Defaults when nothing was saved yet.
    fn load(&self) -> Result<Settings, PersistError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), PersistError> {
        let document = serde_json::to_vec_pretty(settings)?;
        write_atomic(&self.path, &document)
    }
}

//! Session cookie persisted between invocations.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CliError;

/// What is kept on disk after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    /// Backend the cookie was issued by.
    pub base_url: String,
    /// `name=value` pairs as sent in the `Cookie` header.
    pub cookie: String,
    /// When the session was saved.
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    /// A session for `base_url`, stamped now.
    #[must_use]
    pub fn new(base_url: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cookie: cookie.into(),
            saved_at: Utc::now(),
        }
    }

    /// Whether the cookie belongs to `base_url`.
    #[must_use]
    pub fn matches(&self, base_url: &str) -> bool {
        self.base_url.trim_end_matches('/') == base_url.trim_end_matches('/')
    }
}

/// Location of the session file.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    /// Use an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `session.json` in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] when no home directory is known.
    pub fn default_location() -> Result<Self, CliError> {
        let dirs = ProjectDirs::from("com", "cvt", "cvt")
            .ok_or_else(|| CliError::Config("no config directory available".into()))?;
        Ok(Self::new(dirs.config_dir().join("session.json")))
    }

    /// The file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session; `None` when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<StoredSession>, CliError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session = serde_json::from_str(&raw).map_err(|e| {
            CliError::Config(format!("corrupt session file {}: {e}", self.path.display()))
        })?;
        Ok(Some(session))
    }

    /// Write `session`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, session: &StoredSession) -> Result<(), CliError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<(), CliError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

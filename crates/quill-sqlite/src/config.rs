//! Connection settings.
//!
//! [`ConnectionConfig`] can be built in code or deserialized from any serde
//! format; every field has a default, so partial documents are accepted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How the database file is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Read and write, creating the file when missing.
    #[default]
    ReadWrite,
    /// Read only; writes fail with an execution error.
    ReadOnly,
}

/// Settings applied when a connection is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Database file; `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    /// Open mode.
    pub mode: OpenMode,
    /// How long to retry when the database is locked, in milliseconds.
    pub busy_timeout_ms: Option<u64>,
    /// Enforce foreign key constraints. Applied at open either way,
    /// overriding the engine's compiled-in default.
    pub foreign_keys: bool,
}

impl ConnectionConfig {
    /// An in-memory, read-write database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A read-write database at `path`.
    #[must_use]
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Sets the open mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the busy timeout.
    #[must_use]
    pub const fn with_busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = Some(millis);
        self
    }

    /// Enables or disables foreign key enforcement.
    #[must_use]
    pub const fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Human-readable location, for logs and errors.
    pub(crate) fn location(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| String::from(":memory:"), |p| p.display().to_string())
    }
}

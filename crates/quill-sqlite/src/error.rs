//! Error types for the SQLite connection layer.

use quill_core::{BindingError, DecodeError};
use thiserror::Error;

/// Errors raised while talking to the database.
#[derive(Debug, Error)]
pub enum Error {
    /// Supplied values do not match the statement's parameters.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// The database could not be opened.
    #[error("failed to open `{path}`: {source}")]
    Open {
        /// Path, or `:memory:`.
        path: String,
        /// Engine error.
        #[source]
        source: rusqlite::Error,
    },

    /// The engine rejected the statement text.
    #[error("failed to prepare `{sql}`: {message}")]
    Prepare {
        /// Statement text.
        sql: String,
        /// SQLite extended result code, when the engine reported one.
        code: Option<i32>,
        /// Engine message.
        message: String,
    },

    /// The statement failed while stepping.
    #[error("failed to execute `{sql}`: {message}")]
    Execution {
        /// Statement text.
        sql: String,
        /// SQLite extended result code, when the engine reported one.
        code: Option<i32>,
        /// Engine message.
        message: String,
    },

    /// Invalid connection settings, function or collation registration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A stored value could not be read as the requested type.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Rolling back after `cause` failed too; the connection state is unknown.
    #[error("{cause}; rollback failed: {rollback}")]
    Rollback {
        /// The failure that triggered the rollback.
        cause: Box<Error>,
        /// The failure of the rollback itself.
        rollback: Box<Error>,
    },
}

/// Result type for connection operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn prepare(sql: &str, err: &rusqlite::Error) -> Self {
        Self::Prepare {
            sql: String::from(sql),
            code: engine_code(err),
            message: engine_message(err),
        }
    }

    pub(crate) fn execution(sql: &str, err: &rusqlite::Error) -> Self {
        Self::Execution {
            sql: String::from(sql),
            code: engine_code(err),
            message: engine_message(err),
        }
    }

    /// The SQLite extended result code behind this error, if any.
    ///
    /// For [`Error::Rollback`] this is the code of the original cause.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Prepare { code, .. } | Self::Execution { code, .. } => *code,
            Self::Open { source, .. } => engine_code(source),
            Self::Rollback { cause, .. } => cause.code(),
            Self::Binding(_) | Self::Configuration(_) | Self::Decode(_) => None,
        }
    }

    /// The statement that failed, for prepare and execution errors.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Prepare { sql, .. } | Self::Execution { sql, .. } => Some(sql),
            Self::Rollback { cause, .. } => cause.sql(),
            _ => None,
        }
    }
}

const fn engine_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => Some(failure.extended_code),
        _ => None,
    }
}

fn engine_message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.clone(),
        other => other.to_string(),
    }
}

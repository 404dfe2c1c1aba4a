//! Transactions and savepoints.
//!
//! Both take a closure that runs statements against the connection. When the
//! closure succeeds, the work is committed (or the savepoint released); when
//! it fails, the work is rolled back and the closure's error is returned.
//!
//! ```rust
//! use quill_sqlite::{params, Connection, TransactionMode};
//!
//! let db = Connection::open_in_memory().unwrap();
//! db.execute_batch("CREATE TABLE users (email TEXT UNIQUE NOT NULL)").unwrap();
//!
//! let result = db.transaction(TransactionMode::Deferred, |db| {
//!     db.run("INSERT INTO users (email) VALUES (?)", params!["alice@example.com"])?;
//!     db.run("INSERT INTO users (email) VALUES (?)", params!["alice@example.com"])
//! });
//! assert!(result.is_err());
//! assert_eq!(db.scalar::<i64>("SELECT count(*) FROM users", ()).unwrap(), Some(0));
//! ```

use std::fmt;

use quill_core::quote_literal;
use tracing::{error, info, warn};

use crate::connection::Connection;
use crate::error::{Error, Result};

/// How `BEGIN` acquires locks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionMode {
    /// Locks are taken on first read or write.
    #[default]
    Deferred,
    /// A write lock is taken immediately.
    Immediate,
    /// An exclusive lock is taken immediately.
    Exclusive,
}

impl fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deferred => "DEFERRED",
            Self::Immediate => "IMMEDIATE",
            Self::Exclusive => "EXCLUSIVE",
        })
    }
}

impl Connection {
    /// Runs `body` between `BEGIN <mode> TRANSACTION` and
    /// `COMMIT TRANSACTION`.
    ///
    /// If `body` or the commit fails, `ROLLBACK TRANSACTION` is issued and
    /// that failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the error from `BEGIN`, `body` or `COMMIT`; if the rollback
    /// fails as well, [`Error::Rollback`] carrying both.
    pub fn transaction<T, F>(&self, mode: TransactionMode, body: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.run(&format!("BEGIN {mode} TRANSACTION"), ())?;

        let outcome = body(self).and_then(|value| {
            self.run("COMMIT TRANSACTION", ())?;
            Ok(value)
        });
        match outcome {
            Ok(value) => {
                info!(mode = %mode, "Committed transaction");
                Ok(value)
            }
            Err(cause) => {
                warn!(error = %cause, "Rolling back transaction");
                Err(self.roll_back(cause, "ROLLBACK TRANSACTION"))
            }
        }
    }

    /// Runs `body` inside `SAVEPOINT '<name>'`.
    ///
    /// Without a name, the next number from the connection's savepoint
    /// counter is used (`'1'`, `'2'`, ...); numbers are never reused, so
    /// nested savepoints never collide. Names are quoted as string literals.
    ///
    /// On success the savepoint is released. On failure only
    /// `ROLLBACK TO SAVEPOINT` is issued: the savepoint stays on the stack,
    /// and an outermost savepoint leaves its transaction open (see
    /// [`Connection::is_autocommit`]). The error propagates, so enclosing
    /// savepoints roll back to their own names in turn.
    ///
    /// # Errors
    ///
    /// Returns the error from `SAVEPOINT`, `body` or `RELEASE`; if rolling
    /// back fails as well, [`Error::Rollback`] carrying both.
    pub fn savepoint<T, F>(&self, name: Option<&str>, body: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let name = name.map_or_else(|| self.next_savepoint_name(), String::from);
        let quoted = quote_literal(&name);
        self.run(&format!("SAVEPOINT {quoted}"), ())?;

        let outcome = body(self).and_then(|value| {
            self.run(&format!("RELEASE SAVEPOINT {quoted}"), ())?;
            Ok(value)
        });
        outcome.map_err(|cause| {
            warn!(savepoint = %name, error = %cause, "Rolling back to savepoint");
            self.roll_back(cause, &format!("ROLLBACK TO SAVEPOINT {quoted}"))
        })
    }

    fn roll_back(&self, cause: Error, sql: &str) -> Error {
        match self.run(sql, ()) {
            Ok(()) => cause,
            Err(rollback) => {
                error!(error = %rollback, cause = %cause, "Rollback failed");
                Error::Rollback {
                    cause: Box::new(cause),
                    rollback: Box::new(rollback),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_keywords() {
        assert_eq!(TransactionMode::default(), TransactionMode::Deferred);
        assert_eq!(TransactionMode::Deferred.to_string(), "DEFERRED");
        assert_eq!(TransactionMode::Immediate.to_string(), "IMMEDIATE");
        assert_eq!(TransactionMode::Exclusive.to_string(), "EXCLUSIVE");
    }

    #[test]
    fn test_transaction_returns_body_value() {
        let db = Connection::open_in_memory().unwrap();
        let answer = |db: &Connection| db.scalar::<i64>("SELECT 41 + 1", ());
        let value = db.transaction(TransactionMode::Immediate, answer).unwrap();
        assert_eq!(value, Some(42));
        assert!(db.is_autocommit());
    }
}

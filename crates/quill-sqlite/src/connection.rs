//! The connection handle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use quill_core::{Binding, Expression, SqlType, Value};
use rusqlite::OpenFlags;
use tracing::{debug, info};

use crate::config::{ConnectionConfig, OpenMode};
use crate::error::{Error, Result};
use crate::row::Row;
use crate::statement::{IntoBindings, Statement};

type TraceHook = Box<dyn Fn(&str) + Send>;

/// An open SQLite database.
///
/// All work happens synchronously on the calling thread. The handle is
/// closed when the connection is dropped.
pub struct Connection {
    inner: rusqlite::Connection,
    mode: OpenMode,
    savepoints: Cell<u64>,
    inserted: Cell<bool>,
    trace: RefCell<Option<TraceHook>>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("mode", &self.mode)
            .field("savepoints", &self.savepoints.get())
            .field("traced", &self.trace.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl Connection {
    // ========================================================================
    // Opening
    // ========================================================================

    /// Opens (creating if needed) the database at `path` for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] when the engine cannot open the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(&ConnectionConfig::file(path))
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] when the engine cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_with(&ConnectionConfig::in_memory())
    }

    /// Opens the database at `path` read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] when the file does not exist or cannot be read.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(&ConnectionConfig::file(path).with_mode(OpenMode::ReadOnly))
    }

    /// Opens a database as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`] when the engine cannot open the database and
    /// [`Error::Configuration`] when a setting cannot be applied.
    pub fn open_with(config: &ConnectionConfig) -> Result<Self> {
        let flags = match config.mode {
            OpenMode::ReadWrite => {
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
            }
            OpenMode::ReadOnly => {
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
            }
        };
        let location = config.location();
        let inner = match &config.path {
            Some(path) => rusqlite::Connection::open_with_flags(path, flags),
            None => rusqlite::Connection::open_in_memory_with_flags(flags),
        }
        .map_err(|source| Error::Open {
            path: location.clone(),
            source,
        })?;

        if let Some(millis) = config.busy_timeout_ms {
            inner
                .busy_timeout(Duration::from_millis(millis))
                .map_err(|e| Error::Configuration(format!("busy timeout: {e}")))?;
        }

        let connection = Self {
            inner,
            mode: config.mode,
            savepoints: Cell::new(0),
            inserted: Cell::new(false),
            trace: RefCell::new(None),
        };
        // Bundled builds enforce foreign keys by default, so apply both ways.
        connection.set_foreign_keys(config.foreign_keys)?;

        info!(path = %location, mode = ?config.mode, "Opened database");
        Ok(connection)
    }

    /// Whether the connection was opened read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.mode == OpenMode::ReadOnly
    }

    /// Whether no transaction is open.
    #[must_use]
    pub fn is_autocommit(&self) -> bool {
        self.inner.is_autocommit()
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Prepares `sql`, binding `bindings` when any are given.
    ///
    /// With no bindings the statement's parameters are left unbound, to be
    /// supplied later through [`Statement::bind`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prepare`] when the engine rejects the text and
    /// [`Error::Binding`] when the values do not match its parameters.
    pub fn prepare(&self, sql: &str, bindings: impl IntoBindings) -> Result<Statement<'_>> {
        let inner = self
            .inner
            .prepare(sql)
            .map_err(|e| Error::prepare(sql, &e))?;
        let mut statement = Statement::new(self, inner, sql);
        let bindings = bindings.into_bindings();
        if !bindings.is_empty() {
            statement.bind(bindings)?;
        }
        Ok(statement)
    }

    /// Prepares an expression with its bindings.
    ///
    /// # Errors
    ///
    /// See [`Connection::prepare`].
    pub fn prepare_expression<T>(&self, expression: &Expression<T>) -> Result<Statement<'_>> {
        self.prepare(expression.sql(), expression.bindings())
    }

    /// Prepares, binds and runs `sql` to completion.
    ///
    /// Bindings are always checked: a statement with parameters fails when
    /// run with `()`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prepare`], [`Error::Binding`] or [`Error::Execution`].
    pub fn run(&self, sql: &str, bindings: impl IntoBindings) -> Result<()> {
        let mut statement = self.prepare(sql, ())?;
        statement.bind(bindings)?;
        statement.run(())
    }

    /// Runs an expression to completion.
    ///
    /// # Errors
    ///
    /// See [`Connection::run`].
    pub fn run_expression<T>(&self, expression: &Expression<T>) -> Result<()> {
        self.run(expression.sql(), expression.bindings())
    }

    /// Runs an expression with its bindings inlined as literals.
    ///
    /// For statements whose parameters cannot be bound, such as `PRAGMA`
    /// assignments and DDL defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Binding`] when the expression's bindings do not match
    /// its placeholders, otherwise see [`Connection::run`].
    pub fn execute_literal<T>(&self, expression: &Expression<T>) -> Result<()> {
        let sql = expression.compile()?;
        self.run(&sql, ())
    }

    /// Executes one or more `;`-separated statements without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] for the first failing statement.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.emit_trace(sql);
        debug!(sql = %sql, "Executing batch");
        let rowid = self.inner.last_insert_rowid();
        self.inner
            .execute_batch(sql)
            .map_err(|e| Error::execution(sql, &e))?;
        if self.inner.last_insert_rowid() != rowid {
            self.inserted.set(true);
        }
        Ok(())
    }

    /// First column of the first row of `sql`, `None` for no rows or `NULL`.
    ///
    /// # Errors
    ///
    /// See [`Connection::run`]; also [`Error::Decode`] when the value is
    /// not a `V`.
    pub fn scalar<V: Value>(&self, sql: &str, bindings: impl IntoBindings) -> Result<Option<V>> {
        let mut statement = self.prepare(sql, ())?;
        statement.bind(bindings)?;
        statement.scalar(())
    }

    /// Evaluates an expression that yields one value.
    ///
    /// # Errors
    ///
    /// See [`Connection::scalar`].
    pub fn scalar_expression<T: SqlType>(
        &self,
        expression: &Expression<T>,
    ) -> Result<Option<T::Base>> {
        self.scalar(expression.sql(), expression.bindings())
    }

    /// Evaluates a bare expression as `SELECT <expression>`.
    ///
    /// ```rust
    /// use quill_core::Expression;
    /// use quill_sqlite::Connection;
    ///
    /// let db = Connection::open_in_memory().unwrap();
    /// let sum = Expression::value(40_i64) + 2_i64;
    /// assert_eq!(db.evaluate(&sum).unwrap(), Some(42));
    /// ```
    ///
    /// # Errors
    ///
    /// See [`Connection::scalar`].
    pub fn evaluate<T: SqlType>(&self, expression: &Expression<T>) -> Result<Option<T::Base>> {
        let select = format!("SELECT {}", expression.sql());
        self.scalar(&select, expression.bindings())
    }

    /// Runs `sql` and collects every row.
    ///
    /// # Errors
    ///
    /// See [`Connection::run`].
    pub fn query(&self, sql: &str, bindings: impl IntoBindings) -> Result<Vec<Row>> {
        let rowid = self.inner.last_insert_rowid();
        let mut statement = self.prepare(sql, ())?;
        statement.bind(bindings)?;
        let rows = statement.query(())?.collect::<Result<Vec<_>>>()?;
        self.note_insert(sql, rowid)?;
        Ok(rows)
    }

    /// Runs a query expression and collects every row.
    ///
    /// # Errors
    ///
    /// See [`Connection::run`].
    pub fn query_expression<T>(&self, expression: &Expression<T>) -> Result<Vec<Row>> {
        self.query(expression.sql(), expression.bindings())
    }

    // ========================================================================
    // Counters
    // ========================================================================

    /// Row id of the most recent successful insert; `None` before any.
    ///
    /// An explicit row id of 0 counts as an insert.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<i64> {
        let id = self.inner.last_insert_rowid();
        self.inserted.get().then_some(id)
    }

    /// Records a successful insert by `sql`, which ran when the last row id
    /// was `rowid_before`.
    pub(crate) fn note_insert(&self, sql: &str, rowid_before: i64) -> Result<()> {
        if self.inserted.get() {
            return Ok(());
        }
        if self.inner.last_insert_rowid() != rowid_before
            || (is_insert(sql) && self.last_changes()? > 0)
        {
            self.inserted.set(true);
        }
        Ok(())
    }

    /// Rows changed by the most recent `INSERT`, `UPDATE` or `DELETE`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the counter cannot be read.
    pub fn last_changes(&self) -> Result<u64> {
        self.counter("SELECT changes()")
    }

    /// Rows changed since the connection was opened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the counter cannot be read.
    pub fn total_changes(&self) -> Result<u64> {
        self.counter("SELECT total_changes()")
    }

    fn counter(&self, sql: &str) -> Result<u64> {
        let count = self
            .inner
            .query_row(sql, [], |row| row.get::<_, i64>(0))
            .map_err(|e| Error::execution(sql, &e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    // ========================================================================
    // Pragmas
    // ========================================================================

    /// `PRAGMA user_version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the pragma cannot be read.
    pub fn user_version(&self) -> Result<i32> {
        let version = self.scalar::<i32>("PRAGMA user_version", ())?;
        Ok(version.unwrap_or_default())
    }

    /// Sets `PRAGMA user_version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the pragma cannot be written.
    pub fn set_user_version(&self, version: i32) -> Result<()> {
        self.set_pragma("user_version", Binding::Integer(i64::from(version)))
    }

    /// `PRAGMA foreign_keys`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the pragma cannot be read.
    pub fn foreign_keys(&self) -> Result<bool> {
        let enabled = self.scalar::<bool>("PRAGMA foreign_keys", ())?;
        Ok(enabled.unwrap_or_default())
    }

    /// Sets `PRAGMA foreign_keys`. Has no effect inside a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the pragma cannot be written.
    pub fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        self.set_pragma("foreign_keys", Binding::Integer(i64::from(enabled)))
    }

    // Pragma values cannot be bound parameters.
    fn set_pragma(&self, pragma: &str, value: Binding) -> Result<()> {
        let statement =
            Expression::<()>::literal(format!("PRAGMA {pragma} = ?"), vec![Some(value)]);
        self.execute_literal(&statement)
    }

    // ========================================================================
    // Tracing
    // ========================================================================

    /// Installs a hook called with the text of every statement executed,
    /// bound values inlined. Replaces any previous hook.
    pub fn set_trace<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + 'static,
    {
        *self.trace.borrow_mut() = Some(Box::new(hook));
    }

    /// Removes the trace hook.
    pub fn clear_trace(&self) {
        *self.trace.borrow_mut() = None;
    }

    pub(crate) fn emit_trace(&self, sql: &str) {
        if let Some(hook) = self.trace.borrow().as_ref() {
            hook(sql);
        }
    }

    // ========================================================================
    // Internals shared with transactions and functions
    // ========================================================================

    pub(crate) const fn engine(&self) -> &rusqlite::Connection {
        &self.inner
    }

    /// Next automatic savepoint name; never reused on this connection.
    pub(crate) fn next_savepoint_name(&self) -> String {
        let next = self.savepoints.get() + 1;
        self.savepoints.set(next);
        next.to_string()
    }
}

/// Whether `sql` starts with `INSERT` or `REPLACE`.
fn is_insert(sql: &str) -> bool {
    sql.split_whitespace().next().is_some_and(|verb| {
        verb.eq_ignore_ascii_case("INSERT") || verb.eq_ignore_ascii_case("REPLACE")
    })
}

//! Prepared statements and their parameter values.

use std::collections::HashSet;
use std::sync::Arc;

use quill_core::{inline_named, inline_positional, Binding, BindingError, Value};
use tracing::debug;

use crate::connection::Connection;
use crate::convert::{from_engine, to_engine};
use crate::error::{Error, Result};
use crate::row::{ColumnIndex, Rows};

// ============================================================================
// Bindings
// ============================================================================

/// Values for a statement's parameters, by position or by name.
///
/// Names include their prefix and match the statement text exactly:
/// `":email"`, `"$email"` and `"@email"` are three different parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Bindings {
    /// One value per `?`, in order.
    Positional(Vec<Option<Binding>>),
    /// One value per named parameter.
    Named(Vec<(String, Option<Binding>)>),
}

impl Default for Bindings {
    fn default() -> Self {
        Self::Positional(Vec::new())
    }
}

impl Bindings {
    /// Whether no values are supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::Positional(values) => values.is_empty(),
            Self::Named(values) => values.is_empty(),
        }
    }

    /// Number of values supplied.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Positional(values) => values.len(),
            Self::Named(values) => values.len(),
        }
    }

    /// `sql` with these values inlined as literals.
    ///
    /// # Errors
    ///
    /// Returns a [`BindingError`] when the values do not match the
    /// placeholders in `sql`.
    pub fn inline(&self, sql: &str) -> std::result::Result<String, BindingError> {
        match self {
            Self::Positional(values) => inline_positional(sql, values),
            Self::Named(values) => inline_named(sql, values),
        }
    }
}

/// Conversion into [`Bindings`]; `()` means no values.
pub trait IntoBindings {
    /// Performs the conversion.
    fn into_bindings(self) -> Bindings;
}

impl IntoBindings for Bindings {
    fn into_bindings(self) -> Bindings {
        self
    }
}

impl IntoBindings for () {
    fn into_bindings(self) -> Bindings {
        Bindings::default()
    }
}

impl IntoBindings for Vec<Option<Binding>> {
    fn into_bindings(self) -> Bindings {
        Bindings::Positional(self)
    }
}

impl IntoBindings for &[Option<Binding>] {
    fn into_bindings(self) -> Bindings {
        Bindings::Positional(self.to_vec())
    }
}

impl<const N: usize> IntoBindings for [Option<Binding>; N] {
    fn into_bindings(self) -> Bindings {
        Bindings::Positional(self.to_vec())
    }
}

impl IntoBindings for Vec<(String, Option<Binding>)> {
    fn into_bindings(self) -> Bindings {
        Bindings::Named(self)
    }
}

// ============================================================================
// Statement
// ============================================================================

/// A prepared statement borrowed from its [`Connection`].
///
/// Values bound with [`Statement::bind`] stay bound across executions;
/// passing non-empty bindings to [`Statement::run`], [`Statement::scalar`]
/// or [`Statement::query`] rebinds first.
pub struct Statement<'conn> {
    connection: &'conn Connection,
    inner: rusqlite::Statement<'conn>,
    sql: String,
    bound: Bindings,
    is_bound: bool,
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

impl<'conn> Statement<'conn> {
    pub(crate) fn new(
        connection: &'conn Connection,
        inner: rusqlite::Statement<'conn>,
        sql: &str,
    ) -> Self {
        Self {
            connection,
            inner,
            sql: String::from(sql),
            bound: Bindings::default(),
            is_bound: false,
        }
    }

    /// The statement text as prepared.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The statement text with the current values inlined, as traced.
    #[must_use]
    pub fn expanded_sql(&self) -> String {
        self.bound
            .inline(&self.sql)
            .unwrap_or_else(|_| self.sql.clone())
    }

    /// Number of parameters the statement declares.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }

    /// Result column names.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.inner
            .column_names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Binds values to the statement's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Binding`] when the number of values differs from the
    /// number of parameters, a name is unknown, or a name repeats.
    pub fn bind(&mut self, bindings: impl IntoBindings) -> Result<&mut Self> {
        let bindings = bindings.into_bindings();
        let expected = self.inner.parameter_count();

        match &bindings {
            Bindings::Positional(values) => {
                if values.len() != expected {
                    return Err(BindingError::CountMismatch {
                        expected,
                        found: values.len(),
                    }
                    .into());
                }
                for (offset, value) in values.iter().enumerate() {
                    self.bind_at(offset + 1, value.as_ref())?;
                }
            }
            Bindings::Named(values) => {
                let mut seen = HashSet::new();
                let mut indexes = Vec::with_capacity(values.len());
                for (name, _) in values {
                    if !seen.insert(name.as_str()) {
                        return Err(BindingError::DuplicateName(name.clone()).into());
                    }
                    let index = self
                        .inner
                        .parameter_index(name)
                        .map_err(|e| Error::execution(&self.sql, &e))?
                        .ok_or_else(|| BindingError::UnknownName(name.clone()))?;
                    indexes.push(index);
                }
                if values.len() != expected {
                    return Err(BindingError::CountMismatch {
                        expected,
                        found: values.len(),
                    }
                    .into());
                }
                for (index, (_, value)) in indexes.into_iter().zip(values) {
                    self.bind_at(index, value.as_ref())?;
                }
            }
        }

        self.bound = bindings;
        self.is_bound = true;
        Ok(self)
    }

    fn bind_at(&mut self, index: usize, value: Option<&Binding>) -> Result<()> {
        self.inner
            .raw_bind_parameter(index, to_engine(value))
            .map_err(|e| Error::execution(&self.sql, &e))
    }

    fn rebind(&mut self, bindings: impl IntoBindings) -> Result<()> {
        let bindings = bindings.into_bindings();
        if !bindings.is_empty() {
            self.bind(bindings)?;
        } else if !self.is_bound {
            // Never bound: only a statement without parameters may run.
            let expected = self.inner.parameter_count();
            if expected > 0 {
                return Err(BindingError::CountMismatch { expected, found: 0 }.into());
            }
        }
        self.connection.emit_trace(&self.expanded_sql());
        debug!(sql = %self.sql, "Executing statement");
        Ok(())
    }

    /// Steps the statement to completion, discarding any rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Binding`] for rejected values and
    /// [`Error::Execution`] when the engine fails.
    pub fn run(&mut self, bindings: impl IntoBindings) -> Result<()> {
        self.rebind(bindings)?;
        let rowid = self.connection.engine().last_insert_rowid();
        let sql = &self.sql;
        let mut rows = self.inner.raw_query();
        while let Some(_row) = rows.next().map_err(|e| Error::execution(sql, &e))? {}
        drop(rows);
        self.connection.note_insert(&self.sql, rowid)
    }

    /// First column of the first row, `None` for no rows or `NULL`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the engine fails and
    /// [`Error::Decode`] when the value is not a `V`.
    pub fn scalar<V: Value>(&mut self, bindings: impl IntoBindings) -> Result<Option<V>> {
        self.rebind(bindings)?;
        let rowid = self.connection.engine().last_insert_rowid();
        let sql = &self.sql;
        let mut rows = self.inner.raw_query();
        let first = match rows.next().map_err(|e| Error::execution(sql, &e))? {
            Some(row) => from_engine(row.get_ref(0).map_err(|e| Error::execution(sql, &e))?),
            None => None,
        };
        drop(rows);
        self.connection.note_insert(&self.sql, rowid)?;
        Ok(first.map(V::from_binding).transpose()?)
    }

    /// Executes the statement, yielding its rows one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Binding`] for rejected values; engine failures are
    /// reported per row.
    pub fn query(&mut self, bindings: impl IntoBindings) -> Result<Rows<'_>> {
        self.rebind(bindings)?;
        let columns = Arc::new(ColumnIndex::new(self.column_names()));
        Ok(Rows::new(&self.sql, self.inner.raw_query(), columns))
    }
}

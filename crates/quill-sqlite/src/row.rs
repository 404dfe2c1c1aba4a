//! Decoded result rows.

use std::collections::HashMap;
use std::sync::Arc;

use quill_core::{Binding, DecodeError, Expression, SqlType};

use crate::convert::from_engine;
use crate::error::{Error, Result};

/// Result column names and a name-to-position lookup, shared by every row
/// of one execution.
#[derive(Debug)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub(crate) fn new(names: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            // Duplicate names (joins) resolve to the leftmost column.
            positions.entry(name.clone()).or_insert(position);
        }
        Self { names, positions }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Resolves a column expression: its exact text first (computed
    /// columns), then its trailing identifier (`"u"."id"` finds `id`).
    fn resolve(&self, sql: &str) -> Option<usize> {
        let tail = || identifier_tail(sql).and_then(|name| self.position(&name));
        self.position(sql).or_else(tail)
    }
}

/// The last segment of a quoted, possibly qualified identifier.
fn identifier_tail(sql: &str) -> Option<String> {
    let mut chars = sql.chars().peekable();
    let mut segment = String::new();
    loop {
        if chars.next()? != '"' {
            return None;
        }
        segment.clear();
        loop {
            match chars.next()? {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    segment.push('"');
                }
                '"' => break,
                c => segment.push(c),
            }
        }
        match chars.next() {
            None => return Some(segment),
            Some('.') => {}
            Some(_) => return None,
        }
    }
}

/// One result row: the column values in order plus the column names.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Option<Binding>>,
    columns: Arc<ColumnIndex>,
}

impl Row {
    fn read(row: &rusqlite::Row<'_>, columns: &Arc<ColumnIndex>) -> rusqlite::Result<Self> {
        let values = (0..columns.names.len())
            .map(|i| row.get_ref(i).map(from_engine))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Self {
            values,
            columns: Arc::clone(columns),
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names, in order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns.names
    }

    /// Raw values, in order.
    #[must_use]
    pub fn values(&self) -> &[Option<Binding>] {
        &self.values
    }

    /// Decodes the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::IndexOutOfRange`] for a bad index, otherwise
    /// the decoding error for `T`.
    pub fn get<T: SqlType>(&self, index: usize) -> std::result::Result<T, DecodeError> {
        let value = self
            .values
            .get(index)
            .ok_or(DecodeError::IndexOutOfRange(index))?;
        T::from_sql(value.clone())
    }

    /// Decodes the value of the column called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownColumn`] when no column has that name.
    pub fn get_named<T: SqlType>(&self, name: &str) -> std::result::Result<T, DecodeError> {
        let index = self
            .columns
            .position(name)
            .ok_or_else(|| DecodeError::UnknownColumn(String::from(name)))?;
        self.get(index)
    }

    /// Decodes the value of a selected column expression.
    ///
    /// ```rust
    /// use quill_core::{col, Expression, Query};
    /// use quill_sqlite::Connection;
    ///
    /// let db = Connection::open_in_memory().unwrap();
    /// db.execute_batch("CREATE TABLE users (email TEXT); INSERT INTO users VALUES ('a@b.c');")
    ///     .unwrap();
    ///
    /// let email: Expression<String> = col("email");
    /// let query = Query::table("users").select(&[&email]);
    /// let rows = db.query_expression(&query.statement()).unwrap();
    /// assert_eq!(rows[0].get_column(&email).unwrap(), "a@b.c");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownColumn`] when the expression was not
    /// selected.
    pub fn get_column<T: SqlType>(
        &self,
        column: &Expression<T>,
    ) -> std::result::Result<T, DecodeError> {
        let index = self
            .columns
            .resolve(column.sql())
            .ok_or_else(|| DecodeError::UnknownColumn(String::from(column.sql())))?;
        self.get(index)
    }
}

/// Rows of an executing statement.
///
/// Dropping it resets the statement; bound values are kept.
pub struct Rows<'stmt> {
    sql: &'stmt str,
    inner: rusqlite::Rows<'stmt>,
    columns: Arc<ColumnIndex>,
}

impl<'stmt> Rows<'stmt> {
    pub(crate) const fn new(
        sql: &'stmt str,
        inner: rusqlite::Rows<'stmt>,
        columns: Arc<ColumnIndex>,
    ) -> Self {
        Self {
            sql,
            inner,
            columns,
        }
    }

    /// Column names of the result.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns.names
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let sql = self.sql;
        match self.inner.next() {
            Ok(Some(row)) => {
                Some(Row::read(row, &self.columns).map_err(|e| Error::execution(sql, &e)))
            }
            Ok(None) => None,
            Err(e) => Some(Err(Error::execution(sql, &e))),
        }
    }
}

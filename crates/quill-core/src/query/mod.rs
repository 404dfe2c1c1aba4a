//! Table-scoped statement building.
//!
//! A [`Query`] names a table and accumulates filters; it then renders
//! `SELECT`, `INSERT`, `UPDATE` or `DELETE` statements as
//! [`Expression<()>`](crate::Expression) values whose bindings are ready to
//! hand to the engine.
//!
//! ```rust
//! use quill_core::{col, Expression, Query};
//!
//! let users = Query::table("users");
//! let id: Expression<i64> = col("id");
//! let email: Expression<String> = col("email");
//! let admin: Expression<bool> = col("admin");
//!
//! let select = users
//!     .clone()
//!     .filter(admin.eq(true))
//!     .select(&[&id, &email])
//!     .order_by(&[&email.asc()])
//!     .limit(10)
//!     .statement();
//! assert_eq!(
//!     select.sql(),
//!     "SELECT \"id\", \"email\" FROM \"users\" WHERE (\"admin\" = ?) ORDER BY \"email\" ASC LIMIT 10"
//! );
//!
//! let insert = users.insert(&[email.set("alice@example.com"), admin.set(true)]);
//! assert_eq!(insert.sql(), "INSERT INTO \"users\" (\"email\", \"admin\") VALUES (?, ?)");
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub use insert::Conflict;
pub use update::{HasSet, NoSet, Update};

use crate::expression::{infix, Expression, SqlType};
use crate::quote::quote_identifier;

/// A table plus the clauses accumulated against it.
#[derive(Debug, Clone)]
#[must_use]
pub struct Query {
    table: String,
    alias: Option<String>,
    filter: Option<Expression<()>>,
    columns: Vec<Expression<()>>,
    distinct: bool,
    group_by: Vec<Expression<()>>,
    having: Option<Expression<()>>,
    order_by: Vec<Expression<()>>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// A query over `table`.
    pub fn table(table: &str) -> Self {
        Self {
            table: String::from(table),
            alias: None,
            filter: None,
            columns: Vec::new(),
            distinct: false,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Refers to the table as `alias`.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(String::from(alias));
        self
    }

    /// Adds a `WHERE` condition, combined with earlier ones by `AND`.
    pub fn filter<T: SqlType<Base = bool>>(mut self, predicate: Expression<T>) -> Self {
        let conditions = self.filter.take().into_iter().chain([predicate.untyped()]);
        self.filter = conditions.reduce(|lhs, rhs| infix("AND", lhs, rhs));
        self
    }

    /// The accumulated `WHERE` condition, if any.
    #[must_use]
    pub const fn condition(&self) -> Option<&Expression<()>> {
        self.filter.as_ref()
    }

    /// The table reference, quoted, with its alias.
    fn source(&self) -> String {
        let table = quote_identifier(&self.table);
        match &self.alias {
            Some(alias) => format!("{table} AS {}", quote_identifier(alias)),
            None => table,
        }
    }

    /// `" WHERE <filter>"`, or nothing.
    fn where_clause(&self) -> Expression<()> {
        self.filter.as_ref().map_or_else(
            || Expression::raw(""),
            |filter| Expression::join("", [Expression::raw(" WHERE "), filter.clone()]),
        )
    }
}

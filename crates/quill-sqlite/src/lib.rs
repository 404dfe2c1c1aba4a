//! # quill-sqlite
//!
//! Runs `quill-core` expressions against SQLite.
//!
//! A [`Connection`] prepares statements from SQL text or
//! [`Expression`]s, binds values by position or by name, and decodes rows
//! back into typed values. It also runs transactions and nested savepoints,
//! registers user functions and collations, and wraps the `user_version`
//! and `foreign_keys` pragmas.
//!
//! ## Example
//!
//! ```rust
//! use quill_core::{col, Expression, Query};
//! use quill_sqlite::{named_params, params, Connection};
//!
//! let db = Connection::open_in_memory().unwrap();
//! db.execute_batch(
//!     "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL, admin INTEGER NOT NULL)",
//! )
//! .unwrap();
//!
//! let insert = "INSERT INTO users (email, admin) VALUES (?, ?)";
//! db.run(insert, params!["alice@example.com", true]).unwrap();
//! assert_eq!(db.last_insert_id(), Some(1));
//!
//! let count = "SELECT count(*) FROM users WHERE admin = $admin";
//! let admins: Option<i64> = db
//!     .scalar(count, named_params! { "$admin" => true })
//!     .unwrap();
//! assert_eq!(admins, Some(1));
//!
//! let email: Expression<String> = col("email");
//! let admin: Expression<bool> = col("admin");
//! let query = Query::table("users").filter(admin.eq(true)).select(&[&email]);
//! let rows = db.query_expression(&query.statement()).unwrap();
//! assert_eq!(rows[0].get_column(&email).unwrap(), "alice@example.com");
//! ```

mod config;
mod connection;
mod convert;
mod error;
mod function;
mod row;
mod statement;
mod transaction;

pub use config::{ConnectionConfig, OpenMode};
pub use connection::Connection;
pub use error::{Error, Result};
pub use row::{Row, Rows};
pub use statement::{Bindings, IntoBindings, Statement};
pub use transaction::TransactionMode;

pub use quill_core::{Bindable, Binding, Expression};

/// Positional [`Bindings`]: `params![email, true, None::<i64>]`.
///
/// Accepts any [`Bindable`] value; `Option`s bind `NULL` when `None`.
#[macro_export]
macro_rules! params {
    () => {
        $crate::Bindings::Positional(::std::vec::Vec::new())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Bindings::Positional(::std::vec![$($crate::Bindable::binding(&$value)),+])
    };
}

/// Named [`Bindings`]: `named_params! { ":email" => email }`.
///
/// Names include their prefix, exactly as written in the statement.
#[macro_export]
macro_rules! named_params {
    ($($name:expr => $value:expr),* $(,)?) => {
        $crate::Bindings::Named(::std::vec![
            $((::std::string::String::from($name), $crate::Bindable::binding(&$value))),*
        ])
    };
}

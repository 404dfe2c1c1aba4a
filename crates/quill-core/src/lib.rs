//! # quill-core
//!
//! Typed SQL expressions for SQLite, with their bindings kept alongside.
//!
//! This crate provides:
//! - [`Expression<T>`], a SQL fragment tagged with the Rust type it evaluates to
//! - A value layer mapping Rust types onto the four SQLite storage classes
//! - Operator overloading and functions that build new expressions with
//!   nullability tracked in the type
//! - A literal compiler that inlines bindings for tracing and DDL
//! - Table-scoped query building and `CREATE TABLE` generation
//!
//! ## Building expressions
//!
//! ```rust
//! use quill_core::{col, Expression};
//!
//! let age: Expression<i64> = col("age");
//! let name: Expression<Option<String>> = col("name");
//!
//! let filter = age.gt(18).and(name.is_not_null());
//! assert_eq!(filter.sql(), "((\"age\" > ?) AND (\"name\" IS NOT NULL))");
//! assert_eq!(filter.compile().unwrap(), "((\"age\" > 18) AND (\"name\" IS NOT NULL))");
//! ```
//!
//! The result type of `age.gt(18)` is `Expression<bool>`, while comparing a
//! nullable column yields `Expression<Option<bool>>`. Arithmetic follows the
//! same rule:
//!
//! ```rust
//! use quill_core::{col, Expression};
//!
//! let price: Expression<f64> = col("price");
//! let discount: Expression<Option<f64>> = col("discount");
//!
//! let total: Expression<Option<f64>> = price * 2.0 - discount;
//! assert_eq!(total.sql(), "((\"price\" * ?) - \"discount\")");
//! ```

pub mod compile;
pub mod error;
pub mod expression;
pub mod functions;
pub mod operators;
pub mod query;
pub mod quote;
pub mod schema;
pub mod setter;
pub mod value;

pub use compile::{inline_named, inline_positional};
pub use error::{BindingError, DecodeError};
pub use expression::{
    col, infix, wrap, Admits, Expressible, Expression, Lift, Lifted, NotNull, Null, Nullability,
    Operand, SqlType,
};
pub use functions::{coalesce, count_star, function_call, null_eq, null_not_eq, random, Collation};
pub use query::Query;
pub use quote::{quote_identifier, quote_literal};
pub use schema::{ColumnSchema, CreateTable, Table, TableSchema};
pub use setter::Setter;
pub use value::{transcode, Bindable, Binding, Blob, Datatype, Number, Value};

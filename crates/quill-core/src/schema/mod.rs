//! Schema traits and DDL.
//!
//! [`Table`] and [`TableSchema`] are implemented by `#[derive(Table)]`;
//! [`CreateTable`] renders `CREATE TABLE` either from a derived schema or
//! from typed column expressions.

mod ddl;

pub use ddl::{drop_table, ColumnOptions, CreateTable};

/// Trait for table metadata.
///
/// Implemented by types generated from `#[derive(Table)]` to provide
/// table-level information.
pub trait Table {
    /// The row type (the original struct).
    type Row;

    /// The SQL table name.
    const NAME: &'static str;

    /// List of all column names.
    const COLUMNS: &'static [&'static str];

    /// The primary key column name, if any.
    const PRIMARY_KEY: Option<&'static str>;
}

/// Column definition as recorded by `#[derive(Table)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ColumnSchema {
    /// Column name.
    pub name: &'static str,
    /// Declared type, from the field type's [`Value`](crate::Value).
    pub declared_type: &'static str,
    /// Whether the field type is an `Option`.
    pub nullable: bool,
    /// Whether this column is the primary key.
    pub primary_key: bool,
    /// Whether this column has a UNIQUE constraint.
    pub unique: bool,
    /// Whether this column auto-increments.
    pub autoincrement: bool,
    /// Default value as raw SQL.
    pub default_expr: Option<&'static str>,
}

/// Trait for tables that expose their full column schema.
pub trait TableSchema: Table {
    /// Column definitions in declaration order.
    const SCHEMA: &'static [ColumnSchema];

    /// Looks up a column definition by name.
    #[must_use]
    fn column(name: &str) -> Option<&'static ColumnSchema> {
        Self::SCHEMA.iter().find(|c| c.name == name)
    }
}

//! `CREATE TABLE` and `DROP TABLE`.
//!
//! Column defaults cannot be bound parameters, so the rendered DDL has every
//! binding inlined through the literal compiler.

use std::fmt::Write as _;
use std::marker::PhantomData;

use super::TableSchema;
use crate::error::BindingError;
use crate::expression::{Expression, Nullability, SqlType};
use crate::quote::quote_identifier;
use crate::value::Value;

/// Constraints for one column of a [`CreateTable`].
#[derive(Debug, Clone)]
pub struct ColumnOptions<V> {
    primary_key: bool,
    autoincrement: bool,
    unique: bool,
    default: Option<Expression<()>>,
    check: Option<Expression<()>>,
    references: Option<(String, String)>,
    _value: PhantomData<fn() -> V>,
}

impl<V: Value> Default for ColumnOptions<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> ColumnOptions<V> {
    /// No constraints beyond nullability.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            primary_key: false,
            autoincrement: false,
            unique: false,
            default: None,
            check: None,
            references: None,
            _value: PhantomData,
        }
    }

    /// `PRIMARY KEY`.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// `PRIMARY KEY AUTOINCREMENT`.
    #[must_use]
    pub const fn autoincrement(mut self) -> Self {
        self.primary_key = true;
        self.autoincrement = true;
        self
    }

    /// `UNIQUE`.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// `DEFAULT <value>`, inlined as a literal.
    #[must_use]
    pub fn default_value(mut self, value: V) -> Self {
        self.default = Some(Expression::value(value).untyped());
        self
    }

    /// `CHECK (<condition>)`.
    #[must_use]
    pub fn check<T: SqlType<Base = bool>>(mut self, condition: Expression<T>) -> Self {
        self.check = Some(condition.untyped());
        self
    }

    /// `REFERENCES "table" ("column")`.
    #[must_use]
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.references = Some((String::from(table), String::from(column)));
        self
    }
}

/// A `CREATE TABLE` statement builder.
///
/// ```rust
/// use quill_core::schema::{ColumnOptions, CreateTable};
/// use quill_core::{col, Expression};
///
/// let id: Expression<i64> = col("id");
/// let email: Expression<String> = col("email");
/// let name: Expression<Option<String>> = col("name");
///
/// let sql = CreateTable::new("users")
///     .column(&id, ColumnOptions::new().autoincrement())
///     .column(&email, ColumnOptions::new().unique())
///     .column(&name, ColumnOptions::new())
///     .build()
///     .unwrap();
/// assert_eq!(
///     sql,
///     "CREATE TABLE \"users\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
///      \"email\" TEXT NOT NULL UNIQUE, \"name\" TEXT)"
/// );
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct CreateTable {
    table: String,
    if_not_exists: bool,
    columns: Vec<Expression<()>>,
}

impl CreateTable {
    /// Starts a definition for `table`.
    pub fn new(table: &str) -> Self {
        Self {
            table: String::from(table),
            if_not_exists: false,
            columns: Vec::new(),
        }
    }

    /// Builds the definition recorded by `#[derive(Table)]`.
    pub fn for_table<T: TableSchema>() -> Self {
        let mut create = Self::new(T::NAME);
        for column in T::SCHEMA {
            let mut definition =
                format!("{} {}", quote_identifier(column.name), column.declared_type);
            if column.primary_key {
                definition.push_str(" PRIMARY KEY");
            }
            if column.autoincrement {
                definition.push_str(" AUTOINCREMENT");
            }
            if !column.nullable {
                definition.push_str(" NOT NULL");
            }
            if column.unique {
                definition.push_str(" UNIQUE");
            }
            if let Some(default) = column.default_expr {
                definition.push_str(" DEFAULT ");
                definition.push_str(default);
            }
            create.columns.push(Expression::raw(definition));
        }
        create
    }

    /// Adds `IF NOT EXISTS`.
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Adds a column; the declared type and `NOT NULL` follow `T`.
    pub fn column<T: SqlType>(
        mut self,
        column: &Expression<T>,
        options: ColumnOptions<T::Base>,
    ) -> Self {
        let mut sql = format!("{} {}", column.sql(), <T::Base as Value>::DECLARED_DATATYPE);
        let mut bindings = Vec::new();

        if options.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if options.autoincrement {
            sql.push_str(" AUTOINCREMENT");
        }
        if !<T::Null as Nullability>::NULLABLE {
            sql.push_str(" NOT NULL");
        }
        if options.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(check) = options.check {
            let (check_sql, check_bindings) = check.into_parts();
            let _ = write!(sql, " CHECK ({check_sql})");
            bindings.extend(check_bindings);
        }
        if let Some(default) = options.default {
            let (default_sql, default_bindings) = default.into_parts();
            let _ = write!(sql, " DEFAULT {default_sql}");
            bindings.extend(default_bindings);
        }
        if let Some((table, referenced)) = options.references {
            let _ = write!(
                sql,
                " REFERENCES {} ({})",
                quote_identifier(&table),
                quote_identifier(&referenced)
            );
        }

        self.columns.push(Expression::literal(sql, bindings));
        self
    }

    /// Renders the statement with all bindings inlined.
    ///
    /// # Errors
    ///
    /// Returns a [`BindingError`] if a check or default expression was built
    /// with mismatched bindings.
    pub fn build(&self) -> Result<String, BindingError> {
        self.expression().compile()
    }

    /// The statement as an expression, bindings not yet inlined.
    #[must_use]
    pub fn expression(&self) -> Expression<()> {
        let mut head = String::from("CREATE TABLE ");
        if self.if_not_exists {
            head.push_str("IF NOT EXISTS ");
        }
        head.push_str(&quote_identifier(&self.table));
        head.push_str(" (");

        Expression::join(
            "",
            [
                Expression::raw(head),
                Expression::join(", ", self.columns.iter().cloned()),
                Expression::raw(")"),
            ],
        )
    }
}

/// `DROP TABLE ["IF EXISTS"] "table"`.
#[must_use]
pub fn drop_table(table: &str, if_exists: bool) -> Expression<()> {
    let clause = if if_exists { "IF EXISTS " } else { "" };
    Expression::raw(format!("DROP TABLE {clause}{}", quote_identifier(table)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::col;

    #[test]
    fn test_default_is_inlined() {
        let admin: Expression<bool> = col("admin");
        let sql = CreateTable::new("users")
            .column(&admin, ColumnOptions::new().default_value(false))
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"users\" (\"admin\" INTEGER NOT NULL DEFAULT 0)"
        );
    }

    #[test]
    fn test_text_default_is_quoted() {
        let role: Expression<String> = col("role");
        let options = ColumnOptions::new().default_value(String::from("it's"));
        let sql = CreateTable::new("users")
            .if_not_exists()
            .column(&role, options)
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"users\" (\"role\" TEXT NOT NULL DEFAULT 'it''s')"
        );
    }

    #[test]
    fn test_check_and_references() {
        let age: Expression<i64> = col("age");
        let manager: Expression<Option<i64>> = col("manager_id");
        let sql = CreateTable::new("people")
            .column(&age, ColumnOptions::new().check(age.gt_eq(0)))
            .column(&manager, ColumnOptions::new().references("people", "id"))
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"people\" (\"age\" INTEGER NOT NULL CHECK ((\"age\" >= 0)), \
             \"manager_id\" INTEGER REFERENCES \"people\" (\"id\"))"
        );
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(drop_table("users", false).sql(), "DROP TABLE \"users\"");
        assert_eq!(
            drop_table("users", true).sql(),
            "DROP TABLE IF EXISTS \"users\""
        );
    }
}

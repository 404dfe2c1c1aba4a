//! Typed SQL expressions.
//!
//! An [`Expression<T>`] is a SQL fragment plus the values bound to its `?`
//! placeholders, in order. `T` is the Rust type the fragment evaluates to:
//! `Expression<i64>` for a non-null integer column, `Expression<Option<String>>`
//! for a nullable text column, `Expression<()>` for statements and fragments
//! with no meaningful result type.
//!
//! Nullability propagates through the algebra at the type level. Combining a
//! nullable operand with anything yields a nullable result; see [`Lifted`].

use std::fmt;
use std::marker::PhantomData;

use crate::error::DecodeError;
use crate::quote::{quote_identifier, quote_literal};
use crate::value::{Binding, Value};

/// A SQL fragment with its positional bindings.
///
/// Invariant: the number of unquoted `?` placeholders in [`sql`](Self::sql)
/// equals the length of [`bindings`](Self::bindings).
pub struct Expression<T> {
    sql: String,
    bindings: Vec<Option<Binding>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Self {
            sql: self.sql.clone(),
            bindings: self.bindings.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("sql", &self.sql)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Creates a column reference, quoting the name as an identifier.
#[must_use]
pub fn col<T>(name: &str) -> Expression<T> {
    Expression::new(name)
}

impl<T> Expression<T> {
    /// Creates an expression from SQL text and its bindings.
    ///
    /// The caller is responsible for supplying one binding per `?`.
    #[must_use]
    pub fn literal(sql: impl Into<String>, bindings: Vec<Option<Binding>>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
            _marker: PhantomData,
        }
    }

    /// Creates an expression from raw SQL with no bindings.
    ///
    /// **Warning**: Only use this for SQL fragments that don't contain user input.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::literal(sql, Vec::new())
    }

    /// Creates a column reference from an unquoted identifier.
    #[must_use]
    pub fn new(identifier: &str) -> Self {
        Self::raw(quote_identifier(identifier))
    }

    /// Creates a table-qualified column reference, `"table"."column"`.
    #[must_use]
    pub fn qualified(table: &str, column: &str) -> Self {
        Self::raw(format!("{}.{}", quote_identifier(table), quote_identifier(column)))
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the positional bindings.
    #[must_use]
    pub fn bindings(&self) -> &[Option<Binding>] {
        &self.bindings
    }

    /// Splits the expression into SQL text and bindings.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Option<Binding>>) {
        (self.sql, self.bindings)
    }

    /// Drops the result type.
    #[must_use]
    pub fn untyped(self) -> Expression<()> {
        self.retype()
    }

    pub(crate) fn retype<U>(self) -> Expression<U> {
        Expression::literal(self.sql, self.bindings)
    }

    /// Ascending ordering term.
    #[must_use]
    pub fn asc(&self) -> Expression<()> {
        Expression::literal(format!("{} ASC", self.sql), self.bindings.clone())
    }

    /// Descending ordering term.
    #[must_use]
    pub fn desc(&self) -> Expression<()> {
        Expression::literal(format!("{} DESC", self.sql), self.bindings.clone())
    }

    /// Appends `suffix` to the SQL text, keeping the bindings.
    pub(crate) fn postfix<U>(&self, suffix: &str) -> Expression<U> {
        Expression::literal(format!("{} {suffix}", self.sql), self.bindings.clone())
    }
}

impl Expression<()> {
    /// Joins expressions with `separator`, concatenating their bindings in order.
    #[must_use]
    pub fn join<I>(separator: &str, parts: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut sql = String::new();
        let mut bindings = Vec::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                sql.push_str(separator);
            }
            sql.push_str(&part.sql);
            bindings.extend(part.bindings);
        }
        Self::literal(sql, bindings)
    }

    /// A single-quoted string literal, inlined rather than bound.
    #[must_use]
    pub fn quoted(text: &str) -> Self {
        Self::raw(quote_literal(text))
    }
}

impl<V: Value> Expression<V> {
    /// A bound value, rendered as `?`.
    #[must_use]
    pub fn value(value: V) -> Self {
        Self::literal("?", vec![Some(value.into_binding())])
    }
}

impl<V: Value> Expression<Option<V>> {
    /// A bound optional value; `None` binds `NULL`.
    #[must_use]
    pub fn optional(value: Option<V>) -> Self {
        Self::literal("?", vec![value.map(Value::into_binding)])
    }

    /// A bound `NULL`.
    #[must_use]
    pub fn null() -> Self {
        Self::literal("?", vec![None])
    }
}

/// Combines two expressions with a binary operator: `(lhs op rhs)`.
#[must_use]
pub fn infix<A, B, C>(operator: &str, lhs: Expression<A>, rhs: Expression<B>) -> Expression<C> {
    let mut bindings = lhs.bindings;
    bindings.extend(rhs.bindings);
    Expression::literal(format!("({} {operator} {})", lhs.sql, rhs.sql), bindings)
}

/// Applies a function or prefix operator: `function(inner)`.
#[must_use]
pub fn wrap<A, C>(function: &str, inner: Expression<A>) -> Expression<C> {
    Expression::literal(format!("{function}({})", inner.sql), inner.bindings)
}

// ============================================================================
// Nullability
// ============================================================================

/// Type-level nullability of an expression's result.
pub trait Nullability {
    /// `U` itself for [`NotNull`], `Option<U>` for [`Null`].
    type Lift<U>;

    /// The nullability of an expression combining `Self` with `R`.
    type Or<R: Nullability>: Nullability;

    /// Whether values may be `NULL`.
    const NULLABLE: bool;
}

/// Marker for expressions that never evaluate to `NULL`.
#[derive(Debug, Clone, Copy)]
pub enum NotNull {}

/// Marker for expressions that may evaluate to `NULL`.
#[derive(Debug, Clone, Copy)]
pub enum Null {}

impl Nullability for NotNull {
    type Lift<U> = U;
    type Or<R: Nullability> = R;
    const NULLABLE: bool = false;
}

impl Nullability for Null {
    type Lift<U> = Option<U>;
    type Or<R: Nullability> = Self;
    const NULLABLE: bool = true;
}

/// Implemented by the nullability of a slot that can hold values of nullability `N`.
///
/// A nullable column admits both; a non-null column admits only non-null values.
pub trait Admits<N: Nullability> {}

impl Admits<NotNull> for NotNull {}
impl Admits<NotNull> for Null {}
impl Admits<Null> for Null {}

/// Result type `U`, nullable when either `L` or `R` is.
pub type Lifted<L, R, U> = <<L as Nullability>::Or<R> as Nullability>::Lift<U>;

/// Result type `U`, nullable when `T` is.
pub type Lift<T, U> = <<T as SqlType>::Null as Nullability>::Lift<U>;

// ============================================================================
// SqlType
// ============================================================================

/// A type an expression may evaluate to: a [`Value`] or an optional one.
///
/// Implemented for every `V: Value` and for `Option<V>`.
pub trait SqlType: Sized {
    /// The underlying value type, with any `Option` removed.
    type Base: Value;

    /// Whether the type admits `NULL`.
    type Null: Nullability;

    /// Converts this value into an optional binding.
    fn to_sql(&self) -> Option<Binding>;

    /// Decodes an optional binding.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnexpectedNull`] when a non-optional type
    /// receives `None`, or the [`Value`] decoding error otherwise.
    fn from_sql(binding: Option<Binding>) -> Result<Self, DecodeError>;
}

impl<V: Value> SqlType for V {
    type Base = Self;
    type Null = NotNull;

    fn to_sql(&self) -> Option<Binding> {
        Some(self.to_binding())
    }

    fn from_sql(binding: Option<Binding>) -> Result<Self, DecodeError> {
        binding.map_or(Err(DecodeError::UnexpectedNull), V::from_binding)
    }
}

impl<V: Value> SqlType for Option<V> {
    type Base = V;
    type Null = Null;

    fn to_sql(&self) -> Option<Binding> {
        self.as_ref().map(Value::to_binding)
    }

    fn from_sql(binding: Option<Binding>) -> Result<Self, DecodeError> {
        binding.map(V::from_binding).transpose()
    }
}

// ============================================================================
// Operands
// ============================================================================

/// Something usable as the right-hand side of an operator over `V`.
///
/// Plain values and `Option`s are bound as parameters; expressions are
/// spliced in with their bindings.
pub trait Operand<V: Value> {
    /// Nullability the operand contributes to the result.
    type Null: Nullability;

    /// Converts the operand into an expression.
    fn into_expression(self) -> Expression<()>;

    /// Whether the operand is a bare `None`.
    fn is_absent(&self) -> bool {
        false
    }
}

impl<V: Value> Operand<V> for V {
    type Null = NotNull;

    fn into_expression(self) -> Expression<()> {
        Expression::value(self).untyped()
    }
}

impl<V: Value> Operand<V> for Option<V> {
    type Null = Null;

    fn into_expression(self) -> Expression<()> {
        Expression::optional(self).untyped()
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<V: Value> Operand<V> for Expression<V> {
    type Null = NotNull;

    fn into_expression(self) -> Expression<()> {
        self.untyped()
    }
}

impl<V: Value> Operand<V> for Expression<Option<V>> {
    type Null = Null;

    fn into_expression(self) -> Expression<()> {
        self.untyped()
    }
}

impl<V: Value> Operand<V> for &Expression<V> {
    type Null = NotNull;

    fn into_expression(self) -> Expression<()> {
        self.clone().untyped()
    }
}

impl<V: Value> Operand<V> for &Expression<Option<V>> {
    type Null = Null;

    fn into_expression(self) -> Expression<()> {
        self.clone().untyped()
    }
}

impl Operand<String> for &str {
    type Null = NotNull;

    fn into_expression(self) -> Expression<()> {
        Expression::value(String::from(self)).untyped()
    }
}

// ============================================================================
// Expressible
// ============================================================================

/// Anything that renders as an untyped expression.
///
/// Lets heterogeneous columns share a slice: `&[&id, &email]`.
pub trait Expressible {
    /// Returns the untyped expression.
    fn expression(&self) -> Expression<()>;
}

impl<T> Expressible for Expression<T> {
    fn expression(&self) -> Expression<()> {
        self.clone().untyped()
    }
}

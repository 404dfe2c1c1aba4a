//! Comparisons, predicates and SQLite core functions.
//!
//! Methods are grouped by the value type they apply to; the result type
//! follows the receiver's nullability.

use std::fmt;
use std::ops::{Range, RangeInclusive};

use crate::expression::{
    infix, wrap, Expressible, Expression, Lift, Lifted, Nullability, Operand, SqlType,
};
use crate::quote::quote_identifier;
use crate::value::{Number, Value};

/// Output of a comparison between `T` and operand `O`.
type Comparison<T, O> =
    Expression<Lifted<<T as SqlType>::Null, <O as Operand<<T as SqlType>::Base>>::Null, bool>>;

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn call<C>(function: &str, arguments: Vec<Expression<()>>) -> Expression<C> {
    wrap(function, Expression::join(", ", arguments))
}

// ============================================================================
// Comparisons
// ============================================================================

#[allow(clippy::should_implement_trait)]
impl<T: SqlType> Expression<T> {
    /// `lhs = rhs`, or `lhs IS ?` with a `NULL` binding when `rhs` is `None`.
    #[must_use]
    pub fn eq<O: Operand<T::Base>>(&self, rhs: O) -> Comparison<T, O> {
        if rhs.is_absent() {
            return self.compare_with_null("IS");
        }
        infix("=", self.clone(), rhs.into_expression())
    }

    /// `lhs != rhs`, or `lhs IS NOT ?` with a `NULL` binding when `rhs` is `None`.
    #[must_use]
    pub fn not_eq<O: Operand<T::Base>>(&self, rhs: O) -> Comparison<T, O> {
        if rhs.is_absent() {
            return self.compare_with_null("IS NOT");
        }
        infix("!=", self.clone(), rhs.into_expression())
    }

    /// `lhs > rhs`.
    #[must_use]
    pub fn gt<O: Operand<T::Base>>(&self, rhs: O) -> Comparison<T, O> {
        infix(">", self.clone(), rhs.into_expression())
    }

    /// `lhs >= rhs`.
    #[must_use]
    pub fn gt_eq<O: Operand<T::Base>>(&self, rhs: O) -> Comparison<T, O> {
        infix(">=", self.clone(), rhs.into_expression())
    }

    /// `lhs < rhs`.
    #[must_use]
    pub fn lt<O: Operand<T::Base>>(&self, rhs: O) -> Comparison<T, O> {
        infix("<", self.clone(), rhs.into_expression())
    }

    /// `lhs <= rhs`.
    #[must_use]
    pub fn lt_eq<O: Operand<T::Base>>(&self, rhs: O) -> Comparison<T, O> {
        infix("<=", self.clone(), rhs.into_expression())
    }

    fn compare_with_null<U>(&self, operator: &str) -> Expression<U> {
        let mut bindings = self.bindings().to_vec();
        bindings.push(None);
        Expression::literal(format!("{} {operator} ?", self.sql()), bindings)
    }

    /// `(lhs BETWEEN ? AND ?)` over a closed range.
    #[must_use]
    pub fn between(&self, range: RangeInclusive<T::Base>) -> Expression<Lift<T, bool>> {
        self.range_check("BETWEEN", range)
    }

    /// `(lhs NOT BETWEEN ? AND ?)` over a closed range.
    #[must_use]
    pub fn not_between(&self, range: RangeInclusive<T::Base>) -> Expression<Lift<T, bool>> {
        self.range_check("NOT BETWEEN", range)
    }

    fn range_check<U>(&self, operator: &str, range: RangeInclusive<T::Base>) -> Expression<U> {
        let (low, high) = range.into_inner();
        let mut bindings = self.bindings().to_vec();
        bindings.push(Some(low.to_binding()));
        bindings.push(Some(high.to_binding()));
        Expression::literal(format!("({} {operator} ? AND ?)", self.sql()), bindings)
    }

    /// `(lhs IN (?, ...))`.
    #[must_use]
    pub fn in_list<I>(&self, values: I) -> Expression<Lift<T, bool>>
    where
        I: IntoIterator<Item = T::Base>,
    {
        self.membership("IN", values)
    }

    /// `(lhs NOT IN (?, ...))`.
    #[must_use]
    pub fn not_in_list<I>(&self, values: I) -> Expression<Lift<T, bool>>
    where
        I: IntoIterator<Item = T::Base>,
    {
        self.membership("NOT IN", values)
    }

    fn membership<I, U>(&self, operator: &str, values: I) -> Expression<U>
    where
        I: IntoIterator<Item = T::Base>,
    {
        let values: Vec<_> = values.into_iter().map(|v| Some(v.to_binding())).collect();
        let list = Expression::<()>::literal(format!("({})", placeholders(values.len())), values);
        infix(operator, self.clone(), list)
    }
}

// ============================================================================
// Functions over any type
// ============================================================================

impl<T: SqlType> Expression<T> {
    /// `length(x)`.
    #[must_use]
    pub fn length(&self) -> Expression<Lift<T, i64>> {
        wrap("length", self.clone())
    }

    /// `CAST (x AS <declared type of U>)`.
    #[must_use]
    pub fn cast<U: Value>(&self) -> Expression<Lift<T, U>> {
        Expression::literal(
            format!("CAST ({} AS {})", self.sql(), U::DECLARED_DATATYPE),
            self.bindings().to_vec(),
        )
    }

    /// `typeof(x)`, the storage class name.
    #[must_use]
    pub fn type_of(&self) -> Expression<String> {
        wrap("typeof", self.clone())
    }

    /// `count(x)`.
    #[must_use]
    pub fn count(&self) -> Expression<i64> {
        wrap("count", self.clone())
    }

    /// `count(DISTINCT x)`.
    #[must_use]
    pub fn count_distinct(&self) -> Expression<i64> {
        wrap("count", self.clone().untyped().distinct_prefix())
    }

    /// `max(x)`; `NULL` over an empty set.
    #[must_use]
    pub fn max(&self) -> Expression<Option<T::Base>> {
        wrap("max", self.clone())
    }

    /// `min(x)`; `NULL` over an empty set.
    #[must_use]
    pub fn min(&self) -> Expression<Option<T::Base>> {
        wrap("min", self.clone())
    }
}

impl Expression<()> {
    fn distinct_prefix(self) -> Self {
        let (sql, bindings) = self.into_parts();
        Self::literal(format!("DISTINCT {sql}"), bindings)
    }
}

// ============================================================================
// Numeric functions and aggregates
// ============================================================================

impl<T> Expression<T>
where
    T: SqlType,
    T::Base: Number,
{
    /// `abs(x)`.
    #[must_use]
    pub fn abs(&self) -> Self {
        wrap("abs", self.clone())
    }

    /// `sum(x)`; `NULL` over an empty set.
    #[must_use]
    pub fn sum(&self) -> Expression<Option<T::Base>> {
        wrap("sum", self.clone())
    }

    /// `sum(DISTINCT x)`.
    #[must_use]
    pub fn sum_distinct(&self) -> Expression<Option<T::Base>> {
        wrap("sum", self.clone().untyped().distinct_prefix())
    }

    /// `avg(x)`; `NULL` over an empty set.
    #[must_use]
    pub fn average(&self) -> Expression<Option<f64>> {
        wrap("avg", self.clone())
    }

    /// `avg(DISTINCT x)`.
    #[must_use]
    pub fn average_distinct(&self) -> Expression<Option<f64>> {
        wrap("avg", self.clone().untyped().distinct_prefix())
    }

    /// `total(x)`; `0.0` over an empty set.
    #[must_use]
    pub fn total(&self) -> Expression<f64> {
        wrap("total", self.clone())
    }

    /// `total(DISTINCT x)`.
    #[must_use]
    pub fn total_distinct(&self) -> Expression<f64> {
        wrap("total", self.clone().untyped().distinct_prefix())
    }
}

impl<T: SqlType<Base = f64>> Expression<T> {
    /// `round(x)`.
    #[must_use]
    pub fn round(&self) -> Self {
        wrap("round", self.clone())
    }

    /// `round(x, precision)`.
    #[must_use]
    pub fn round_to(&self, precision: i64) -> Self {
        call(
            "round",
            vec![
                self.clone().untyped(),
                Expression::value(precision).untyped(),
            ],
        )
    }
}

// ============================================================================
// Boolean connectives
// ============================================================================

impl<T: SqlType<Base = bool>> Expression<T> {
    /// `(lhs AND rhs)`.
    #[must_use]
    pub fn and<O: Operand<bool>>(&self, rhs: O) -> Expression<Lifted<T::Null, O::Null, bool>> {
        infix("AND", self.clone(), rhs.into_expression())
    }

    /// `(lhs OR rhs)`.
    #[must_use]
    pub fn or<O: Operand<bool>>(&self, rhs: O) -> Expression<Lifted<T::Null, O::Null, bool>> {
        infix("OR", self.clone(), rhs.into_expression())
    }
}

// ============================================================================
// Text functions
// ============================================================================

/// A collating sequence for `COLLATE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collation {
    /// Byte-wise comparison.
    Binary,
    /// ASCII case-insensitive comparison.
    NoCase,
    /// Binary comparison ignoring trailing spaces.
    RTrim,
    /// A collation registered on the connection.
    Custom(String),
}

impl Collation {
    /// The collation name as registered with SQLite.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Binary => "BINARY",
            Self::NoCase => "NOCASE",
            Self::RTrim => "RTRIM",
            Self::Custom(name) => name,
        }
    }
}

/// Formats as a quoted identifier.
impl fmt::Display for Collation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_identifier(self.name()))
    }
}

impl<T: SqlType<Base = String>> Expression<T> {
    /// `(x LIKE pattern)`.
    #[must_use]
    pub fn like(&self, pattern: &str) -> Expression<Lift<T, bool>> {
        infix("LIKE", self.clone(), pattern.into_expression())
    }

    /// `(x LIKE pattern ESCAPE escape)`.
    #[must_use]
    pub fn like_escape(&self, pattern: &str, escape: char) -> Expression<Lift<T, bool>> {
        let pattern = Expression::<()>::join(
            " ESCAPE ",
            [
                pattern.into_expression(),
                Expression::value(escape.to_string()).untyped(),
            ],
        );
        infix("LIKE", self.clone(), pattern)
    }

    /// `(x GLOB pattern)`.
    #[must_use]
    pub fn glob(&self, pattern: &str) -> Expression<Lift<T, bool>> {
        infix("GLOB", self.clone(), pattern.into_expression())
    }

    /// `(x MATCH pattern)`, for full-text tables.
    #[must_use]
    pub fn matches(&self, pattern: &str) -> Expression<Lift<T, bool>> {
        infix("MATCH", self.clone(), pattern.into_expression())
    }

    /// `(x COLLATE "name")`.
    #[must_use]
    pub fn collate(&self, collation: &Collation) -> Self {
        infix(
            "COLLATE",
            self.clone(),
            Expression::<()>::raw(collation.to_string()),
        )
    }

    /// `lower(x)`.
    #[must_use]
    pub fn lower(&self) -> Self {
        wrap("lower", self.clone())
    }

    /// `upper(x)`.
    #[must_use]
    pub fn upper(&self) -> Self {
        wrap("upper", self.clone())
    }

    /// `ltrim(x)`.
    #[must_use]
    pub fn ltrim(&self) -> Self {
        wrap("ltrim", self.clone())
    }

    /// `ltrim(x, characters)`.
    #[must_use]
    pub fn ltrim_chars(&self, characters: &str) -> Self {
        self.with_text_arguments("ltrim", &[characters])
    }

    /// `rtrim(x)`.
    #[must_use]
    pub fn rtrim(&self) -> Self {
        wrap("rtrim", self.clone())
    }

    /// `rtrim(x, characters)`.
    #[must_use]
    pub fn rtrim_chars(&self, characters: &str) -> Self {
        self.with_text_arguments("rtrim", &[characters])
    }

    /// `trim(x)`.
    #[must_use]
    pub fn trim(&self) -> Self {
        wrap("trim", self.clone())
    }

    /// `trim(x, characters)`.
    #[must_use]
    pub fn trim_chars(&self, characters: &str) -> Self {
        self.with_text_arguments("trim", &[characters])
    }

    /// `replace(x, pattern, replacement)`.
    #[must_use]
    pub fn replace(&self, pattern: &str, replacement: &str) -> Self {
        self.with_text_arguments("replace", &[pattern, replacement])
    }

    /// `substr(x, start)`, 1-based.
    #[must_use]
    pub fn substr(&self, start: i64) -> Self {
        call(
            "substr",
            vec![self.clone().untyped(), Expression::value(start).untyped()],
        )
    }

    /// `substr(x, start, length)`, 1-based.
    #[must_use]
    pub fn substr_len(&self, start: i64, length: i64) -> Self {
        call(
            "substr",
            vec![
                self.clone().untyped(),
                Expression::value(start).untyped(),
                Expression::value(length).untyped(),
            ],
        )
    }

    /// `substr` over a half-open range of 1-based positions. An empty or
    /// reversed range selects nothing.
    #[must_use]
    pub fn substr_range(&self, range: Range<i64>) -> Self {
        let length = range.end.saturating_sub(range.start).max(0);
        self.substr_len(range.start, length)
    }

    /// `instr(x, needle)`, 0 when absent.
    #[must_use]
    pub fn instr(&self, needle: &str) -> Expression<Lift<T, i64>> {
        call(
            "instr",
            vec![self.clone().untyped(), needle.into_expression()],
        )
    }

    fn with_text_arguments(&self, function: &str, arguments: &[&str]) -> Self {
        let mut parts = vec![self.clone().untyped()];
        parts.extend(arguments.iter().map(|&a| a.into_expression()));
        call(function, parts)
    }
}

// ============================================================================
// Nullable expressions
// ============================================================================

impl<V: Value> Expression<Option<V>> {
    /// `(x IS NULL)`.
    #[must_use]
    pub fn is_null(&self) -> Expression<bool> {
        self.postfix::<()>("IS NULL").parenthesized()
    }

    /// `(x IS NOT NULL)`.
    #[must_use]
    pub fn is_not_null(&self) -> Expression<bool> {
        self.postfix::<()>("IS NOT NULL").parenthesized()
    }

    /// `ifnull(x, default)`; non-null when `default` is.
    #[must_use]
    pub fn ifnull<O: Operand<V>>(
        &self,
        default: O,
    ) -> Expression<<O::Null as Nullability>::Lift<V>> {
        call(
            "ifnull",
            vec![self.clone().untyped(), default.into_expression()],
        )
    }
}

impl Expression<()> {
    fn parenthesized<U>(self) -> Expression<U> {
        let (sql, bindings) = self.into_parts();
        Expression::literal(format!("({sql})"), bindings)
    }
}

/// `coalesce(a, b, ...)`.
#[must_use]
pub fn coalesce<V, I>(expressions: I) -> Expression<Option<V>>
where
    V: Value,
    I: IntoIterator<Item = Expression<Option<V>>>,
{
    call(
        "coalesce",
        expressions.into_iter().map(Expression::untyped).collect(),
    )
}

/// `? IS rhs` with a `NULL` binding, the left-hand form of `rhs.eq(None)`.
#[must_use]
pub fn null_eq<V: Value>(rhs: &Expression<Option<V>>) -> Expression<bool> {
    null_compare("IS", rhs)
}

/// `? IS NOT rhs` with a `NULL` binding, the left-hand form of `rhs.not_eq(None)`.
#[must_use]
pub fn null_not_eq<V: Value>(rhs: &Expression<Option<V>>) -> Expression<bool> {
    null_compare("IS NOT", rhs)
}

fn null_compare<V: Value>(operator: &str, rhs: &Expression<Option<V>>) -> Expression<bool> {
    let mut bindings = vec![None];
    bindings.extend_from_slice(rhs.bindings());
    Expression::literal(format!("? {operator} {}", rhs.sql()), bindings)
}

/// `count(*)`.
#[must_use]
pub fn count_star() -> Expression<i64> {
    Expression::raw("count(*)")
}

/// `random()`, a pseudo-random 64-bit integer.
#[must_use]
pub fn random() -> Expression<i64> {
    Expression::raw("random()")
}

/// Calls a user-defined function: `"name"(a, b, ...)`.
///
/// The name is quoted like any identifier, so registered names containing
/// spaces or punctuation resolve as written.
#[must_use]
pub fn function_call<T>(name: &str, arguments: &[&dyn Expressible]) -> Expression<T> {
    let arguments = Expression::join(", ", arguments.iter().map(|a| a.expression()));
    Expression::join(
        "",
        [
            Expression::raw(format!("{}(", quote_identifier(name))),
            arguments,
            Expression::raw(")"),
        ],
    )
    .retype()
}

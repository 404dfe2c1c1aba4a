//! Operator overloading for expressions.
//!
//! Arithmetic builds infix SQL, `+` concatenates text with `||`, and the
//! bitwise operators double as boolean `AND`/`OR`/`NOT` on `bool` operands:
//!
//! | Rust        | `i64` / `f64`  | `String` | `bool`     |
//! |-------------|----------------|----------|------------|
//! | `a + b`     | `(a + b)`      | `(a \|\| b)` |        |
//! | `a & b`     | `(a & b)`      |          | `(a AND b)` |
//! | `a \| b`    | `(a \| b)`     |          | `(a OR b)`  |
//! | `!a`        | `~(a)`         |          | `NOT (a)`   |
//!
//! Every operator accepts plain values, `Option`s and other expressions on the
//! right. The result is nullable when either side is.

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Shl, Shr, Sub};

use crate::expression::{infix, wrap, Expression, Lift, Lifted, Operand, SqlType};
use crate::value::{Number, Value};

/// Value types supporting `+`.
pub trait Additive: Value {
    /// The SQL operator `+` maps to.
    const ADD: &'static str;
}

impl Additive for i64 {
    const ADD: &'static str = "+";
}

impl Additive for f64 {
    const ADD: &'static str = "+";
}

impl Additive for String {
    const ADD: &'static str = "||";
}

/// Value types supporting `&` and `|`.
pub trait Bitwise: Value {
    /// The SQL operator `&` maps to.
    const AND: &'static str;
    /// The SQL operator `|` maps to.
    const OR: &'static str;
}

impl Bitwise for i64 {
    const AND: &'static str = "&";
    const OR: &'static str = "|";
}

impl Bitwise for bool {
    const AND: &'static str = "AND";
    const OR: &'static str = "OR";
}

/// Value types supporting `!`.
pub trait Complement: Value {
    /// The SQL prefix `!` maps to.
    const PREFIX: &'static str;
}

impl Complement for i64 {
    const PREFIX: &'static str = "~";
}

impl Complement for bool {
    const PREFIX: &'static str = "NOT ";
}

/// Integer value types, supporting `%`, shifts and `^`.
pub trait Integral: Number {}

impl Integral for i64 {}

type Base<T> = <T as SqlType>::Base;

/// Output of a binary operator between `T` and operand `O`.
type Combined<T, O> =
    Expression<Lifted<<T as SqlType>::Null, <O as Operand<Base<T>>>::Null, Base<T>>>;

pub(crate) fn exclusive_or<C>(lhs: Expression<()>, rhs: Expression<()>) -> Expression<C> {
    let both: Expression<()> = infix("&", lhs.clone(), rhs.clone());
    let either: Expression<()> = infix("|", lhs, rhs);
    infix("&", wrap::<(), ()>("~", both), either)
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $bound:ident, $op:expr) => {
        impl<T, O> $trait<O> for Expression<T>
        where
            T: SqlType,
            T::Base: $bound,
            O: Operand<T::Base>,
        {
            type Output = Combined<T, O>;

            fn $method(self, rhs: O) -> Self::Output {
                infix($op, self, rhs.into_expression())
            }
        }

        impl<T, O> $trait<O> for &Expression<T>
        where
            T: SqlType,
            T::Base: $bound,
            O: Operand<T::Base>,
        {
            type Output = Combined<T, O>;

            fn $method(self, rhs: O) -> Self::Output {
                infix($op, self.clone(), rhs.into_expression())
            }
        }
    };
}

binary_operator!(Add, add, Additive, <T::Base as Additive>::ADD);
binary_operator!(Sub, sub, Number, "-");
binary_operator!(Mul, mul, Number, "*");
binary_operator!(Div, div, Number, "/");
binary_operator!(Rem, rem, Integral, "%");
binary_operator!(Shl, shl, Integral, "<<");
binary_operator!(Shr, shr, Integral, ">>");
binary_operator!(BitAnd, bitand, Bitwise, <T::Base as Bitwise>::AND);
binary_operator!(BitOr, bitor, Bitwise, <T::Base as Bitwise>::OR);

// SQLite has no XOR operator.
impl<T, O> BitXor<O> for Expression<T>
where
    T: SqlType,
    T::Base: Integral,
    O: Operand<T::Base>,
{
    type Output = Combined<T, O>;

    fn bitxor(self, rhs: O) -> Self::Output {
        exclusive_or(self.untyped(), rhs.into_expression())
    }
}

impl<T, O> BitXor<O> for &Expression<T>
where
    T: SqlType,
    T::Base: Integral,
    O: Operand<T::Base>,
{
    type Output = Combined<T, O>;

    fn bitxor(self, rhs: O) -> Self::Output {
        exclusive_or(self.clone().untyped(), rhs.into_expression())
    }
}

impl<T> Neg for Expression<T>
where
    T: SqlType,
    T::Base: Number,
{
    type Output = Self;

    fn neg(self) -> Self {
        wrap("-", self)
    }
}

impl<T> Not for Expression<T>
where
    T: SqlType,
    T::Base: Complement,
{
    type Output = Self;

    fn not(self) -> Self {
        wrap(<T::Base as Complement>::PREFIX, self)
    }
}

// Plain values on the left-hand side.
macro_rules! scalar_left_operator {
    ($scalar:ty, $base:ty, $trait:ident, $method:ident, $op:expr) => {
        impl<T> $trait<Expression<T>> for $scalar
        where
            T: SqlType<Base = $base>,
        {
            type Output = Expression<Lift<T, $base>>;

            fn $method(self, rhs: Expression<T>) -> Self::Output {
                infix($op, Expression::<$base>::value(<$base>::from(self)), rhs)
            }
        }
    };
}

scalar_left_operator!(i64, i64, Add, add, "+");
scalar_left_operator!(i64, i64, Sub, sub, "-");
scalar_left_operator!(i64, i64, Mul, mul, "*");
scalar_left_operator!(i64, i64, Div, div, "/");
scalar_left_operator!(i64, i64, Rem, rem, "%");
scalar_left_operator!(f64, f64, Add, add, "+");
scalar_left_operator!(f64, f64, Sub, sub, "-");
scalar_left_operator!(f64, f64, Mul, mul, "*");
scalar_left_operator!(f64, f64, Div, div, "/");
scalar_left_operator!(&str, String, Add, add, "||");

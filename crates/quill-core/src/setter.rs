//! Column assignments for `INSERT` and `UPDATE`.

use crate::expression::{infix, Admits, Expression, Operand, SqlType};
use crate::operators::{exclusive_or, Additive, Bitwise, Integral};
use crate::value::Number;

/// A `column = value` assignment.
///
/// ```rust
/// use quill_core::{col, Expression};
///
/// let email: Expression<String> = col("email");
/// let setter = email.set("alice@example.com");
/// assert_eq!(setter.sql(), "\"email\" = ?");
/// ```
#[derive(Debug, Clone)]
pub struct Setter {
    column: Expression<()>,
    value: Expression<()>,
}

impl Setter {
    /// The assigned column.
    #[must_use]
    pub const fn column(&self) -> &Expression<()> {
        &self.column
    }

    /// The assigned value.
    #[must_use]
    pub const fn value(&self) -> &Expression<()> {
        &self.value
    }

    /// Renders `column = value` with the value's bindings.
    #[must_use]
    pub fn expression(&self) -> Expression<()> {
        Expression::join(" = ", [self.column.clone(), self.value.clone()])
    }

    /// The assignment SQL text.
    #[must_use]
    pub fn sql(&self) -> String {
        format!("{} = {}", self.column.sql(), self.value.sql())
    }
}

impl<T: SqlType> Expression<T> {
    /// Assigns a value, `NULL`, or another expression to this column.
    ///
    /// A non-optional column only accepts non-optional operands.
    #[must_use]
    pub fn set<O>(&self, value: O) -> Setter
    where
        O: Operand<T::Base>,
        T::Null: Admits<O::Null>,
    {
        self.assign(value.into_expression())
    }

    fn assign(&self, value: Expression<()>) -> Setter {
        Setter {
            column: self.clone().untyped(),
            value,
        }
    }

    fn assign_infix<O: Operand<T::Base>>(&self, operator: &str, rhs: O) -> Setter {
        self.assign(infix(operator, self.clone(), rhs.into_expression()))
    }
}

impl<T> Expression<T>
where
    T: SqlType,
    T::Base: Additive,
{
    /// `column = (column + value)`, or `||` for text.
    #[must_use]
    pub fn set_add<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix(<T::Base as Additive>::ADD, rhs)
    }
}

impl<T> Expression<T>
where
    T: SqlType,
    T::Base: Number,
{
    /// `column = (column - value)`.
    #[must_use]
    pub fn set_sub<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix("-", rhs)
    }

    /// `column = (column * value)`.
    #[must_use]
    pub fn set_mul<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix("*", rhs)
    }

    /// `column = (column / value)`.
    #[must_use]
    pub fn set_div<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix("/", rhs)
    }
}

impl<T> Expression<T>
where
    T: SqlType,
    T::Base: Integral,
{
    /// `column = (column % value)`.
    #[must_use]
    pub fn set_rem<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix("%", rhs)
    }

    /// `column = (column << value)`.
    #[must_use]
    pub fn set_shl<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix("<<", rhs)
    }

    /// `column = (column >> value)`.
    #[must_use]
    pub fn set_shr<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix(">>", rhs)
    }

    /// `column = (column ^ value)`, expanded as SQLite lacks XOR.
    #[must_use]
    pub fn set_bitxor<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign(exclusive_or(self.clone().untyped(), rhs.into_expression()))
    }

    /// `column = (column + 1)`.
    #[must_use]
    pub fn increment(&self) -> Setter {
        self.assign(infix("+", self.clone(), Expression::<()>::raw("1")))
    }

    /// `column = (column - 1)`.
    #[must_use]
    pub fn decrement(&self) -> Setter {
        self.assign(infix("-", self.clone(), Expression::<()>::raw("1")))
    }
}

impl<T> Expression<T>
where
    T: SqlType,
    T::Base: Bitwise,
{
    /// `column = (column & value)`, or `AND` for booleans.
    #[must_use]
    pub fn set_bitand<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix(<T::Base as Bitwise>::AND, rhs)
    }

    /// `column = (column | value)`, or `OR` for booleans.
    #[must_use]
    pub fn set_bitor<O: Operand<T::Base>>(&self, rhs: O) -> Setter {
        self.assign_infix(<T::Base as Bitwise>::OR, rhs)
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::col;
    use crate::value::Binding;

    use super::*;

    #[test]
    fn test_set_value() {
        let admin: Expression<bool> = col("admin");
        let setter = admin.set(true);
        assert_eq!(setter.sql(), "\"admin\" = ?");
        assert_eq!(setter.value().bindings(), &[Some(Binding::Integer(1))]);
    }

    #[test]
    fn test_set_null_on_optional_column() {
        let name: Expression<Option<String>> = col("name");
        let setter = name.set(None);
        assert_eq!(setter.expression().sql(), "\"name\" = ?");
        assert_eq!(setter.expression().bindings(), &[None]);

        let setter = name.set("Alice");
        assert_eq!(setter.value().bindings(), &[Some(Binding::from("Alice"))]);
    }

    #[test]
    fn test_set_from_expression() {
        let name: Expression<String> = col("name");
        let email: Expression<String> = col("email");
        assert_eq!(name.set(email.lower()).sql(), "\"name\" = lower(\"email\")");
    }

    #[test]
    fn test_compound_setters() {
        let age: Expression<i64> = col("age");
        assert_eq!(age.set_add(1).sql(), "\"age\" = (\"age\" + ?)");
        assert_eq!(age.set_sub(1).sql(), "\"age\" = (\"age\" - ?)");
        assert_eq!(age.set_mul(2).sql(), "\"age\" = (\"age\" * ?)");
        assert_eq!(age.set_div(2).sql(), "\"age\" = (\"age\" / ?)");
        assert_eq!(age.set_rem(2).sql(), "\"age\" = (\"age\" % ?)");
        assert_eq!(age.set_shl(1).sql(), "\"age\" = (\"age\" << ?)");
        assert_eq!(age.set_shr(1).sql(), "\"age\" = (\"age\" >> ?)");
        assert_eq!(age.set_bitand(1).sql(), "\"age\" = (\"age\" & ?)");
        assert_eq!(age.set_bitor(1).sql(), "\"age\" = (\"age\" | ?)");
    }

    #[test]
    fn test_text_append() {
        let name: Expression<String> = col("name");
        assert_eq!(name.set_add("!").sql(), "\"name\" = (\"name\" || ?)");
    }

    #[test]
    fn test_increment_decrement() {
        let visits: Expression<i64> = col("visits");
        assert_eq!(visits.increment().sql(), "\"visits\" = (\"visits\" + 1)");
        assert_eq!(visits.decrement().sql(), "\"visits\" = (\"visits\" - 1)");
        assert!(visits.increment().value().bindings().is_empty());
    }
}

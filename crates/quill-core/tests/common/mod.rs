#![allow(dead_code)]

use quill_core::{Binding, Expression};

/// Asserts the SQL text of an expression.
pub fn assert_sql<T>(expression: &Expression<T>, sql: &str) {
    assert_eq!(expression.sql(), sql, "unexpected SQL for {expression:?}");
}

/// Renders an expression with its bindings inlined.
pub fn inlined<T>(expression: &Expression<T>) -> String {
    expression
        .compile()
        .unwrap_or_else(|e| panic!("Failed to compile {expression:?}: {e}"))
}

pub fn int(n: i64) -> Option<Binding> {
    Some(Binding::Integer(n))
}

pub fn text(s: &str) -> Option<Binding> {
    Some(Binding::from(s))
}

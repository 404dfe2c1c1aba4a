//! `SELECT` rendering.

use super::Query;
use crate::expression::{Expressible, Expression, SqlType};
use crate::functions::count_star;

fn collect(columns: &[&dyn Expressible]) -> Vec<Expression<()>> {
    columns.iter().map(|c| c.expression()).collect()
}

impl Query {
    /// Specifies the result columns; `*` when never called.
    pub fn select(mut self, columns: &[&dyn Expressible]) -> Self {
        self.columns = collect(columns);
        self
    }

    /// Sets DISTINCT.
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a GROUP BY clause.
    pub fn group_by(mut self, columns: &[&dyn Expressible]) -> Self {
        self.group_by = collect(columns);
        self
    }

    /// Adds a HAVING clause.
    pub fn having<T: SqlType<Base = bool>>(mut self, predicate: Expression<T>) -> Self {
        self.having = Some(predicate.untyped());
        self
    }

    /// Adds an ORDER BY clause; use [`Expression::asc`] and [`Expression::desc`] for direction.
    pub fn order_by(mut self, terms: &[&dyn Expressible]) -> Self {
        self.order_by = collect(terms);
        self
    }

    /// Adds a LIMIT clause.
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Adds an OFFSET clause.
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Renders the `SELECT` statement.
    #[must_use]
    pub fn statement(&self) -> Expression<()> {
        let columns = if self.columns.is_empty() {
            Expression::raw("*")
        } else {
            Expression::join(", ", self.columns.iter().cloned())
        };
        self.render(columns, true)
    }

    /// Renders `SELECT <column>` with this query's clauses, typed as the
    /// column so a single value can be decoded from it.
    #[must_use]
    pub fn select_value<T>(&self, column: &Expression<T>) -> Expression<T> {
        let (sql, bindings) = self.render(column.clone().untyped(), true).into_parts();
        Expression::literal(sql, bindings)
    }

    /// Renders `SELECT count(*)` over the filtered rows.
    #[must_use]
    pub fn count(&self) -> Expression<i64> {
        let count = count_star().untyped();
        let query = if self.distinct && !self.columns.is_empty() {
            // Counting distinct tuples needs a subquery.
            let inner = self.statement();
            Expression::join(
                "",
                [
                    Expression::raw("SELECT count(*) FROM ("),
                    inner,
                    Expression::raw(")"),
                ],
            )
        } else {
            let mut counting = self.clone();
            counting.distinct = false;
            counting.render(count, false)
        };
        let (sql, bindings) = query.into_parts();
        Expression::literal(sql, bindings)
    }

    fn render(&self, columns: Expression<()>, with_ordering: bool) -> Expression<()> {
        let select = if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        };
        let mut parts = vec![Expression::raw(select), columns];
        parts.push(Expression::raw(format!(" FROM {}", self.source())));
        parts.push(self.where_clause());

        if !self.group_by.is_empty() {
            parts.push(Expression::raw(" GROUP BY "));
            parts.push(Expression::join(", ", self.group_by.iter().cloned()));
        }
        if let Some(having) = &self.having {
            parts.push(Expression::raw(" HAVING "));
            parts.push(having.clone());
        }
        if with_ordering {
            if !self.order_by.is_empty() {
                parts.push(Expression::raw(" ORDER BY "));
                parts.push(Expression::join(", ", self.order_by.iter().cloned()));
            }
            match (self.limit, self.offset) {
                (Some(limit), Some(offset)) => {
                    parts.push(Expression::raw(format!(" LIMIT {limit} OFFSET {offset}")));
                }
                (Some(limit), None) => parts.push(Expression::raw(format!(" LIMIT {limit}"))),
                // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
                (None, Some(offset)) => {
                    parts.push(Expression::raw(format!(" LIMIT -1 OFFSET {offset}")));
                }
                (None, None) => {}
            }
        }

        Expression::join("", parts)
    }
}

//! `INSERT` rendering.

use std::fmt;

use super::Query;
use crate::expression::{Expressible, Expression};
use crate::quote::quote_identifier;
use crate::setter::Setter;

/// Conflict resolution for `INSERT OR <resolution>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// `OR REPLACE`
    Replace,
    /// `OR ROLLBACK`
    Rollback,
    /// `OR ABORT`
    Abort,
    /// `OR FAIL`
    Fail,
    /// `OR IGNORE`
    Ignore,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Replace => "REPLACE",
            Self::Rollback => "ROLLBACK",
            Self::Abort => "ABORT",
            Self::Fail => "FAIL",
            Self::Ignore => "IGNORE",
        })
    }
}

impl Query {
    /// Renders `INSERT INTO "table" (columns) VALUES (values)`.
    ///
    /// With no setters, renders `INSERT INTO "table" DEFAULT VALUES`.
    #[must_use]
    pub fn insert(&self, setters: &[Setter]) -> Expression<()> {
        self.render_insert("INSERT", setters)
    }

    /// Renders `INSERT OR <conflict> INTO ...`.
    #[must_use]
    pub fn insert_or(&self, conflict: Conflict, setters: &[Setter]) -> Expression<()> {
        self.render_insert(&format!("INSERT OR {conflict}"), setters)
    }

    /// Renders `INSERT ... ON CONFLICT (target) DO UPDATE SET ...`.
    ///
    /// With no `update` setters the conflict resolves as `DO NOTHING`.
    #[must_use]
    pub fn upsert(
        &self,
        setters: &[Setter],
        target: &[&dyn Expressible],
        update: &[Setter],
    ) -> Expression<()> {
        let target = Expression::join(", ", target.iter().map(|c| c.expression()));
        let action = if update.is_empty() {
            Expression::raw(") DO NOTHING")
        } else {
            Expression::join(
                "",
                [
                    Expression::raw(") DO UPDATE SET "),
                    Expression::join(", ", update.iter().map(Setter::expression)),
                ],
            )
        };
        Expression::join(
            "",
            [
                self.render_insert("INSERT", setters),
                Expression::raw(" ON CONFLICT ("),
                target,
                action,
            ],
        )
    }

    fn render_insert(&self, verb: &str, setters: &[Setter]) -> Expression<()> {
        let head = format!("{verb} INTO {}", quote_identifier(&self.table));
        if setters.is_empty() {
            return Expression::raw(format!("{head} DEFAULT VALUES"));
        }

        let columns = Expression::join(", ", setters.iter().map(|s| s.column().clone()));
        let values = Expression::join(", ", setters.iter().map(|s| s.value().clone()));
        Expression::join(
            "",
            [
                Expression::raw(format!("{head} (")),
                columns,
                Expression::raw(") VALUES ("),
                values,
                Expression::raw(")"),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::expression::col;
    use crate::value::Binding;

    use super::*;

    #[test]
    fn test_insert_values() {
        let email: Expression<String> = col("email");
        let admin: Expression<bool> = col("admin");
        let insert =
            Query::table("users").insert(&[email.set("alice@example.com"), admin.set(true)]);
        assert_eq!(
            insert.sql(),
            "INSERT INTO \"users\" (\"email\", \"admin\") VALUES (?, ?)"
        );
        assert_eq!(
            insert.compile().unwrap(),
            "INSERT INTO \"users\" (\"email\", \"admin\") VALUES ('alice@example.com', 1)"
        );
    }

    #[test]
    fn test_insert_default_values() {
        let insert = Query::table("timestamps").insert(&[]);
        assert_eq!(insert.sql(), "INSERT INTO \"timestamps\" DEFAULT VALUES");
        assert!(insert.bindings().is_empty());
    }

    #[test]
    fn test_insert_or_replace() {
        let id: Expression<i64> = col("id");
        let name: Expression<Option<String>> = col("name");
        let insert =
            Query::table("users").insert_or(Conflict::Replace, &[id.set(1), name.set(None)]);
        assert_eq!(
            insert.sql(),
            "INSERT OR REPLACE INTO \"users\" (\"id\", \"name\") VALUES (?, ?)"
        );
        assert_eq!(insert.bindings(), &[Some(Binding::Integer(1)), None]);
    }

    #[test]
    fn test_upsert_do_update() {
        let email: Expression<String> = col("email");
        let visits: Expression<i64> = col("visits");
        let upsert = Query::table("users").upsert(
            &[email.set("a@b.c"), visits.set(1)],
            &[&email],
            &[visits.increment()],
        );
        assert_eq!(
            upsert.sql(),
            "INSERT INTO \"users\" (\"email\", \"visits\") VALUES (?, ?) \
             ON CONFLICT (\"email\") DO UPDATE SET \"visits\" = (\"visits\" + 1)"
        );
        assert_eq!(upsert.bindings().len(), 2);
    }

    #[test]
    fn test_upsert_do_nothing() {
        let email: Expression<String> = col("email");
        let upsert = Query::table("users").upsert(&[email.set("a@b.c")], &[&email], &[]);
        assert_eq!(
            upsert.sql(),
            "INSERT INTO \"users\" (\"email\") VALUES (?) ON CONFLICT (\"email\") DO NOTHING"
        );
    }

    #[test]
    fn test_insert_expression_value() {
        let email: Expression<String> = col("email");
        let lowered = Expression::value(String::from("X")).lower();
        let insert = Query::table("users").insert(&[email.set(lowered)]);
        assert_eq!(
            insert.sql(),
            "INSERT INTO \"users\" (\"email\") VALUES (lower(?))"
        );
    }
}

//! `DELETE` rendering.

use super::Query;
use crate::expression::Expression;
use crate::quote::quote_identifier;

impl Query {
    /// Renders `DELETE FROM "table" [WHERE ...]`.
    ///
    /// Without a filter this deletes every row.
    #[must_use]
    pub fn delete(&self) -> Expression<()> {
        Expression::join(
            "",
            [
                Expression::raw(format!("DELETE FROM {}", quote_identifier(&self.table))),
                self.where_clause(),
            ],
        )
    }
}

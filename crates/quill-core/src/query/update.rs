//! `UPDATE` rendering using the typestate pattern.

use std::marker::PhantomData;

use super::Query;
use crate::expression::Expression;
use crate::quote::quote_identifier;
use crate::setter::Setter;

// Typestate markers

/// Marker: No SET clause specified yet.
pub struct NoSet;
/// Marker: SET clause has been specified.
pub struct HasSet;

/// An `UPDATE` over a [`Query`]'s table and filter.
///
/// [`build`](Update::build) is only available once at least one assignment
/// has been added.
#[must_use]
pub struct Update<Set> {
    query: Query,
    setters: Vec<Setter>,
    _state: PhantomData<Set>,
}

impl Query {
    /// Starts an `UPDATE` restricted by this query's filter.
    pub fn update(&self) -> Update<NoSet> {
        Update {
            query: self.clone(),
            setters: Vec::new(),
            _state: PhantomData,
        }
    }
}

// Transition: NoSet -> HasSet
impl Update<NoSet> {
    /// Adds the first assignment.
    pub fn set(self, setter: Setter) -> Update<HasSet> {
        Update {
            query: self.query,
            setters: vec![setter],
            _state: PhantomData,
        }
    }
}

impl Update<HasSet> {
    /// Adds another assignment.
    pub fn set(mut self, setter: Setter) -> Self {
        self.setters.push(setter);
        self
    }

    /// Renders `UPDATE "table" SET ... [WHERE ...]`.
    #[must_use]
    pub fn build(&self) -> Expression<()> {
        let table = quote_identifier(&self.query.table);
        Expression::join(
            "",
            [
                Expression::raw(format!("UPDATE {table} SET ")),
                Expression::join(", ", self.setters.iter().map(Setter::expression)),
                self.query.where_clause(),
            ],
        )
    }
}

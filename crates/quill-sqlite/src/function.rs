//! User-defined SQL functions and collations.
//!
//! Registered names are referenced in SQL as quoted identifiers, so names
//! with spaces or punctuation work:
//! [`function_call`](quill_core::function_call) and
//! [`Collation::Custom`](quill_core::Collation::Custom) quote them.

use std::cmp::Ordering;
use std::panic::UnwindSafe;

use quill_core::Binding;
use rusqlite::functions::FunctionFlags;
use tracing::debug;

use crate::connection::Connection;
use crate::convert::{from_engine, to_engine};
use crate::error::{Error, Result};

/// Longest function name SQLite accepts, in bytes.
const MAX_NAME_BYTES: usize = 255;

/// Largest fixed argument count SQLite accepts.
const MAX_ARITY: i32 = 127;

fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Configuration(format!("{kind} name is empty")));
    }
    if name.contains('\0') {
        return Err(Error::Configuration(format!(
            "{kind} name `{}` contains NUL",
            name.escape_default()
        )));
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(Error::Configuration(format!(
            "{kind} name is {} bytes, at most {MAX_NAME_BYTES} allowed",
            name.len()
        )));
    }
    Ok(())
}

impl Connection {
    /// Registers a scalar function taking `arity` arguments, or any number
    /// when `arity` is `-1`.
    ///
    /// The body receives the arguments as optional bindings (`None` for SQL
    /// `NULL`) and returns the result the same way. Registering the same name
    /// and arity again replaces the earlier function.
    ///
    /// ```rust
    /// use quill_core::{function_call, Binding, Expression};
    /// use quill_sqlite::Connection;
    ///
    /// let db = Connection::open_in_memory().unwrap();
    /// db.create_function("shout it", 1, |args| match &args[0] {
    ///     Some(Binding::Text(s)) => Some(Binding::Text(s.to_uppercase())),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// let call: Expression<Option<String>> =
    ///     function_call("shout it", &[&Expression::value(String::from("hi"))]);
    /// assert_eq!(db.evaluate(&call).unwrap().as_deref(), Some("HI"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty, overlong or
    /// NUL-containing name, an arity outside `-1..=127`, or when the engine
    /// refuses the registration.
    pub fn create_function<F>(&self, name: &str, arity: i32, body: F) -> Result<()>
    where
        F: Fn(&[Option<Binding>]) -> Option<Binding> + Send + UnwindSafe + 'static,
    {
        validate_name("function", name)?;
        if !(-1..=MAX_ARITY).contains(&arity) {
            return Err(Error::Configuration(format!(
                "function `{name}` arity {arity} is outside -1..={MAX_ARITY}"
            )));
        }

        self.engine()
            .create_scalar_function(name, arity, FunctionFlags::SQLITE_UTF8, move |ctx| {
                let arguments: Vec<Option<Binding>> = (0..ctx.len())
                    .map(|i| from_engine(ctx.get_raw(i)))
                    .collect();
                Ok(to_engine(body(&arguments).as_ref()))
            })
            .map_err(|e| Error::Configuration(format!("function `{name}`: {e}")))?;

        debug!(function = name, arity, "Registered function");
        Ok(())
    }

    /// Registers a collation for use with `COLLATE "<name>"`.
    ///
    /// The comparator must be a total order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an invalid name or when the engine
    /// refuses the registration.
    pub fn create_collation<C>(&self, name: &str, compare: C) -> Result<()>
    where
        C: Fn(&str, &str) -> Ordering + Send + UnwindSafe + 'static,
    {
        validate_name("collation", name)?;
        self.engine()
            .create_collation(name, compare)
            .map_err(|e| Error::Configuration(format!("collation `{name}`: {e}")))?;

        debug!(collation = name, "Registered collation");
        Ok(())
    }
}

//! Error types shared by the expression layer and the engine façade.

use thiserror::Error;

/// Mismatch between a statement's parameters and the values supplied for them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The number of values differs from the number of placeholders.
    #[error("statement expects {expected} binding(s), {found} supplied")]
    CountMismatch {
        /// Placeholders found in the statement.
        expected: usize,
        /// Values supplied.
        found: usize,
    },

    /// A named value does not correspond to any parameter.
    #[error("statement has no parameter named `{0}`")]
    UnknownName(String),

    /// A name was supplied more than once.
    #[error("parameter `{0}` is bound more than once")]
    DuplicateName(String),

    /// A numbered placeholder such as `?0` is outside `?1..=?32766`.
    #[error("`{0}` is not a valid parameter number")]
    InvalidIndex(String),
}

/// Failure converting a stored value back into a Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A NULL was read into a non-optional type.
    #[error("unexpected NULL value")]
    UnexpectedNull,

    /// The storage class does not match the requested type.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        /// Storage class the target type maps to.
        expected: &'static str,
        /// Storage class actually read.
        found: &'static str,
    },

    /// The storage class matched but the content could not be parsed.
    #[error("invalid {type_name} value: {message}")]
    Invalid {
        /// Target type.
        type_name: &'static str,
        /// Parser message.
        message: String,
    },

    /// A row has no column at the given position.
    #[error("no column at index {0}")]
    IndexOutOfRange(usize),

    /// A row has no column with the given name.
    #[error("no column named `{0}`")]
    UnknownColumn(String),
}

//! Storage values and the mapping from Rust types onto them.
//!
//! SQLite stores every value in one of four storage classes, modelled by
//! [`Binding`]. A Rust type participates in expressions by implementing
//! [`Value`], which names the storage [`Datatype`] it travels as and the
//! declared column type used in `CREATE TABLE`.

use std::fmt;

use crate::error::DecodeError;
use crate::expression::SqlType;
use crate::quote::quote_literal;

/// A primitive storage value.
///
/// SQL `NULL` is represented by `None` wherever a binding is optional.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit IEEE float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Blob),
}

impl Binding {
    /// Storage class name, as reported by SQLite's `typeof()`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }

    /// Returns the SQL literal for inline use (escaped).
    ///
    /// **Warning**: Prefer bound parameters. Inlining exists for tracing and
    /// for statements such as `PRAGMA` and DDL defaults that cannot be bound.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Integer(n) => format!("{n}"),
            Self::Real(f) => real_literal(*f),
            Self::Text(s) => quote_literal(s),
            Self::Blob(b) => b.to_string(),
        }
    }
}

impl From<i64> for Binding {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Binding {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<String> for Binding {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Binding {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<Blob> for Binding {
    fn from(value: Blob) -> Self {
        Self::Blob(value)
    }
}

/// Renders an optional binding as a SQL literal, `NULL` when absent.
#[must_use]
pub fn transcode(binding: Option<&Binding>) -> String {
    binding.map_or_else(|| String::from("NULL"), Binding::to_sql_inline)
}

// SQLite has no literal for infinities; out-of-range exponents overflow to them.
fn real_literal(value: f64) -> String {
    if value.is_nan() {
        String::from("NULL")
    } else if value.is_infinite() {
        String::from(if value > 0.0 { "9e999" } else { "-9e999" })
    } else {
        // Debug keeps a fractional part so the literal stays REAL.
        format!("{value:?}")
    }
}

// ============================================================================
// Blob
// ============================================================================

/// An owned byte string stored as a SQLite BLOB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Blob(Vec<u8>);

impl Blob {
    /// Wraps the given bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the blob, returning its bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Number of bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the blob holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Formats as a hex blob literal, `X'CAFE'`.
impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("X'")?;
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        f.write_str("'")
    }
}

// ============================================================================
// Datatypes
// ============================================================================

mod private {
    pub trait Sealed {}

    impl Sealed for i64 {}
    impl Sealed for f64 {}
    impl Sealed for String {}
    impl Sealed for super::Blob {}
}

/// One of the four storage classes, as a Rust type.
///
/// Sealed: only `i64`, `f64`, `String` and [`Blob`] implement it.
pub trait Datatype: private::Sealed + Sized {
    /// Wraps the value as a [`Binding`].
    fn into_storage(self) -> Binding;

    /// Extracts the value from a [`Binding`] of the matching class.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TypeMismatch`] for any other class.
    fn from_storage(binding: Binding) -> Result<Self, DecodeError>;
}

const fn mismatch(expected: &'static str, found: &Binding) -> DecodeError {
    DecodeError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

impl Datatype for i64 {
    fn into_storage(self) -> Binding {
        Binding::Integer(self)
    }

    fn from_storage(binding: Binding) -> Result<Self, DecodeError> {
        match binding {
            Binding::Integer(n) => Ok(n),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl Datatype for f64 {
    fn into_storage(self) -> Binding {
        Binding::Real(self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_storage(binding: Binding) -> Result<Self, DecodeError> {
        match binding {
            Binding::Real(f) => Ok(f),
            // Integral results of REAL expressions come back as integers.
            Binding::Integer(n) => Ok(n as Self),
            other => Err(mismatch("real", &other)),
        }
    }
}

impl Datatype for String {
    fn into_storage(self) -> Binding {
        Binding::Text(self)
    }

    fn from_storage(binding: Binding) -> Result<Self, DecodeError> {
        match binding {
            Binding::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl Datatype for Blob {
    fn into_storage(self) -> Binding {
        Binding::Blob(self)
    }

    fn from_storage(binding: Binding) -> Result<Self, DecodeError> {
        match binding {
            Binding::Blob(b) => Ok(b),
            other => Err(mismatch("blob", &other)),
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// A Rust type that maps onto exactly one storage [`Datatype`].
///
/// Implement this for domain types to use them as column types and
/// expression values:
///
/// ```rust
/// use quill_core::{DecodeError, Value};
///
/// struct Cents(i64);
///
/// impl Value for Cents {
///     type Datatype = i64;
///     const DECLARED_DATATYPE: &'static str = "INTEGER";
///
///     fn from_datatype_value(value: i64) -> Result<Self, DecodeError> {
///         Ok(Self(value))
///     }
///
///     fn datatype_value(&self) -> i64 {
///         self.0
///     }
/// }
/// ```
pub trait Value: Sized {
    /// The storage class this type travels as.
    type Datatype: Datatype;

    /// Column type used in `CREATE TABLE`.
    const DECLARED_DATATYPE: &'static str;

    /// Converts a stored value back into this type.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when the stored value is not a valid
    /// representation of this type.
    fn from_datatype_value(value: Self::Datatype) -> Result<Self, DecodeError>;

    /// Converts this value into its storage representation.
    fn datatype_value(&self) -> Self::Datatype;

    /// Converts this value into a [`Binding`].
    fn to_binding(&self) -> Binding {
        self.datatype_value().into_storage()
    }

    /// Converts this value into a [`Binding`], consuming it.
    fn into_binding(self) -> Binding {
        self.to_binding()
    }

    /// Decodes a [`Binding`] into this type.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on a storage class mismatch or when
    /// [`Value::from_datatype_value`] rejects the value.
    fn from_binding(binding: Binding) -> Result<Self, DecodeError> {
        Self::from_datatype_value(Self::Datatype::from_storage(binding)?)
    }
}

/// Marker for types usable in arithmetic.
pub trait Number: Value {}

impl Number for i64 {}
impl Number for f64 {}

impl Value for i64 {
    type Datatype = Self;
    const DECLARED_DATATYPE: &'static str = "INTEGER";

    fn from_datatype_value(value: Self) -> Result<Self, DecodeError> {
        Ok(value)
    }

    fn datatype_value(&self) -> Self {
        *self
    }
}

impl Value for i32 {
    type Datatype = i64;
    const DECLARED_DATATYPE: &'static str = "INTEGER";

    fn from_datatype_value(value: i64) -> Result<Self, DecodeError> {
        Self::try_from(value).map_err(|e| DecodeError::Invalid {
            type_name: "i32",
            message: e.to_string(),
        })
    }

    fn datatype_value(&self) -> i64 {
        i64::from(*self)
    }
}

impl Value for f64 {
    type Datatype = Self;
    const DECLARED_DATATYPE: &'static str = "REAL";

    fn from_datatype_value(value: Self) -> Result<Self, DecodeError> {
        Ok(value)
    }

    fn datatype_value(&self) -> Self {
        *self
    }
}

impl Value for String {
    type Datatype = Self;
    const DECLARED_DATATYPE: &'static str = "TEXT";

    fn from_datatype_value(value: Self) -> Result<Self, DecodeError> {
        Ok(value)
    }

    fn datatype_value(&self) -> Self {
        self.clone()
    }
}

impl Value for bool {
    type Datatype = i64;
    const DECLARED_DATATYPE: &'static str = "INTEGER";

    fn from_datatype_value(value: i64) -> Result<Self, DecodeError> {
        Ok(value != 0)
    }

    fn datatype_value(&self) -> i64 {
        i64::from(*self)
    }
}

impl Value for Blob {
    type Datatype = Self;
    const DECLARED_DATATYPE: &'static str = "BLOB";

    fn from_datatype_value(value: Self) -> Result<Self, DecodeError> {
        Ok(value)
    }

    fn datatype_value(&self) -> Self {
        self.clone()
    }
}

impl Value for Vec<u8> {
    type Datatype = Blob;
    const DECLARED_DATATYPE: &'static str = "BLOB";

    fn from_datatype_value(value: Blob) -> Result<Self, DecodeError> {
        Ok(value.into_inner())
    }

    fn datatype_value(&self) -> Blob {
        Blob::new(self.clone())
    }
}

#[cfg(feature = "chrono")]
mod chrono_values {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    use super::Value;
    use crate::error::DecodeError;

    /// Matches the format of SQLite's `date()`.
    const DATE_FORMAT: &str = "%Y-%m-%d";
    /// Matches the format of SQLite's `datetime()`, with optional fractional seconds.
    const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    fn invalid(type_name: &'static str, err: &chrono::ParseError) -> DecodeError {
        DecodeError::Invalid {
            type_name,
            message: err.to_string(),
        }
    }

    impl Value for NaiveDate {
        type Datatype = String;
        const DECLARED_DATATYPE: &'static str = "TEXT";

        fn from_datatype_value(value: String) -> Result<Self, DecodeError> {
            Self::parse_from_str(&value, DATE_FORMAT).map_err(|e| invalid("date", &e))
        }

        fn datatype_value(&self) -> String {
            self.format(DATE_FORMAT).to_string()
        }
    }

    impl Value for NaiveDateTime {
        type Datatype = String;
        const DECLARED_DATATYPE: &'static str = "TEXT";

        fn from_datatype_value(value: String) -> Result<Self, DecodeError> {
            Self::parse_from_str(&value, DATETIME_FORMAT).map_err(|e| invalid("datetime", &e))
        }

        fn datatype_value(&self) -> String {
            self.format(DATETIME_FORMAT).to_string()
        }
    }

    impl Value for DateTime<Utc> {
        type Datatype = String;
        const DECLARED_DATATYPE: &'static str = "TEXT";

        fn from_datatype_value(value: String) -> Result<Self, DecodeError> {
            DateTime::parse_from_rfc3339(&value)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| invalid("timestamp", &e))
        }

        fn datatype_value(&self) -> String {
            self.to_rfc3339()
        }
    }
}

// ============================================================================
// Bindable
// ============================================================================

/// Anything that can be supplied as a statement parameter.
///
/// Implemented for every [`SqlType`] (so `Option<V>` binds `NULL` when
/// absent), for `&str`, and for raw [`Binding`]s.
pub trait Bindable {
    /// The binding this value supplies, `None` for SQL `NULL`.
    fn binding(&self) -> Option<Binding>;
}

impl<T: SqlType> Bindable for T {
    fn binding(&self) -> Option<Binding> {
        self.to_sql()
    }
}

impl Bindable for &str {
    fn binding(&self) -> Option<Binding> {
        Some(Binding::Text(String::from(*self)))
    }
}

impl Bindable for Binding {
    fn binding(&self) -> Option<Binding> {
        Some(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_literals() {
        assert_eq!(Binding::Integer(42).to_sql_inline(), "42");
        assert_eq!(Binding::Real(1.0).to_sql_inline(), "1.0");
        assert_eq!(Binding::Real(0.25).to_sql_inline(), "0.25");
        assert_eq!(Binding::from("O'Brien").to_sql_inline(), "'O''Brien'");
        assert_eq!(
            Binding::Blob(Blob::new(vec![0xCA, 0xFE])).to_sql_inline(),
            "X'CAFE'"
        );
    }

    #[test]
    fn test_inline_special_reals() {
        assert_eq!(Binding::Real(f64::INFINITY).to_sql_inline(), "9e999");
        assert_eq!(Binding::Real(f64::NEG_INFINITY).to_sql_inline(), "-9e999");
        assert_eq!(Binding::Real(f64::NAN).to_sql_inline(), "NULL");
    }

    #[test]
    fn test_transcode_null() {
        assert_eq!(transcode(None), "NULL");
        assert_eq!(transcode(Some(&Binding::Integer(1))), "1");
    }

    #[test]
    fn test_empty_blob_literal() {
        assert_eq!(Blob::default().to_string(), "X''");
    }

    #[test]
    fn test_bool_maps_to_integer() {
        assert_eq!(true.to_binding(), Binding::Integer(1));
        assert_eq!(false.to_binding(), Binding::Integer(0));
        assert!(bool::from_binding(Binding::Integer(7)).unwrap());
    }

    #[test]
    fn test_type_mismatch() {
        let err = i64::from_binding(Binding::from("x")).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TypeMismatch {
                expected: "integer",
                found: "text"
            }
        );
    }

    #[test]
    fn test_real_accepts_integer_storage() {
        let real = f64::from_binding(Binding::Integer(3)).unwrap();
        assert!((real - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_i32_overflow_is_invalid() {
        let err = i32::from_binding(Binding::Integer(i64::MAX)).unwrap_err();
        assert!(matches!(err, DecodeError::Invalid { .. }));
        assert!(err.to_string().starts_with("invalid i32 value"));
    }

    #[test]
    fn test_bytes_round_trip_through_blob() {
        let bytes = vec![1_u8, 2, 3];
        let binding = bytes.to_binding();
        assert_eq!(binding.type_name(), "blob");
        assert_eq!(Vec::<u8>::from_binding(binding).unwrap(), bytes);
    }

    #[test]
    fn test_bindable_option() {
        assert_eq!(None::<i64>.binding(), None);
        assert_eq!(Some(5_i64).binding(), Some(Binding::Integer(5)));
        assert_eq!("hi".binding(), Some(Binding::from("hi")));
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_chrono_date_text() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(date.to_binding(), Binding::from("2024-02-29"));
        assert_eq!(
            chrono::NaiveDate::from_binding(Binding::from("2024-02-29")).unwrap(),
            date
        );
        let word = Binding::from("yesterday");
        assert!(chrono::NaiveDate::from_binding(word).is_err());
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_chrono_datetime_reads_sqlite_format() {
        let parsed =
            chrono::NaiveDateTime::from_binding(Binding::from("2024-01-02 03:04:05")).unwrap();
        assert_eq!(parsed.to_string(), "2024-01-02 03:04:05");
    }
}

//! Conversions between quill bindings and the engine's values.

use quill_core::{Binding, Blob};
use rusqlite::types::{Value as EngineValue, ValueRef};

pub fn to_engine(binding: Option<&Binding>) -> EngineValue {
    match binding {
        None => EngineValue::Null,
        Some(Binding::Integer(n)) => EngineValue::Integer(*n),
        Some(Binding::Real(f)) => EngineValue::Real(*f),
        Some(Binding::Text(s)) => EngineValue::Text(s.clone()),
        Some(Binding::Blob(b)) => EngineValue::Blob(b.as_bytes().to_vec()),
    }
}

pub fn from_engine(value: ValueRef<'_>) -> Option<Binding> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(Binding::Integer(n)),
        ValueRef::Real(f) => Some(Binding::Real(f)),
        // SQLite does not enforce UTF-8 on stored text.
        ValueRef::Text(bytes) => Some(Binding::Text(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(bytes) => Some(Binding::Blob(Blob::from(bytes))),
    }
}

//! A single "optional field" type shared by every best-effort collector.
//!
//! Telemetry counters, per-process snapshot fields and per-entry container status are all
//! read from interfaces that may vanish or be absent at any moment. Instead of each collector
//! inventing its own convention, they all report a [`Field`]: either the value that was read,
//! or [`Field::Unavailable`].
//!
//! When serialized, an unavailable field is rendered as the default of its type (the empty
//! string, `0`, ...), so the key is always present. Callers must not infer availability from
//! key presence.

use serde::{Serialize, Serializer};

/// A value that was either read successfully or could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field<T> {
    /// The value was read.
    Available(T),
    /// The underlying source could not be read.
    #[default]
    Unavailable,
}

impl<T> Field<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Field::Available(_))
    }

    pub fn is_unavailable(&self) -> bool {
        !self.is_available()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Available(v) => Field::Available(f(v)),
            Field::Unavailable => Field::Unavailable,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Field<U>) -> Field<U> {
        match self {
            Field::Available(v) => f(v),
            Field::Unavailable => Field::Unavailable,
        }
    }

    pub fn ok(self) -> Option<T> {
        self.into()
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Field::Available(v) => v,
            Field::Unavailable => default,
        }
    }
}

impl<T: Default> Field<T> {
    /// Returns the value, or the type's default when unavailable.
    pub fn value_or_default(self) -> T {
        self.unwrap_or(T::default())
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Available(v),
            None => Field::Unavailable,
        }
    }
}

impl<T> From<Field<T>> for Option<T> {
    fn from(value: Field<T>) -> Self {
        match value {
            Field::Available(v) => Some(v),
            Field::Unavailable => None,
        }
    }
}

impl<T, E> From<Result<T, E>> for Field<T> {
    fn from(value: Result<T, E>) -> Self {
        value.ok().into()
    }
}

impl<T> Serialize for Field<T>
where
    T: Serialize + Default,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Field::Available(v) => v.serialize(serializer),
            Field::Unavailable => T::default().serialize(serializer),
        }
    }
}

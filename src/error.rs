use crate::types::{TypeTag, Value};
use crate::managed::Runtime;
use core::fmt;
use thiserror::Error;

/// What the caller actually supplied when a conversion failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Found {
    Int(i64),
    Object,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Int(v) => write!(f, "integer {v}"),
            Found::Object => f.write_str("object"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("unsupported key/value type combination: {key} -> {value}")]
    Construction { key: TypeTag, value: TypeTag },

    #[error("key {0} not found")]
    KeyNotFound(i64),

    #[error("cannot convert {found} to {expected}")]
    TypeConversion { expected: TypeTag, found: Found },

    #[error("iterator exhausted")]
    IteratorExhausted,

    #[error("container changed size during iteration")]
    IteratorInvalidated,

    #[error("container is already borrowed by an outer call")]
    Busy,
}

pub type Result<T> = std::result::Result<T, MapError>;

/// A write that was refused before touching the map. Carries the caller's
/// value back out so it is dropped after the map borrow ends.
pub struct Rejected<R: Runtime> {
    pub error: MapError,
    pub value: Option<Value<R>>,
}

impl<R: Runtime> Rejected<R> {
    pub(crate) fn new(error: MapError, value: Option<Value<R>>) -> Self {
        Self { error, value }
    }
}

impl<R: Runtime> fmt::Debug for Rejected<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .field("value", &self.value)
            .finish()
    }
}

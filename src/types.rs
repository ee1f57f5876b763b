//! Type tags and the dynamic values exchanged with the host.

use crate::error::{Found, MapError};
use crate::managed::{ManagedRef, Runtime};
use core::fmt;
use core::hash::Hash;

/// Storage type of a key or value position, fixed at construction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeTag {
    Int32,
    Int64,
    Managed,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::Managed => "object",
        })
    }
}

/// A value as seen by the host: an integer or an owned object reference.
pub enum Value<R: Runtime> {
    Int(i64),
    Object(ManagedRef<R>),
}

impl<R: Runtime> Value<R> {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Object(_) => None,
        }
    }

    pub fn into_object(self) -> Option<ManagedRef<R>> {
        match self {
            Value::Object(r) => Some(r),
            Value::Int(_) => None,
        }
    }

    pub(crate) fn found(&self) -> Found {
        match self {
            Value::Int(v) => Found::Int(*v),
            Value::Object(_) => Found::Object,
        }
    }
}

impl<R: Runtime> Clone for Value<R> {
    fn clone(&self) -> Self {
        match self {
            Value::Int(v) => Value::Int(*v),
            Value::Object(r) => Value::Object(r.clone()),
        }
    }
}

// Objects compare by identity only.
impl<R: Runtime> PartialEq for Value<R> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl<R: Runtime> fmt::Debug for Value<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Object(r) => f.debug_tuple("Object").field(r).finish(),
        }
    }
}

impl<R: Runtime> From<i64> for Value<R> {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl<R: Runtime> From<ManagedRef<R>> for Value<R> {
    fn from(r: ManagedRef<R>) -> Self {
        Value::Object(r)
    }
}

/// Fixed-width integer key types.
pub trait IntKey: Copy + Eq + Hash + Into<i64> + TryFrom<i64> + 'static {
    const TAG: TypeTag;

    fn from_host(key: i64) -> Result<Self, MapError> {
        Self::try_from(key).map_err(|_| MapError::TypeConversion {
            expected: Self::TAG,
            found: Found::Int(key),
        })
    }
}

impl IntKey for i32 {
    const TAG: TypeTag = TypeTag::Int32;
}

impl IntKey for i64 {
    const TAG: TypeTag = TypeTag::Int64;
}

/// Stored value types. Conversions in and out of the host representation.
pub trait Slot<R: Runtime>: Sized + 'static {
    const TAG: TypeTag;

    /// Convert a host value for storage. On mismatch the value is handed
    /// back untouched alongside the error.
    fn from_host(value: Value<R>) -> Result<Self, (MapError, Value<R>)>;

    /// Copy out for a read. Managed values come back freshly acquired.
    fn to_host(&self) -> Value<R>;

    /// Move out on removal or overwrite.
    fn into_host(self) -> Value<R>;

    /// The managed reference held in this slot, if any.
    fn managed(&self) -> Option<&ManagedRef<R>> {
        None
    }
}

fn mismatch<R: Runtime>(expected: TypeTag, value: Value<R>) -> (MapError, Value<R>) {
    let found = value.found();
    (MapError::TypeConversion { expected, found }, value)
}

impl<R: Runtime> Slot<R> for i32 {
    const TAG: TypeTag = TypeTag::Int32;

    fn from_host(value: Value<R>) -> Result<Self, (MapError, Value<R>)> {
        match value {
            Value::Int(v) => i32::try_from(v).map_err(|_| mismatch(TypeTag::Int32, value)),
            Value::Object(_) => Err(mismatch(TypeTag::Int32, value)),
        }
    }

    fn to_host(&self) -> Value<R> {
        Value::Int(i64::from(*self))
    }

    fn into_host(self) -> Value<R> {
        Value::Int(i64::from(self))
    }
}

impl<R: Runtime> Slot<R> for i64 {
    const TAG: TypeTag = TypeTag::Int64;

    fn from_host(value: Value<R>) -> Result<Self, (MapError, Value<R>)> {
        match value {
            Value::Int(v) => Ok(v),
            Value::Object(_) => Err(mismatch(TypeTag::Int64, value)),
        }
    }

    fn to_host(&self) -> Value<R> {
        Value::Int(*self)
    }

    fn into_host(self) -> Value<R> {
        Value::Int(self)
    }
}

impl<R: Runtime> Slot<R> for ManagedRef<R> {
    const TAG: TypeTag = TypeTag::Managed;

    fn from_host(value: Value<R>) -> Result<Self, (MapError, Value<R>)> {
        match value {
            Value::Object(r) => Ok(r),
            Value::Int(_) => Err(mismatch(TypeTag::Managed, value)),
        }
    }

    fn to_host(&self) -> Value<R> {
        Value::Object(self.clone())
    }

    fn into_host(self) -> Value<R> {
        Value::Object(self)
    }

    fn managed(&self) -> Option<&ManagedRef<R>> {
        Some(self)
    }
}

//! Polymorphic map contract and the construction-time backend factory.
//!
//! Every backend is the same generic `IntMap<K, V>` instantiated for one of
//! the four legal (key, value) combinations; `new_map` picks the
//! instantiation from a pair of runtime tags and erases it behind `Map`.

use crate::error::{MapError, Rejected, Result};
use crate::int_map::{Cursor, IntMap};
use crate::managed::{ManagedRef, Runtime};
use crate::types::{IntKey, Slot, TypeTag, Value};
use core::ops::ControlFlow;

/// Object-safe storage contract shared by all backends.
pub trait Map<R: Runtime> {
    fn key_type(&self) -> TypeTag;
    fn value_type(&self) -> TypeTag;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the value under `key`; managed values come back acquired.
    fn get(&self, key: i64) -> Result<Value<R>>;

    fn contains_key(&self, key: i64) -> Result<bool>;

    /// Insert, overwrite, or (with `None`) delete. Returns the displaced
    /// value if the key was present; `Ok(None)` on a delete means the key
    /// did not exist. The caller drops whatever comes back.
    fn put(&mut self, key: i64, value: Option<Value<R>>)
        -> core::result::Result<Option<Value<R>>, Rejected<R>>;

    /// Remove all entries and hand back the values for the caller to drop.
    fn drain(&mut self) -> Vec<Value<R>>;

    fn make_iterator(&self) -> Cursor;
    fn has_next(&self, cursor: &Cursor) -> bool;
    fn next_key(&self, cursor: &mut Cursor) -> Result<i64>;

    /// Visit each stored managed reference once, without touching counts.
    fn trace(
        &self,
        visit: &mut dyn FnMut(&ManagedRef<R>) -> ControlFlow<()>,
    ) -> ControlFlow<()>;
}

impl<R, K, V> Map<R> for IntMap<K, V>
where
    R: Runtime,
    K: IntKey,
    V: Slot<R>,
{
    fn key_type(&self) -> TypeTag {
        K::TAG
    }

    fn value_type(&self) -> TypeTag {
        V::TAG
    }

    fn len(&self) -> usize {
        IntMap::len(self)
    }

    fn get(&self, key: i64) -> Result<Value<R>> {
        let k = K::from_host(key)?;
        IntMap::get(self, &k)
            .map(|v| <V as Slot<R>>::to_host(v))
            .ok_or(MapError::KeyNotFound(key))
    }

    fn contains_key(&self, key: i64) -> Result<bool> {
        let k = K::from_host(key)?;
        Ok(IntMap::contains_key(self, &k))
    }

    fn put(
        &mut self,
        key: i64,
        value: Option<Value<R>>,
    ) -> core::result::Result<Option<Value<R>>, Rejected<R>> {
        let k = match K::from_host(key) {
            Ok(k) => k,
            Err(e) => return Err(Rejected::new(e, value)),
        };
        match value {
            Some(v) => {
                let v = V::from_host(v).map_err(|(e, v)| Rejected::new(e, Some(v)))?;
                Ok(self.insert(k, v).map(<V as Slot<R>>::into_host))
            }
            None => Ok(self.remove(&k).map(|(_, v)| <V as Slot<R>>::into_host(v))),
        }
    }

    fn drain(&mut self) -> Vec<Value<R>> {
        IntMap::drain(self)
            .into_iter()
            .map(|(_, v)| <V as Slot<R>>::into_host(v))
            .collect()
    }

    fn make_iterator(&self) -> Cursor {
        self.cursor()
    }

    fn has_next(&self, cursor: &Cursor) -> bool {
        IntMap::has_next(self, cursor)
    }

    fn next_key(&self, cursor: &mut Cursor) -> Result<i64> {
        self.advance(cursor).map(Into::into)
    }

    fn trace(
        &self,
        visit: &mut dyn FnMut(&ManagedRef<R>) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        if V::TAG != TypeTag::Managed {
            return ControlFlow::Continue(());
        }
        for (_, v) in self.iter() {
            if let Some(r) = v.managed() {
                visit(r)?;
            }
        }
        ControlFlow::Continue(())
    }
}

/// Build the backend for a (key, value) tag pair.
pub fn new_map<R: Runtime>(
    key: TypeTag,
    value: TypeTag,
    capacity: usize,
) -> Result<Box<dyn Map<R>>> {
    let map: Box<dyn Map<R>> = match (key, value) {
        (TypeTag::Int32, TypeTag::Int32) => Box::new(IntMap::<i32, i32>::with_capacity(capacity)),
        (TypeTag::Int32, TypeTag::Managed) => {
            Box::new(IntMap::<i32, ManagedRef<R>>::with_capacity(capacity))
        }
        (TypeTag::Int64, TypeTag::Int64) => Box::new(IntMap::<i64, i64>::with_capacity(capacity)),
        (TypeTag::Int64, TypeTag::Managed) => {
            Box::new(IntMap::<i64, ManagedRef<R>>::with_capacity(capacity))
        }
        (key, value) => return Err(MapError::Construction { key, value }),
    };
    Ok(map)
}

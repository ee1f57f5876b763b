//! Container: the host-facing handle that owns one `Map` backend.

use crate::error::{MapError, Result};
use crate::int_map::Cursor;
use crate::managed::{ManagedRef, Runtime};
use crate::map::{new_map, Map};
use crate::types::{TypeTag, Value};
use core::cell::RefCell;
use core::ops::ControlFlow;
use std::rc::Rc;

/// Construction-time settings.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ContainerOptions {
    /// Entries to reserve up front.
    pub capacity: usize,
}

impl ContainerOptions {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

struct Inner<R: Runtime> {
    key_type: TypeTag,
    value_type: TypeTag,
    map: RefCell<Box<dyn Map<R>>>,
}

impl<R: Runtime> Drop for Inner<R> {
    fn drop(&mut self) {
        let map = self.map.get_mut();
        log::debug!(
            "dropping {} -> {} container with {} entries",
            self.key_type,
            self.value_type,
            map.len()
        );
    }
}

/// Integer-keyed map owned by a host object. Iterators share ownership of
/// the storage, so it lives until the container and all its iterators are
/// gone.
pub struct Container<R: Runtime> {
    inner: Rc<Inner<R>>,
}

impl<R: Runtime> Container<R> {
    pub fn new(key_type: TypeTag, value_type: TypeTag) -> Result<Self> {
        Self::with_options(key_type, value_type, ContainerOptions::default())
    }

    pub fn with_options(
        key_type: TypeTag,
        value_type: TypeTag,
        options: ContainerOptions,
    ) -> Result<Self> {
        let map = new_map::<R>(key_type, value_type, options.capacity).inspect_err(|e| {
            log::debug!("refusing to construct container: {e}");
        })?;
        log::debug!(
            "constructed {key_type} -> {value_type} container (capacity {})",
            options.capacity
        );
        Ok(Self {
            inner: Rc::new(Inner {
                key_type,
                value_type,
                map: RefCell::new(map),
            }),
        })
    }

    fn map(&self) -> Result<core::cell::Ref<'_, Box<dyn Map<R>>>> {
        self.inner.map.try_borrow().map_err(|_| MapError::Busy)
    }

    fn map_mut(&self) -> Result<core::cell::RefMut<'_, Box<dyn Map<R>>>> {
        self.inner.map.try_borrow_mut().map_err(|_| MapError::Busy)
    }

    pub fn key_type(&self) -> TypeTag {
        self.inner.key_type
    }

    pub fn value_type(&self) -> TypeTag {
        self.inner.value_type
    }

    /// Whether the host's cycle collector should track this container.
    pub fn is_gc_tracked(&self) -> bool {
        R::CYCLE_COLLECTING && self.inner.value_type == TypeTag::Managed
    }

    pub fn len(&self) -> usize {
        self.inner.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read `key`. A managed value is returned as a new owned reference.
    pub fn get(&self, key: i64) -> Result<Value<R>> {
        self.map()?.get(key)
    }

    /// Like `get`, but a missing key yields `default` instead of an error.
    pub fn get_or(&self, key: i64, default: Value<R>) -> Result<Value<R>> {
        match self.get(key) {
            Err(MapError::KeyNotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn contains_key(&self, key: i64) -> Result<bool> {
        self.map()?.contains_key(key)
    }

    /// Store `value` under `key`, or delete `key` when `value` is `None`.
    /// Deleting an absent key is `KeyNotFound`.
    pub fn write(&self, key: i64, value: Option<Value<R>>) -> Result<()> {
        let deleting = value.is_none();
        let outcome = self.map_mut()?.put(key, value);
        // The borrow is released here: displaced or rejected values may run
        // host code when they are dropped.
        match outcome {
            Ok(Some(displaced)) => {
                drop(displaced);
                Ok(())
            }
            Ok(None) if deleting => Err(MapError::KeyNotFound(key)),
            Ok(None) => Ok(()),
            Err(rejected) => {
                let error = rejected.error.clone();
                drop(rejected);
                Err(error)
            }
        }
    }

    pub fn set(&self, key: i64, value: impl Into<Value<R>>) -> Result<()> {
        self.write(key, Some(value.into()))
    }

    pub fn remove(&self, key: i64) -> Result<()> {
        self.write(key, None)
    }

    /// Drop every entry. Used by a cycle collector to break reference
    /// cycles running through this container.
    pub fn clear(&self) -> Result<()> {
        let drained = self.map_mut()?.drain();
        log::debug!("cleared {} entries", drained.len());
        drop(drained);
        Ok(())
    }

    /// Start iterating the current keys.
    pub fn iter(&self) -> KeyIter<R> {
        let cursor = self.inner.map.borrow().make_iterator();
        KeyIter {
            owner: Rc::clone(&self.inner),
            cursor,
            exhausted: false,
        }
    }

    /// Report each stored managed reference to `visit` exactly once, stopping
    /// at the first error. Counts are never touched.
    pub fn trace<E, F>(&self, mut visit: F) -> core::result::Result<(), E>
    where
        F: FnMut(&ManagedRef<R>) -> core::result::Result<(), E>,
    {
        // Held for the whole walk: a visitor that writes back gets `Busy`.
        let map = self.inner.map.borrow();
        log::trace!("tracing container with {} entries", map.len());
        let mut failure = None;
        let _ = map.trace(&mut |r| match visit(r) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        });
        failure.map_or(Ok(()), Err)
    }
}

impl<R: Runtime> core::fmt::Debug for Container<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Container")
            .field("key_type", &self.inner.key_type)
            .field("value_type", &self.inner.value_type)
            .field("len", &self.len())
            .finish()
    }
}

impl<'a, R: Runtime> IntoIterator for &'a Container<R> {
    type Item = Result<i64>;
    type IntoIter = KeyIter<R>;

    fn into_iter(self) -> KeyIter<R> {
        self.iter()
    }
}

/// Key iterator handle. Holds a strong reference to the container storage.
///
/// Inserting a new key, removing a key, or clearing the container
/// invalidates the iterator; the next `advance` then fails with
/// `IteratorInvalidated`. Overwriting an existing key does not.
pub struct KeyIter<R: Runtime> {
    owner: Rc<Inner<R>>,
    cursor: Cursor,
    exhausted: bool,
}

impl<R: Runtime> KeyIter<R> {
    /// Peek without advancing. An invalidated iterator reports `true` so the
    /// failure surfaces from `advance`.
    pub fn has_more(&self) -> bool {
        if self.exhausted {
            return false;
        }
        match self.owner.map.try_borrow() {
            Ok(map) => map.has_next(&self.cursor),
            Err(_) => true,
        }
    }

    /// Yield the next key. Past the end this is `IteratorExhausted`.
    pub fn advance(&mut self) -> Result<i64> {
        if self.exhausted {
            return Err(MapError::IteratorExhausted);
        }
        let map = self.owner.map.try_borrow().map_err(|_| MapError::Busy)?;
        let res = map.next_key(&mut self.cursor);
        if let Err(MapError::IteratorExhausted) = res {
            self.exhausted = true;
        }
        res
    }
}

impl<R: Runtime> Iterator for KeyIter<R> {
    type Item = Result<i64>;

    /// Fused: after an error or the last key, yields `None`.
    fn next(&mut self) -> Option<Result<i64>> {
        if !self.has_more() {
            return None;
        }
        let res = self.advance();
        if res.is_err() {
            self.exhausted = true;
        }
        Some(res)
    }
}

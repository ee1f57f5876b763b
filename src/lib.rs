//! managed-intmap: an integer-keyed map that can own references to objects
//! of an embedding, reference-counted runtime.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: give a host runtime a map whose values are either plain integers
//!   or host objects, with ownership of those objects enforced by types
//!   instead of hand-matched increments and decrements.
//! - Layers:
//!   - IntMap<K, V, S>: dense storage with a `HashTable` index and a
//!     structural version counter for fail-fast cursors.
//!   - Map<R>: object-safe contract over the four legal instantiations of
//!     IntMap (`i32`/`i64` keys, `i32`/`i64`/managed values), built by
//!     `new_map` from a pair of runtime type tags.
//!   - Container<R>: the host-facing handle. Owns one `Map`, hands out
//!     `KeyIter` handles that keep the storage alive, and exposes the
//!     trace hook for a cycle collector.
//!
//! Ownership
//! - `ManagedRef<R>` owns exactly one host reference: construction adopts or
//!   acquires, `Clone` acquires, `Drop` releases.
//! - The map is the sole long-term owner of every stored reference. Reads
//!   return a fresh `ManagedRef` the caller owns.
//! - Overwrite links the new value before the old one is handed out, so
//!   writing the same object over itself never frees it.
//!
//! Reentrancy
//! - Releasing a host reference can run arbitrary host code, including
//!   calls back into the same container. Values leaving the map (overwrite,
//!   delete, clear, rejected writes) are therefore returned from the storage
//!   layer and dropped by `Container` after its `RefCell` borrow ends.
//! - A call that does reenter while the map is borrowed gets
//!   `MapError::Busy` rather than a panic.
//!
//! Iteration policy
//! - Iterators are cursors (position + structural version), not borrows.
//!   Inserting a new key, removing a key, or clearing invalidates every open
//!   iterator and the next `advance` fails with `IteratorInvalidated`.
//!   Overwriting an existing key leaves iterators valid.
//!
//! Tracing
//! - `Container::trace` is a read-only pass that reports each stored managed
//!   value exactly once and never changes a count. Integer keys are never
//!   boxed or visited.
//!
//! Notes and non-goals
//! - Single-threaded: `Container`, `KeyIter` and `ManagedRef` are
//!   `!Send`/`!Sync`; the host serializes calls.
//! - No ordering guarantee over keys.
//! - No persistence.

mod container;
mod error;
mod int_map;
mod managed;
mod map;
mod types;

// Public surface
pub use container::{Container, ContainerOptions, KeyIter};
pub use error::{Found, MapError, Rejected, Result};
pub use int_map::{Cursor, IntMap, Iter};
pub use managed::{ManagedRef, RcRuntime, Runtime};
pub use map::{new_map, Map};
pub use types::{IntKey, Slot, TypeTag, Value};

//! Host runtime protocol and the owned handle stored in managed-value maps.
//!
//! A `ManagedRef` owns exactly one host reference: constructing one either
//! adopts a reference the caller already holds or acquires a new one, and
//! dropping it releases that reference. The container never dereferences the
//! pointee; identity comparisons are the only inspection allowed.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::rc::Rc;

/// Reference-counting protocol of an embedding runtime.
///
/// # Safety
///
/// `acquire` must add exactly one reference and `release` must drop exactly
/// one. Both are only called on pointers for which the caller holds (or, for
/// `acquire`, borrows) a live reference. `release` may free the object.
pub unsafe trait Runtime: 'static {
    /// Opaque host object type. Never read by this crate.
    type Object: ?Sized + 'static;

    /// Whether the host runs a cycle collector that needs containers to
    /// report the references they hold.
    const CYCLE_COLLECTING: bool = false;

    /// Add one reference to `obj`.
    ///
    /// # Safety
    ///
    /// `obj` must point to a live host object.
    unsafe fn acquire(obj: NonNull<Self::Object>);

    /// Drop one reference to `obj`.
    ///
    /// # Safety
    ///
    /// The caller must own the reference being dropped.
    unsafe fn release(obj: NonNull<Self::Object>);
}

/// Owning handle to a host object. Clone acquires, drop releases.
pub struct ManagedRef<R: Runtime> {
    ptr: NonNull<R::Object>,
    // !Send + !Sync: the host serializes access to its counts.
    _marker: PhantomData<(*mut (), R)>,
}

impl<R: Runtime> ManagedRef<R> {
    /// Adopt a reference the caller already owns. No count change.
    ///
    /// # Safety
    ///
    /// The caller must own one reference to `ptr` and hand it over.
    pub unsafe fn from_owned(ptr: NonNull<R::Object>) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Acquire a new reference to a borrowed object.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live host object for the duration of the call.
    pub unsafe fn from_borrowed(ptr: NonNull<R::Object>) -> Self {
        unsafe {
            R::acquire(ptr);
            Self::from_owned(ptr)
        }
    }

    /// Raw pointer for identity checks and for handing to a host visitor.
    #[inline]
    pub fn as_ptr(&self) -> NonNull<R::Object> {
        self.ptr
    }

    /// Give the owned reference back to the host without releasing it.
    pub fn into_raw(self) -> NonNull<R::Object> {
        let ptr = self.ptr;
        core::mem::forget(self);
        ptr
    }

    /// True when both handles refer to the same host object.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(self.ptr.as_ptr(), other.ptr.as_ptr())
    }
}

impl<R: Runtime> Clone for ManagedRef<R> {
    fn clone(&self) -> Self {
        // Safety: self holds a reference, so the object is alive.
        unsafe { Self::from_borrowed(self.ptr) }
    }
}

impl<R: Runtime> Drop for ManagedRef<R> {
    fn drop(&mut self) {
        // Safety: each ManagedRef owns exactly one reference.
        unsafe { R::release(self.ptr) }
    }
}

impl<R: Runtime> fmt::Debug for ManagedRef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ManagedRef").field(&self.ptr.as_ptr()).finish()
    }
}

/// Runtime whose objects are `Rc<T>` allocations; acquire and release map to
/// the strong count.
pub struct RcRuntime<T> {
    _marker: PhantomData<fn() -> T>,
}

unsafe impl<T: 'static> Runtime for RcRuntime<T> {
    type Object = T;

    unsafe fn acquire(obj: NonNull<T>) {
        unsafe { Rc::increment_strong_count(obj.as_ptr() as *const T) }
    }

    unsafe fn release(obj: NonNull<T>) {
        unsafe { Rc::decrement_strong_count(obj.as_ptr() as *const T) }
    }
}

impl<T: 'static> ManagedRef<RcRuntime<T>> {
    /// New handle sharing `rc`'s allocation (strong count +1).
    pub fn from_rc(rc: &Rc<T>) -> Self {
        Self::from(rc.clone())
    }

    /// Convert back into an `Rc`, keeping the owned strong count.
    pub fn into_rc(self) -> Rc<T> {
        let raw = self.into_raw();
        // Safety: the pointer came from Rc::into_raw and we own one count.
        unsafe { Rc::from_raw(raw.as_ptr() as *const T) }
    }
}

impl<T: 'static> From<Rc<T>> for ManagedRef<RcRuntime<T>> {
    fn from(rc: Rc<T>) -> Self {
        let raw = Rc::into_raw(rc) as *mut T;
        // Safety: Rc::into_raw never returns null and transfers one count.
        unsafe { Self::from_owned(NonNull::new_unchecked(raw)) }
    }
}

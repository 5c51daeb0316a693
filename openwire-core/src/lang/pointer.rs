//! Reference-counted shared handles.
//!
//! [`Pointer`] is the ownership wrapper that commands and connection state travel in once they
//! are shared between I/O threads and application threads. Two counting policies are provided:
//!
//! - [`AtomicCounter`] keeps the count in a block allocated next to the value and works for any
//!   type, sized or not.
//! - [`InvasiveCounter`] delegates to the wrapped type's own [`SelfCounting`] implementation, for
//!   values whose count must be shared with other subsystems.
//!
//! Both policies present the same contract: copies share one value, the value is destroyed
//! exactly once when the last handle releases it, and dereferencing an empty handle reports
//! [`OpenWireError::NullPointerAccess`] instead of exhibiting undefined behavior.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicUsize};

use crate::error::{OpenWireError, Result};

const NULL_DEREFERENCE: &str = "dereference of an empty pointer";

/// A type that manages its own reference count.
///
/// [`InvasiveCounter`] calls [`add_reference`](SelfCounting::add_reference) once for every handle
/// that starts sharing the value and [`release_reference`](SelfCounting::release_reference) once
/// for every handle that stops. The value is freed when `release_reference` reports that the last
/// reference is gone.
///
/// # Safety
///
/// `release_reference` must return `true` exactly once, when the number of releases catches up
/// with the number of additions, and `false` otherwise. If the implementing type is `Sync`, both
/// methods must update the count atomically. [`ReferenceCount`] satisfies these requirements.
pub unsafe trait SelfCounting {
    /// Records one more owner.
    fn add_reference(&self);

    /// Drops one owner, returning `true` if it was the last one.
    fn release_reference(&self) -> bool;
}

/// An atomic owner count for embedding in [`SelfCounting`] types.
///
/// Cloning a `ReferenceCount` yields a fresh zero count: a copied value starts life with no
/// owners of its own.
#[derive(Debug, Default)]
pub struct ReferenceCount(AtomicUsize);

impl ReferenceCount {
    /// Creates a count with no owners.
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Records one more owner.
    pub fn add_reference(&self) {
        self.0.fetch_add(1, atomic::Ordering::Relaxed);
    }

    /// Drops one owner, returning `true` if it was the last one.
    pub fn release_reference(&self) -> bool {
        if self.0.fetch_sub(1, atomic::Ordering::Release) == 1 {
            atomic::fence(atomic::Ordering::Acquire);
            true
        } else {
            false
        }
    }

    /// Returns the current number of owners.
    pub fn count(&self) -> usize {
        self.0.load(atomic::Ordering::Acquire)
    }
}

impl Clone for ReferenceCount {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Strategy that decides where a [`Pointer`]'s owner count lives.
pub trait CounterPolicy<T: ?Sized> {
    /// One counted reference to a heap value. Cloning adds an owner, dropping releases one.
    type Reference: Clone;

    /// Takes ownership of `value`, producing the first reference to it.
    fn adopt(value: Box<T>) -> Self::Reference;

    /// Borrows the referenced value.
    fn value(reference: &Self::Reference) -> &T;
}

/// Non-intrusive policy: the count lives in a block allocated alongside the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicCounter;

impl<T: ?Sized> CounterPolicy<T> for AtomicCounter {
    type Reference = Arc<T>;

    fn adopt(value: Box<T>) -> Arc<T> {
        Arc::from(value)
    }

    fn value(reference: &Arc<T>) -> &T {
        reference
    }
}

/// Invasive policy: the value counts itself through [`SelfCounting`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InvasiveCounter;

impl<T: ?Sized + SelfCounting> CounterPolicy<T> for InvasiveCounter {
    type Reference = InvasiveReference<T>;

    fn adopt(value: Box<T>) -> InvasiveReference<T> {
        let ptr = NonNull::from(Box::leak(value));
        // SAFETY: `ptr` was just leaked from a live box.
        unsafe { ptr.as_ref() }.add_reference();
        InvasiveReference { ptr }
    }

    fn value(reference: &InvasiveReference<T>) -> &T {
        reference.get()
    }
}

/// One owner of a [`SelfCounting`] value.
pub struct InvasiveReference<T: ?Sized + SelfCounting> {
    ptr: NonNull<T>,
}

impl<T: ?Sized + SelfCounting> InvasiveReference<T> {
    fn get(&self) -> &T {
        // SAFETY: the value stays allocated while this reference holds one of its counts.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: ?Sized + SelfCounting> Clone for InvasiveReference<T> {
    fn clone(&self) -> Self {
        self.get().add_reference();
        Self { ptr: self.ptr }
    }
}

impl<T: ?Sized + SelfCounting> Drop for InvasiveReference<T> {
    fn drop(&mut self) {
        if self.get().release_reference() {
            // SAFETY: the last count is gone and the pointer came from `Box::leak`.
            drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
        }
    }
}

// SAFETY: same requirements as `Arc<T>`: the value is shared between threads and dropped on
// whichever thread releases last.
unsafe impl<T: ?Sized + SelfCounting + Send + Sync> Send for InvasiveReference<T> {}
// SAFETY: see above.
unsafe impl<T: ?Sized + SelfCounting + Send + Sync> Sync for InvasiveReference<T> {}

/// A reference-counted, possibly empty, shared handle.
///
/// Cloning a pointer shares the value; [`reset`](Pointer::reset) or dropping releases it. The
/// pointee is not synchronized: concurrent mutation goes through a lock or
/// [`Monitor`](crate::concurrent::Monitor) held inside the pointee.
///
/// Equality and ordering compare pointees by value. Two empty pointers are equal, and an empty
/// pointer orders before any non-empty one. Use [`ByAddress`] to key containers by identity.
pub struct Pointer<T: ?Sized, C: CounterPolicy<T> = AtomicCounter> {
    reference: Option<C::Reference>,
    policy: PhantomData<fn() -> (C, Box<T>)>,
}

impl<T: ?Sized, C: CounterPolicy<T>> Pointer<T, C> {
    /// Takes ownership of an already boxed value under this pointer's counting policy.
    pub fn adopt(value: Box<T>) -> Self {
        Self {
            reference: Some(C::adopt(value)),
            policy: PhantomData,
        }
    }

    /// Returns the pointee, or `None` if the pointer is empty.
    pub fn get(&self) -> Option<&T> {
        self.reference.as_ref().map(C::value)
    }

    /// Returns the pointee or a [`NullPointerAccess`](OpenWireError::NullPointerAccess) error.
    pub fn try_deref(&self) -> Result<&T> {
        self.get()
            .ok_or(OpenWireError::NullPointerAccess(NULL_DEREFERENCE))
    }

    /// Returns `true` if the pointer holds no value.
    pub fn is_null(&self) -> bool {
        self.reference.is_none()
    }

    /// Releases the current value and optionally adopts a new one.
    ///
    /// The released value is destroyed if this was its last owner.
    pub fn reset(&mut self, value: Option<Box<T>>) {
        self.reference = value.map(C::adopt);
    }

    /// Releases the current value and adopts `value`.
    pub fn set(&mut self, value: T)
    where
        T: Sized,
    {
        self.reset(Some(Box::new(value)));
    }

    /// Releases the current value, leaving the pointer empty, and returns whether it held one.
    pub fn take(&mut self) -> bool {
        self.reference.take().is_some()
    }

    /// Returns `true` if both pointers share the same value (or are both empty).
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.address() == other.address()
    }

    fn address(&self) -> Option<*const ()> {
        self.get().map(|value| value as *const T as *const ())
    }
}

impl<T: ?Sized> Pointer<T, AtomicCounter> {
    /// Creates an empty pointer.
    pub fn null() -> Self {
        Self::default()
    }

    /// Takes ownership of `value`; the owner count starts at one.
    pub fn new(value: T) -> Self
    where
        T: Sized,
    {
        Self::adopt(Box::new(value))
    }

    /// Takes ownership of an already boxed value, which may be a trait object.
    pub fn from_box(value: Box<T>) -> Self {
        Self::adopt(value)
    }

    /// Wraps an existing `Arc` without reallocating.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            reference: Some(value),
            policy: PhantomData,
        }
    }

    /// Returns the number of pointers sharing the value, or zero for an empty pointer.
    pub fn use_count(&self) -> usize {
        self.reference.as_ref().map_or(0, Arc::strong_count)
    }

    /// Returns a mutable reference if this pointer is the only owner.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.reference.as_mut().and_then(Arc::get_mut)
    }
}

impl<T: ?Sized + SelfCounting> Pointer<T, InvasiveCounter> {
    /// Takes ownership of `value`, which counts its own owners from here on.
    pub fn new_invasive(value: T) -> Self
    where
        T: Sized,
    {
        Self::adopt(Box::new(value))
    }
}

impl<T: Clone> Pointer<T, AtomicCounter> {
    /// Returns a mutable reference, cloning the value first if it is shared.
    ///
    /// Fails with [`NullPointerAccess`](OpenWireError::NullPointerAccess) on an empty pointer.
    pub fn make_mut(&mut self) -> Result<&mut T> {
        self.reference
            .as_mut()
            .map(Arc::make_mut)
            .ok_or(OpenWireError::NullPointerAccess(NULL_DEREFERENCE))
    }
}

impl<T: ?Sized, C: CounterPolicy<T>> Clone for Pointer<T, C> {
    fn clone(&self) -> Self {
        Self {
            reference: self.reference.clone(),
            policy: PhantomData,
        }
    }
}

impl<T: ?Sized, C: CounterPolicy<T>> Default for Pointer<T, C> {
    fn default() -> Self {
        Self {
            reference: None,
            policy: PhantomData,
        }
    }
}

impl<T: ?Sized, C: CounterPolicy<T>> From<Box<T>> for Pointer<T, C> {
    fn from(value: Box<T>) -> Self {
        Self::adopt(value)
    }
}

/// Dereferences the pointee.
///
/// # Panics
///
/// Panics with an [`OpenWireError::NullPointerAccess`] payload when the pointer is empty. Use
/// [`Pointer::get`] or [`Pointer::try_deref`] where emptiness is an expected state.
impl<T: ?Sized, C: CounterPolicy<T>> Deref for Pointer<T, C> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => std::panic::panic_any(OpenWireError::NullPointerAccess(NULL_DEREFERENCE)),
        }
    }
}

impl<T: ?Sized + fmt::Debug, C: CounterPolicy<T>> fmt::Debug for Pointer<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Pointer").field(&value).finish(),
            None => f.write_str("Pointer(null)"),
        }
    }
}

impl<T: ?Sized + PartialEq, C: CounterPolicy<T>> PartialEq for Pointer<T, C> {
    fn eq(&self, other: &Self) -> bool {
        match (self.get(), other.get()) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: ?Sized + Eq, C: CounterPolicy<T>> Eq for Pointer<T, C> {}

impl<T: ?Sized + PartialOrd, C: CounterPolicy<T>> PartialOrd for Pointer<T, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.get(), other.get()) {
            (None, None) => Some(Ordering::Equal),
            (None, Some(_)) => Some(Ordering::Less),
            (Some(_), None) => Some(Ordering::Greater),
            (Some(a), Some(b)) => a.partial_cmp(b),
        }
    }
}

impl<T: ?Sized + Ord, C: CounterPolicy<T>> Ord for Pointer<T, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.get(), other.get()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl<T: ?Sized + Hash, C: CounterPolicy<T>> Hash for Pointer<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}

/// Keys a [`Pointer`] by the identity of its pointee instead of its value.
///
/// Handles sharing one value are equal; distinct values are distinct keys even when they
/// compare equal by value. The order between distinct values is arbitrary but total.
pub struct ByAddress<T: ?Sized, C: CounterPolicy<T> = AtomicCounter>(pub Pointer<T, C>);

impl<T: ?Sized, C: CounterPolicy<T>> ByAddress<T, C> {
    fn key(&self) -> usize {
        self.0.address().map_or(0, |address| address as usize)
    }
}

impl<T: ?Sized, C: CounterPolicy<T>> Clone for ByAddress<T, C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized + fmt::Debug, C: CounterPolicy<T>> fmt::Debug for ByAddress<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByAddress").field(&self.0).finish()
    }
}

impl<T: ?Sized, C: CounterPolicy<T>> PartialEq for ByAddress<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T: ?Sized, C: CounterPolicy<T>> Eq for ByAddress<T, C> {}

impl<T: ?Sized, C: CounterPolicy<T>> PartialOrd for ByAddress<T, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized, C: CounterPolicy<T>> Ord for ByAddress<T, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<T: ?Sized, C: CounterPolicy<T>> Hash for ByAddress<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

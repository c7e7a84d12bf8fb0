//! `Ref<T>`: shared, atomically reference-counted heap cell.
//!
//! Summary
//! - A `Ref` is either nil or one strong handle onto an `Arc<T>`. Clone
//!   increments the count; dropping the handle (or `drop_ref`) decrements it.
//!   The payload is freed exactly once, by whichever handle observes the
//!   count reaching zero.
//! - Reading through a nil handle raises `NilDereference`.
//! - The payload itself is shared, not synchronised: mutation through
//!   aliasing handles needs a payload type with interior mutability.
//!
//! Cycles
//! - Strong handles in a cycle keep each other alive forever. `WeakRef`
//!   breaks such cycles; it does not keep the payload alive and upgrades to
//!   nil once the last strong handle is gone.

use crate::error::RuntimeError;
use crate::panic::Unwind;
use core::fmt;
use core::ops::Deref;
use std::sync::{Arc, Weak};

pub struct Ref<T: ?Sized> {
    alloc: Option<Arc<T>>,
}

impl<T> Ref<T> {
    /// Allocate `value` with a count of one.
    pub fn new(value: T) -> Self {
        Self {
            alloc: Some(Arc::new(value)),
        }
    }
}

impl<T: ?Sized> Ref<T> {
    pub const fn nil() -> Self {
        Self { alloc: None }
    }

    pub fn from_arc(arc: Arc<T>) -> Self {
        Self { alloc: Some(arc) }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.alloc.is_none()
    }

    #[inline]
    pub fn is_real(&self) -> bool {
        self.alloc.is_some()
    }

    pub fn try_get(&self) -> Result<&T, RuntimeError> {
        self.alloc.as_deref().ok_or(RuntimeError::NilDereference)
    }

    /// Borrow the payload; raises `NilDereference` on a nil handle.
    pub fn get(&self) -> &T {
        self.try_get().or_throw()
    }

    /// Mutable access when this is the only handle (strong or weak).
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.alloc.as_mut().and_then(Arc::get_mut)
    }

    /// Current strong count; zero for nil.
    pub fn count(&self) -> usize {
        self.alloc.as_ref().map_or(0, Arc::strong_count)
    }

    /// Release this handle. The handle becomes nil; repeated calls are no-ops.
    pub fn drop_ref(&mut self) {
        self.alloc = None;
    }

    /// Identity comparison: both nil, or both handles to one allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.alloc, &other.alloc) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef {
            alloc: self.alloc.as_ref().map(Arc::downgrade),
        }
    }

    pub(crate) fn as_arc(&self) -> Option<&Arc<T>> {
        self.alloc.as_ref()
    }

    pub fn into_arc(self) -> Option<Arc<T>> {
        self.alloc
    }
}

impl<T: Clone> Ref<T> {
    /// Copy the payload out of the cell.
    pub fn load(&self) -> T {
        self.get().clone()
    }
}

impl<T: ?Sized> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            alloc: self.alloc.clone(),
        }
    }
}

impl<T: ?Sized> Default for Ref<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T: ?Sized> Deref for Ref<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get()
    }
}

impl<T> From<T> for Ref<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// Value equality: nil equals only nil.
impl<T: ?Sized + PartialEq> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.alloc, &other.alloc) {
            (None, None) => true,
            (Some(a), Some(b)) => **a == **b,
            _ => false,
        }
    }
}

impl<T: ?Sized + Eq> Eq for Ref<T> {}

impl<T: ?Sized + fmt::Display> fmt::Display for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alloc {
            None => f.write_str("nil"),
            Some(v) => fmt::Display::fmt(&**v, f),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alloc {
            None => f.write_str("Ref(nil)"),
            Some(v) => f.debug_tuple("Ref").field(&&**v).finish(),
        }
    }
}

/// Non-owning handle to a `Ref` payload.
pub struct WeakRef<T: ?Sized> {
    alloc: Option<Weak<T>>,
}

impl<T: ?Sized> WeakRef<T> {
    pub const fn nil() -> Self {
        Self { alloc: None }
    }

    /// A strong handle if the payload is still alive, otherwise nil.
    pub fn upgrade(&self) -> Ref<T> {
        Ref {
            alloc: self.alloc.as_ref().and_then(Weak::upgrade),
        }
    }

    pub fn is_live(&self) -> bool {
        self.alloc.as_ref().map_or(false, |w| w.strong_count() > 0)
    }
}

impl<T: ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        Self {
            alloc: self.alloc.clone(),
        }
    }
}

impl<T: ?Sized> Default for WeakRef<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T: ?Sized> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRef")
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panic::recover;

    #[test]
    fn clone_and_drop_track_count() {
        let a = Ref::new(5);
        assert_eq!(a.count(), 1);
        let mut b = a.clone();
        assert_eq!(a.count(), 2);
        b.drop_ref();
        assert!(b.is_nil());
        assert_eq!(a.count(), 1);
        b.drop_ref();
        assert_eq!(a.count(), 1);
    }

    #[test]
    fn nil_read_raises() {
        let r: Ref<i32> = Ref::nil();
        assert_eq!(r.try_get(), Err(RuntimeError::NilDereference));
        assert_eq!(recover(|| *r).unwrap_err(), RuntimeError::NilDereference);
    }

    #[test]
    fn equality_is_by_value() {
        let a = Ref::new(String::from("x"));
        let b = Ref::new(String::from("x"));
        assert!(a == b);
        assert!(!a.ptr_eq(&b));
        assert!(a != Ref::nil());
        assert!(Ref::<String>::nil() == Ref::nil());
    }

    #[test]
    fn display_prints_nil() {
        assert_eq!(Ref::<i32>::nil().to_string(), "nil");
        assert_eq!(Ref::new(3).to_string(), "3");
    }

    #[test]
    fn weak_upgrades_until_last_strong_drop() {
        let mut a = Ref::new(1u8);
        let w = a.downgrade();
        assert!(w.is_live());
        assert_eq!(*w.upgrade(), 1);
        a.drop_ref();
        assert!(!w.is_live());
        assert!(w.upgrade().is_nil());
    }

    #[test]
    fn get_mut_only_when_unique() {
        let mut a = Ref::new(1);
        *a.get_mut().unwrap() += 1;
        let b = a.clone();
        assert!(a.get_mut().is_none());
        assert_eq!(*b, 2);
    }
}

//! `TraitBox<M>`: a shared value seen through an interface `M`.
//!
//! Design
//! - The payload is held once, as `Ref<Erased>`, next to its `TypeOps` and
//!   a projection `&Erased -> &M` monomorphised for the concrete type. Calls
//!   through the interface go through the projection; casts go through the
//!   type table. Each box is exactly one strong handle.
//! - `Mask<T>` states that a concrete `T` can be viewed as `M`. It is a
//!   plain unsizing coercion, generated with `impl_mask!`.
//! - Equality is value equality through the payload's `TypeOps`, exactly
//!   as for `AnyBox`; two nil boxes are equal.

use crate::any_box::{self, Dynamic, Erased, TypeOps};
use crate::error::RuntimeError;
use crate::panic::Unwind;
use crate::rc_ref::Ref;
use core::fmt;
use core::ops::Deref;
use std::sync::Arc;

/// `Self` is an interface (usually `dyn Trait`) that `T` implements.
pub trait Mask<T> {
    fn mask(value: &T) -> &Self;
}

/// Implement `Mask<T>` for an interface type and each listed concrete type.
///
/// ```ignore
/// impl_mask!(dyn Shape: Circle, Square);
/// ```
#[macro_export]
macro_rules! impl_mask {
    ($mask:ty: $($t:ty),+ $(,)?) => {
        $(
            impl $crate::trait_box::Mask<$t> for $mask {
                #[inline]
                fn mask(value: &$t) -> &Self {
                    value
                }
            }
        )+
    };
}

fn view_as<M, T>(payload: &Erased) -> Option<&M>
where
    M: ?Sized + Mask<T>,
    T: Dynamic,
{
    payload.downcast_ref::<T>().map(M::mask)
}

pub struct TraitBox<M: ?Sized> {
    concrete: Ref<Erased>,
    ops: Option<TypeOps>,
    view: Option<fn(&Erased) -> Option<&M>>,
}

impl<M: ?Sized> TraitBox<M> {
    /// Box `value` behind the interface `M`.
    pub fn new<T>(value: T) -> Self
    where
        T: Dynamic,
        M: Mask<T>,
    {
        Self::from_arc(Arc::new(value))
    }

    fn from_arc<T>(arc: Arc<T>) -> Self
    where
        T: Dynamic,
        M: Mask<T>,
    {
        let concrete: Arc<Erased> = arc;
        Self {
            concrete: Ref::from_arc(concrete),
            ops: Some(TypeOps::of::<T>()),
            view: Some(view_as::<M, T>),
        }
    }

    /// View an existing handle through `M`. The payload is shared, not
    /// copied; a nil handle yields a nil box.
    pub fn from_ref<T>(r: &Ref<T>) -> Self
    where
        T: Dynamic,
        M: Mask<T>,
    {
        match r.as_arc() {
            Some(arc) => Self::from_arc(arc.clone()),
            None => Self::nil(),
        }
    }

    pub const fn nil() -> Self {
        Self {
            concrete: Ref::nil(),
            ops: None,
            view: None,
        }
    }

    /// Replace the payload with `value`.
    pub fn assign<T>(&mut self, value: T)
    where
        T: Dynamic,
        M: Mask<T>,
    {
        *self = Self::new(value);
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.concrete.is_nil()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.ops.as_ref().map_or(false, TypeOps::is::<T>)
    }

    pub fn type_name(&self) -> Option<&'static str> {
        self.ops.as_ref().map(TypeOps::type_name)
    }

    pub fn try_get(&self) -> Result<&M, RuntimeError> {
        let payload = self.concrete.try_get()?;
        self.view
            .and_then(|view| view(payload))
            .ok_or(RuntimeError::NilDereference)
    }

    /// The payload through its interface; raises `NilDereference` when nil.
    pub fn get(&self) -> &M {
        self.try_get().or_throw()
    }

    pub fn try_cast<T: Dynamic + Clone>(&self) -> Result<T, RuntimeError> {
        self.try_cast_ref::<T>().map(|r| r.load())
    }

    pub fn cast<T: Dynamic + Clone>(&self) -> T {
        self.try_cast().or_throw()
    }

    /// An owning handle to the concrete payload; the count is incremented.
    pub fn try_cast_ref<T: Dynamic>(&self) -> Result<Ref<T>, RuntimeError> {
        any_box::downcast_ref(&self.concrete, self.ops.as_ref())
    }

    pub fn cast_ref<T: Dynamic>(&self) -> Ref<T> {
        self.try_cast_ref().or_throw()
    }

    /// Number of boxes and handles sharing the payload.
    pub fn count(&self) -> usize {
        self.concrete.count()
    }

    pub fn equals(&self, other: &Self) -> bool {
        any_box::erased_eq(
            &self.concrete,
            self.ops.as_ref(),
            &other.concrete,
            other.ops.as_ref(),
        )
    }
}

impl<M: ?Sized> Clone for TraitBox<M> {
    fn clone(&self) -> Self {
        Self {
            concrete: self.concrete.clone(),
            ops: self.ops,
            view: self.view,
        }
    }
}

impl<M: ?Sized> Default for TraitBox<M> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<M: ?Sized> Deref for TraitBox<M> {
    type Target = M;

    fn deref(&self) -> &M {
        self.get()
    }
}

impl<M: ?Sized> PartialEq for TraitBox<M> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<M: ?Sized> fmt::Display for TraitBox<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.concrete.try_get(), &self.ops) {
            (Ok(d), Some(ops)) => f.write_str(&ops.render(d)),
            _ => f.write_str("<nil>"),
        }
    }
}

impl<M: ?Sized> fmt::Debug for TraitBox<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ops {
            Some(ops) => write!(f, "TraitBox({}: {})", ops.type_name(), self),
            None => f.write_str("TraitBox(<nil>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape: Send + Sync {
        fn area(&self) -> f64;
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Square(f64);

    #[derive(Clone, Debug, PartialEq)]
    struct Circle(f64);

    impl Shape for Square {
        fn area(&self) -> f64 {
            self.0 * self.0
        }
    }

    impl Shape for Circle {
        fn area(&self) -> f64 {
            3.0 * self.0 * self.0
        }
    }

    impl fmt::Display for Square {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "square({})", self.0)
        }
    }

    impl fmt::Display for Circle {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "circle({})", self.0)
        }
    }

    crate::impl_mask!(dyn Shape: Square, Circle);

    #[test]
    fn calls_through_interface() {
        let s: TraitBox<dyn Shape> = TraitBox::new(Square(2.0));
        assert_eq!(s.area(), 4.0);
        assert_eq!(s.to_string(), "square(2)");
    }

    #[test]
    fn cast_checks_concrete_type() {
        let s: TraitBox<dyn Shape> = TraitBox::new(Circle(1.0));
        assert_eq!(s.cast::<Circle>(), Circle(1.0));
        assert!(matches!(
            s.try_cast::<Square>(),
            Err(RuntimeError::IncompatibleType { .. })
        ));
        let nil: TraitBox<dyn Shape> = TraitBox::nil();
        assert_eq!(nil.try_cast::<Circle>(), Err(RuntimeError::NilDereference));
    }

    #[test]
    fn cast_ref_shares_payload() {
        let s: TraitBox<dyn Shape> = TraitBox::new(Square(3.0));
        assert_eq!(s.count(), 1);
        let r = s.cast_ref::<Square>();
        assert_eq!(s.count(), 2);
        drop(s);
        assert_eq!(r.count(), 1);
        assert_eq!(*r, Square(3.0));
    }

    #[test]
    fn from_ref_aliases() {
        let r = Ref::new(Circle(2.0));
        let b: TraitBox<dyn Shape> = TraitBox::from_ref(&r);
        assert_eq!(r.count(), 2);
        assert_eq!(b.area(), 12.0);
        let nil: TraitBox<dyn Shape> = TraitBox::from_ref(&Ref::<Circle>::nil());
        assert!(nil.is_nil());
    }

    #[test]
    fn equality_is_by_value() {
        let a: TraitBox<dyn Shape> = TraitBox::new(Square(1.0));
        let b: TraitBox<dyn Shape> = TraitBox::new(Square(1.0));
        let c: TraitBox<dyn Shape> = TraitBox::new(Circle(1.0));
        assert!(a == b);
        assert!(a != c);
        assert!(TraitBox::<dyn Shape>::nil() == TraitBox::nil());
        assert!(a != TraitBox::nil());
    }
}

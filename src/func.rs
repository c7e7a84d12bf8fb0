//! `Func<F>`: a nil-able, shared function value.
//!
//! Calling a nil `Func` raises `NilDereference`, the same error as reading
//! through a nil `Ref`. Cloning shares the callable.
//!
//! Arguments are passed as a tuple so one `call` covers every arity that
//! `Callable` is implemented for (zero to four).

use crate::error::RuntimeError;
use crate::panic::Unwind;
use core::fmt;
use std::sync::Arc;

/// Invocation with a tuple of arguments.
pub trait Callable<Args> {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident: $ty:ident),*) => {
        impl<G, R, $($ty),*> Callable<($($ty,)*)> for G
        where
            G: ?Sized + Fn($($ty),*) -> R,
        {
            type Output = R;

            #[inline]
            fn invoke(&self, ($($arg,)*): ($($ty,)*)) -> R {
                self($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(a: A);
impl_callable!(a: A, b: B);
impl_callable!(a: A, b: B, c: C);
impl_callable!(a: A, b: B, c: C, d: D);

pub struct Func<F: ?Sized> {
    f: Option<Arc<F>>,
}

impl<F> Func<F> {
    pub fn new(f: F) -> Self {
        Self {
            f: Some(Arc::new(f)),
        }
    }
}

impl<F: ?Sized> Func<F> {
    pub const fn nil() -> Self {
        Self { f: None }
    }

    /// Wrap a shared callable, typically an `Arc<dyn Fn(..) + Send + Sync>`.
    pub fn from_arc(f: Arc<F>) -> Self {
        Self { f: Some(f) }
    }

    /// `f == nil`.
    #[inline]
    pub fn is_nil(&self) -> bool {
        self.f.is_none()
    }

    /// `f = nil`.
    pub fn clear(&mut self) {
        self.f = None;
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.f, &other.f) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn try_get(&self) -> Result<&F, RuntimeError> {
        self.f.as_deref().ok_or(RuntimeError::NilDereference)
    }

    pub fn get(&self) -> &F {
        self.try_get().or_throw()
    }

    pub fn try_call<A>(&self, args: A) -> Result<<F as Callable<A>>::Output, RuntimeError>
    where
        F: Callable<A>,
    {
        Ok(self.try_get()?.invoke(args))
    }

    /// Call with `args`; raises `NilDereference` when nil.
    pub fn call<A>(&self, args: A) -> <F as Callable<A>>::Output
    where
        F: Callable<A>,
    {
        self.get().invoke(args)
    }
}

impl<F: ?Sized> Clone for Func<F> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<F: ?Sized> Default for Func<F> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<F: ?Sized> fmt::Debug for Func<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.f {
            None => f.write_str("Func(nil)"),
            Some(_) => f.write_str("Func(<fn>)"),
        }
    }
}

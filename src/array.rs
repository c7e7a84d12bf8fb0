//! `Array<T, N>`: fixed-size value array.
//!
//! Arrays are values: cloning copies the elements. Slicing an array copies
//! the selected range into a fresh `Slice`, so the result never aliases.

use crate::error::RuntimeError;
use crate::panic::Unwind;
use crate::slice::Slice;
use core::fmt;
use core::ops::{Deref, DerefMut};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Array<T, const N: usize> {
    items: [T; N],
}

impl<T, const N: usize> Array<T, N> {
    pub const fn new(items: [T; N]) -> Self {
        Self { items }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    fn check_index(index: isize) -> Result<usize, RuntimeError> {
        if index < 0 || index as usize >= N {
            return Err(RuntimeError::IndexOutOfRange { index, len: N });
        }
        Ok(index as usize)
    }

    pub fn try_set(&mut self, index: isize, value: T) -> Result<(), RuntimeError> {
        let i = Self::check_index(index)?;
        self.items[i] = value;
        Ok(())
    }

    pub fn set(&mut self, index: isize, value: T) {
        self.try_set(index, value).or_throw()
    }

    pub fn into_inner(self) -> [T; N] {
        self.items
    }
}

impl<T: Clone, const N: usize> Array<T, N> {
    pub fn try_get(&self, index: isize) -> Result<T, RuntimeError> {
        let i = Self::check_index(index)?;
        Ok(self.items[i].clone())
    }

    pub fn get(&self, index: isize) -> T {
        self.try_get(index).or_throw()
    }

    pub fn try_slice(&self, lo: isize, hi: isize) -> Result<Slice<T>, RuntimeError> {
        if lo < 0 || hi < 0 || lo > hi || hi as usize > N {
            return Err(RuntimeError::SliceOutOfRange {
                start: lo,
                end: hi,
                cap: N,
            });
        }
        Ok(Slice::from(&self.items[lo as usize..hi as usize]))
    }

    /// Copy of elements `[lo, hi)` as a new slice; empty ranges give nil.
    pub fn slice(&self, lo: isize, hi: isize) -> Slice<T> {
        self.try_slice(lo, hi).or_throw()
    }

    pub fn to_slice(&self) -> Slice<T> {
        Slice::from(&self.items[..])
    }
}

impl<T: Default, const N: usize> Default for Array<T, N> {
    fn default() -> Self {
        Self {
            items: core::array::from_fn(|_| T::default()),
        }
    }
}

impl<T, const N: usize> From<[T; N]> for Array<T, N> {
    fn from(items: [T; N]) -> Self {
        Self::new(items)
    }
}

impl<T, const N: usize> Deref for Array<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T, const N: usize> DerefMut for Array<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<T: fmt::Display, const N: usize> fmt::Display for Array<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            fmt::Display::fmt(item, f)?;
        }
        f.write_str("]")
    }
}

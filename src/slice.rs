//! `Slice<T>`: bounds-checked views over a shared, growable buffer.
//!
//! Layers
//! - `Segment<T>`: one backing buffer, refcounted through `Ref`, with an id
//!   used only for diagnostics. Every element up to the view capacity is
//!   initialised.
//! - `Slice<T>`: `(segment, offset, len, cap)`. Sub-slicing shares the
//!   segment, so writes through one view are visible through every view
//!   that overlaps it.
//!
//! Growth
//! - `push` writes in place while `len < cap`; that write lands in the
//!   shared segment and may overwrite an element another view can see.
//! - Past capacity, `push` copies the visible elements into a fresh segment
//!   of exactly `len + 1` and adopts it. Other views keep the old segment,
//!   so the alias is broken from that point on.
//!
//! Concurrency
//! - Element access goes through the segment's `RwLock`, so reads and
//!   writes from several threads are data-race free. Views themselves are
//!   plain values: growing one handle from two threads needs `&mut`.
//! - No caller-supplied closure runs while a segment lock is held. `update`
//!   copies the element out, applies the closure, then stores the result,
//!   so the closure may read or write the same slice. Concurrent `update`s
//!   of one element are not atomic with respect to each other.

use crate::atomic::AtomicWord;
use crate::error::RuntimeError;
use crate::panic::Unwind;
use crate::rc_ref::Ref;
use core::fmt;
use parking_lot::RwLock;
use std::sync::atomic::AtomicU64;

static NEXT_SEGMENT: AtomicU64 = AtomicU64::new(1);

struct Segment<T> {
    id: u64,
    items: RwLock<Vec<T>>,
}

impl<T> Segment<T> {
    fn new(items: Vec<T>) -> Self {
        Self {
            id: AtomicWord::add(&NEXT_SEGMENT, 1),
            items: RwLock::new(items),
        }
    }
}

/// Reserve a vector of exactly `capacity` elements or fail with
/// `AllocationFailed`.
pub(crate) fn try_vec<T>(capacity: usize) -> Result<Vec<T>, RuntimeError> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity).map_err(|_| {
        log::error!("allocation of {} elements failed", capacity);
        RuntimeError::AllocationFailed
    })?;
    Ok(v)
}

pub struct Slice<T> {
    seg: Ref<Segment<T>>,
    offset: usize,
    len: usize,
    cap: usize,
}

impl<T> Slice<T> {
    pub const fn nil() -> Self {
        Self {
            seg: Ref::nil(),
            offset: 0,
            len: 0,
            cap: 0,
        }
    }

    fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            return Self::nil();
        }
        let len = items.len();
        Self {
            seg: Ref::new(Segment::new(items)),
            offset: 0,
            len,
            cap: len,
        }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self::from_items(items)
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.seg.is_nil()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether both views share one backing segment.
    pub fn shares_buffer(&self, other: &Self) -> bool {
        self.seg.is_real() && self.seg.ptr_eq(&other.seg)
    }

    /// Run `f` over the visible elements under the segment's read lock.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        match self.seg.as_arc() {
            None => f(&[]),
            Some(seg) => {
                let items = seg.items.read_recursive();
                f(&items[self.offset..self.offset + self.len])
            }
        }
    }

    /// Run `f` over the visible elements under the segment's write lock.
    /// `f` must not touch this slice.
    fn write<R>(&self, f: impl FnOnce(&mut [T]) -> R) -> R {
        match self.seg.as_arc() {
            None => f(&mut []),
            Some(seg) => {
                let mut items = seg.items.write();
                f(&mut items[self.offset..self.offset + self.len])
            }
        }
    }

    fn check_index(&self, index: isize) -> Result<usize, RuntimeError> {
        if index < 0 || index as usize >= self.len {
            return Err(RuntimeError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(index as usize)
    }

    pub fn try_slice(&self, lo: isize, hi: isize) -> Result<Self, RuntimeError> {
        if lo < 0 || hi < 0 || lo > hi || hi as usize > self.cap {
            return Err(RuntimeError::SliceOutOfRange {
                start: lo,
                end: hi,
                cap: self.cap,
            });
        }
        let (lo, hi) = (lo as usize, hi as usize);
        Ok(Self {
            seg: self.seg.clone(),
            offset: self.offset + lo,
            len: hi - lo,
            cap: self.cap - lo,
        })
    }

    /// `s[lo:hi]`. The result aliases this slice's buffer.
    pub fn slice(&self, lo: isize, hi: isize) -> Self {
        self.try_slice(lo, hi).or_throw()
    }

    /// `s[lo:]`.
    pub fn slice_from(&self, lo: isize) -> Self {
        self.slice(lo, self.len as isize)
    }

    /// `s[:]`.
    pub fn slice_all(&self) -> Self {
        self.clone()
    }

    pub fn try_set(&self, index: isize, value: T) -> Result<(), RuntimeError> {
        let i = self.check_index(index)?;
        // The displaced value is dropped after the lock is released.
        let _old = self.write(|items| core::mem::replace(&mut items[i], value));
        Ok(())
    }

    pub fn set(&self, index: isize, value: T) {
        self.try_set(index, value).or_throw()
    }
}

impl<T: Default> Slice<T> {
    pub fn try_alloc(n: isize) -> Result<Self, RuntimeError> {
        if n <= 0 {
            return Ok(Self::nil());
        }
        let n = n as usize;
        let mut items = try_vec(n)?;
        items.resize_with(n, T::default);
        Ok(Self::from_items(items))
    }

    /// `make([]T, n)`: `n` default elements, `len == cap == n`.
    pub fn alloc(n: isize) -> Self {
        Self::try_alloc(n).or_throw()
    }
}

impl<T: Clone> Slice<T> {
    pub fn try_get(&self, index: isize) -> Result<T, RuntimeError> {
        let i = self.check_index(index)?;
        Ok(self.read(|items| items[i].clone()))
    }

    pub fn get(&self, index: isize) -> T {
        self.try_get(index).or_throw()
    }

    /// Read-modify-write of one element. `f` works on a copy taken under
    /// the read lock; the result is stored back under a short write lock.
    pub fn try_update<R>(
        &self,
        index: isize,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, RuntimeError> {
        let mut item = self.try_get(index)?;
        let out = f(&mut item);
        self.try_set(index, item)?;
        Ok(out)
    }

    pub fn update<R>(&self, index: isize, f: impl FnOnce(&mut T) -> R) -> R {
        self.try_update(index, f).or_throw()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.read(|items| items.to_vec())
    }

    /// Iterate over a snapshot of the visible elements.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.to_vec().into_iter()
    }

    pub fn try_push(&mut self, item: T) -> Result<(), RuntimeError> {
        if self.len < self.cap {
            let seg = self.seg.try_get()?;
            seg.items.write()[self.offset + self.len] = item;
            self.len += 1;
            return Ok(());
        }
        let mut items = try_vec(self.len + 1)?;
        self.read(|old| items.extend_from_slice(old));
        items.push(item);
        let seg = Segment::new(items);
        match self.seg.as_arc() {
            Some(old) => log::trace!(
                "slice grew past capacity {}: segment {} -> {}",
                self.cap,
                old.id,
                seg.id
            ),
            None => log::trace!("slice allocated segment {}", seg.id),
        }
        self.seg = Ref::new(seg);
        self.offset = 0;
        self.len += 1;
        self.cap = self.len;
        Ok(())
    }

    pub fn push(&mut self, item: T) {
        self.try_push(item).or_throw()
    }

    /// Copy `min(self.len(), src.len())` elements from `src`; returns the
    /// count. Overlapping views are handled.
    pub fn copy_from(&self, src: &Slice<T>) -> usize {
        let n = self.len.min(src.len);
        if n == 0 {
            return 0;
        }
        let mut snapshot = src.read(|items| items[..n].to_vec());
        self.write(|items| items[..n].swap_with_slice(&mut snapshot));
        n
    }

    /// A new slice holding these elements followed by `items`, in a fresh
    /// buffer.
    pub fn try_append(&self, items: &[T]) -> Result<Self, RuntimeError> {
        let mut out = try_vec(self.len + items.len())?;
        self.read(|own| out.extend_from_slice(own));
        out.extend_from_slice(items);
        Ok(Self::from_items(out))
    }

    pub fn append(&self, items: &[T]) -> Self {
        self.try_append(items).or_throw()
    }
}

/// `copy(dst, src)`.
pub fn copy<T: Clone>(dst: &Slice<T>, src: &Slice<T>) -> usize {
    dst.copy_from(src)
}

impl<T> Clone for Slice<T> {
    fn clone(&self) -> Self {
        Self {
            seg: self.seg.clone(),
            offset: self.offset,
            len: self.len,
            cap: self.cap,
        }
    }
}

impl<T> Default for Slice<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T> From<Vec<T>> for Slice<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_items(items)
    }
}

impl<T: Clone> From<&[T]> for Slice<T> {
    fn from(items: &[T]) -> Self {
        Self::from_items(items.to_vec())
    }
}

impl<T> FromIterator<T> for Slice<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

/// Element-wise equality over the visible elements.
impl<T: PartialEq> PartialEq for Slice<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        self.read(|a| other.read(|b| a == b))
    }
}

impl<T: Eq> Eq for Slice<T> {}

impl<T: PartialEq> PartialEq<[T]> for Slice<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.read(|a| a == other)
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Slice<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.read(|a| a == other.as_slice())
    }
}

impl<T: fmt::Display> fmt::Display for Slice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|items| {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                fmt::Display::fmt(item, f)?;
            }
            f.write_str("]")
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for Slice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|items| f.debug_list().entries(items.iter()).finish())
    }
}

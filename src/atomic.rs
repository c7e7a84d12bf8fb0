//! Word-sized atomic primitives.
//!
//! Every operation is sequentially consistent. `add` returns the value held
//! before the addition and wraps on overflow, matching `fetch_add`.
//!
//! Several std atomics carry inherent methods with the same names (`load`,
//! `store`, `swap`, the deprecated `compare_and_swap`), so call through the
//! trait path: `AtomicWord::load(&a)`.

use core::sync::atomic::{
    AtomicI32, AtomicI64, AtomicIsize, AtomicU32, AtomicU64, AtomicUsize, Ordering,
};

/// Atomic add/load/store/swap/compare-and-swap over one machine word.
pub trait AtomicWord {
    type Value: Copy;

    /// Add `delta` and return the previous value.
    fn add(&self, delta: Self::Value) -> Self::Value;
    fn load(&self) -> Self::Value;
    fn store(&self, value: Self::Value);
    /// Replace the value and return the previous one.
    fn swap(&self, value: Self::Value) -> Self::Value;
    /// Store `new` only if the current value equals `expected`.
    fn compare_and_swap(&self, expected: Self::Value, new: Self::Value) -> bool;
}

macro_rules! atomic_word {
    ($($atomic:ty => $value:ty),+ $(,)?) => {
        $(
            impl AtomicWord for $atomic {
                type Value = $value;

                #[inline]
                fn add(&self, delta: $value) -> $value {
                    self.fetch_add(delta, Ordering::SeqCst)
                }

                #[inline]
                fn load(&self) -> $value {
                    <$atomic>::load(self, Ordering::SeqCst)
                }

                #[inline]
                fn store(&self, value: $value) {
                    <$atomic>::store(self, value, Ordering::SeqCst)
                }

                #[inline]
                fn swap(&self, value: $value) -> $value {
                    <$atomic>::swap(self, value, Ordering::SeqCst)
                }

                #[inline]
                fn compare_and_swap(&self, expected: $value, new: $value) -> bool {
                    self.compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                }
            }
        )+
    };
}

atomic_word! {
    AtomicI32 => i32,
    AtomicI64 => i64,
    AtomicU32 => u32,
    AtomicU64 => u64,
    AtomicUsize => usize,
    AtomicIsize => isize,
}

#[cfg(test)]
mod tests {
    use super::AtomicWord;
    use std::sync::atomic::{AtomicI32, AtomicU64, AtomicUsize};

    #[test]
    fn add_returns_previous_value() {
        let a = AtomicI32::new(5);
        assert_eq!(a.add(3), 5);
        assert_eq!(AtomicWord::load(&a), 8);
        assert_eq!(a.add(-8), 8);
        assert_eq!(AtomicWord::load(&a), 0);
    }

    #[test]
    fn compare_and_swap_only_on_match() {
        let a = AtomicU64::new(1);
        assert!(!AtomicWord::compare_and_swap(&a, 2, 9));
        assert_eq!(AtomicWord::load(&a), 1);
        assert!(AtomicWord::compare_and_swap(&a, 1, 9));
        assert_eq!(AtomicWord::load(&a), 9);
    }

    #[test]
    fn swap_and_store() {
        let a = AtomicUsize::new(0);
        AtomicWord::store(&a, 4);
        assert_eq!(AtomicWord::swap(&a, 7), 4);
        assert_eq!(AtomicWord::load(&a), 7);
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let a = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        a.add(1);
                    }
                });
            }
        });
        assert_eq!(AtomicWord::load(&a), 4000);
    }
}

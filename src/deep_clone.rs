//! `DeepClone`: the language-level `clone` builtin.
//!
//! `Clone` on `Slice` and `Ref` aliases the buffer or payload. `deep_clone`
//! instead produces an independent value:
//! - `Slice`, `Array`, `Map`: fresh storage, each element deep cloned. A nil
//!   slice stays nil.
//! - `Ref`: the payload is deep cloned into a new allocation; nil stays nil.
//! - `Str` and scalars: plain copies.
//! - `Func`, `TraitBox`, `AnyBox`: the handle is copied and the payload is
//!   shared. Functions are immutable, and boxed payloads are only reachable
//!   through `&`, so sharing is not observable without interior mutability.

use crate::any_box::AnyBox;
use crate::array::Array;
use crate::func::Func;
use crate::map::{Map, MapKey};
use crate::rc_ref::Ref;
use crate::slice::Slice;
use crate::str::Str;
use crate::trait_box::TraitBox;
use core::hash::BuildHasher;

pub trait DeepClone: Sized {
    fn deep_clone(&self) -> Self;
}

/// `clone(x)`.
pub fn clone<T: DeepClone>(value: &T) -> T {
    value.deep_clone()
}

macro_rules! deep_clone_by_copy {
    ($($t:ty),+ $(,)?) => {
        $(
            impl DeepClone for $t {
                #[inline]
                fn deep_clone(&self) -> Self {
                    self.clone()
                }
            }
        )+
    };
}

deep_clone_by_copy!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char, String, Str,
);

impl<T: DeepClone> DeepClone for Slice<T> {
    fn deep_clone(&self) -> Self {
        let items: Vec<T> = self.read(|items| items.iter().map(T::deep_clone).collect());
        Slice::from_vec(items)
    }
}

impl<T: DeepClone, const N: usize> DeepClone for Array<T, N> {
    fn deep_clone(&self) -> Self {
        Array::new(core::array::from_fn(|i| self[i].deep_clone()))
    }
}

impl<K, V, S> DeepClone for Map<K, V, S>
where
    K: Eq + MapKey + DeepClone,
    V: DeepClone,
    S: BuildHasher + Clone,
{
    fn deep_clone(&self) -> Self {
        let mut out = Map::with_hasher(self.hasher().clone());
        for (k, v) in self.iter() {
            out.set(k.deep_clone(), v.deep_clone());
        }
        out
    }
}

impl<T: DeepClone> DeepClone for Ref<T> {
    fn deep_clone(&self) -> Self {
        match self.try_get() {
            Ok(value) => Ref::new(value.deep_clone()),
            Err(_) => Ref::nil(),
        }
    }
}

impl<F: ?Sized> DeepClone for Func<F> {
    fn deep_clone(&self) -> Self {
        self.clone()
    }
}

impl<M: ?Sized> DeepClone for TraitBox<M> {
    fn deep_clone(&self) -> Self {
        self.clone()
    }
}

impl DeepClone for AnyBox {
    fn deep_clone(&self) -> Self {
        self.clone()
    }
}

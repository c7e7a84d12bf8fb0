//! `AnyBox`: a type-erased, shared value with checked downcast.
//!
//! Design
//! - The payload lives behind `Ref<Erased>`, so cloning an `AnyBox` shares
//!   the value and assigning replaces the handle (the old payload is freed
//!   with its last handle).
//! - Each payload carries a `TypeOps` table captured at assignment: its
//!   `TypeId`, type name, and `eq`/`to_str` functions monomorphised for the
//!   concrete type. Equality and rendering dispatch through the table, never
//!   through names.
//! - Casts succeed only on an exact type match. A nil box raises
//!   `NilDereference`; a mismatch raises `IncompatibleType`.

use crate::error::RuntimeError;
use crate::panic::Unwind;
use crate::rc_ref::Ref;
use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

/// Type-erased payload.
pub type Erased = dyn Any + Send + Sync;

/// Values that can be stored in an `AnyBox` or `TraitBox`.
pub trait Dynamic: Any + PartialEq + fmt::Display + Send + Sync {}

impl<T> Dynamic for T where T: Any + PartialEq + fmt::Display + Send + Sync {}

/// Per-type operations recorded next to an erased payload.
#[derive(Copy, Clone)]
pub struct TypeOps {
    type_id: TypeId,
    type_name: &'static str,
    eq: fn(&Erased, &Erased) -> bool,
    to_str: fn(&Erased) -> String,
}

fn eq_as<T: Dynamic>(a: &Erased, b: &Erased) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn to_str_as<T: Dynamic>(a: &Erased) -> String {
    a.downcast_ref::<T>().map(T::to_string).unwrap_or_default()
}

impl TypeOps {
    pub fn of<T: Dynamic>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            eq: eq_as::<T>,
            to_str: to_str_as::<T>,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Values are equal only if both are this table's type and `==` agrees.
    pub fn values_eq(&self, a: &Erased, b: &Erased) -> bool {
        (self.eq)(a, b)
    }

    pub fn render(&self, a: &Erased) -> String {
        (self.to_str)(a)
    }
}

impl fmt::Debug for TypeOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeOps")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Check that an erased payload exists and has type `T`.
pub(crate) fn check_cast<T: 'static>(
    data: &Ref<Erased>,
    ops: Option<&TypeOps>,
) -> Result<(), RuntimeError> {
    let ops = match ops {
        Some(ops) if data.is_real() => ops,
        _ => return Err(RuntimeError::NilDereference),
    };
    if !ops.is::<T>() {
        return Err(RuntimeError::IncompatibleType {
            expected: core::any::type_name::<T>(),
            found: ops.type_name(),
        });
    }
    Ok(())
}

/// Downcast an erased payload to a strong handle of its concrete type.
pub(crate) fn downcast_ref<T: Dynamic>(
    data: &Ref<Erased>,
    ops: Option<&TypeOps>,
) -> Result<Ref<T>, RuntimeError> {
    check_cast::<T>(data, ops)?;
    let arc = data.as_arc().cloned().ok_or(RuntimeError::NilDereference)?;
    match arc.downcast::<T>() {
        Ok(concrete) => Ok(Ref::from_arc(concrete)),
        Err(_) => Err(RuntimeError::IncompatibleType {
            expected: core::any::type_name::<T>(),
            found: ops.map_or("<nil>", TypeOps::type_name),
        }),
    }
}

pub(crate) fn erased_eq(
    a: &Ref<Erased>,
    a_ops: Option<&TypeOps>,
    b: &Ref<Erased>,
    b_ops: Option<&TypeOps>,
) -> bool {
    match (a.try_get(), a_ops, b.try_get(), b_ops) {
        (Err(_), _, Err(_), _) => true,
        (Ok(a), Some(ao), Ok(b), Some(bo)) => ao.type_id == bo.type_id && ao.values_eq(a, b),
        _ => false,
    }
}

#[derive(Clone, Default)]
pub struct AnyBox {
    data: Ref<Erased>,
    ops: Option<TypeOps>,
}

impl AnyBox {
    pub fn new<T: Dynamic>(value: T) -> Self {
        let data: Arc<Erased> = Arc::new(value);
        Self {
            data: Ref::from_arc(data),
            ops: Some(TypeOps::of::<T>()),
        }
    }

    pub const fn nil() -> Self {
        Self {
            data: Ref::nil(),
            ops: None,
        }
    }

    /// Replace the payload with `value`.
    pub fn assign<T: Dynamic>(&mut self, value: T) {
        *self = Self::new(value);
    }

    /// Drop this handle's payload, leaving the box nil.
    pub fn clear(&mut self) {
        *self = Self::nil();
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.data.is_nil()
    }

    /// Whether the payload has exactly type `T`. False when nil.
    pub fn is<T: 'static>(&self) -> bool {
        self.ops.as_ref().map_or(false, TypeOps::is::<T>)
    }

    pub fn type_name(&self) -> Option<&'static str> {
        self.ops.as_ref().map(TypeOps::type_name)
    }

    pub fn type_ops(&self) -> Option<&TypeOps> {
        self.ops.as_ref()
    }

    pub fn try_cast<T: Dynamic + Clone>(&self) -> Result<T, RuntimeError> {
        check_cast::<T>(&self.data, self.ops.as_ref())?;
        self.data
            .try_get()?
            .downcast_ref::<T>()
            .cloned()
            .ok_or(RuntimeError::NilDereference)
    }

    /// A copy of the payload as `T`.
    pub fn cast<T: Dynamic + Clone>(&self) -> T {
        self.try_cast().or_throw()
    }

    /// A strong handle sharing the payload, typed as `T`.
    pub fn try_cast_ref<T: Dynamic>(&self) -> Result<Ref<T>, RuntimeError> {
        downcast_ref(&self.data, self.ops.as_ref())
    }

    pub fn cast_ref<T: Dynamic>(&self) -> Ref<T> {
        self.try_cast_ref().or_throw()
    }

    /// Both nil, or same concrete type with equal values.
    pub fn equals(&self, other: &AnyBox) -> bool {
        erased_eq(&self.data, self.ops.as_ref(), &other.data, other.ops.as_ref())
    }

    /// Whether the payload is a `T` equal to `value`.
    pub fn equals_value<T: Dynamic>(&self, value: &T) -> bool {
        self.data
            .try_get()
            .ok()
            .and_then(|d| d.downcast_ref::<T>())
            .map_or(false, |v| v == value)
    }
}

impl PartialEq for AnyBox {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for AnyBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.data.try_get(), &self.ops) {
            (Ok(d), Some(ops)) => f.write_str(&ops.render(d)),
            _ => f.write_str("<nil>"),
        }
    }
}

impl fmt::Debug for AnyBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ops {
            Some(ops) => write!(f, "AnyBox({}: {})", ops.type_name(), self),
            None => f.write_str("AnyBox(<nil>)"),
        }
    }
}

//! Runtime error taxonomy.
//!
//! `RuntimeError` is the single error type carried through the panic
//! channel. Each variant maps onto one `ErrorKind`; recovery points inspect
//! the kind or the message.

use crate::str::Str;
use crate::trait_box::TraitBox;
use core::fmt;
use thiserror::Error;

/// Process exit status used when a panic reaches the process boundary.
pub const EXIT_PANIC: i32 = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("invalid memory address or nil pointer dereference")]
    NilDereference,

    #[error("incompatible type: expected {expected}, found {found}")]
    IncompatibleType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("memory allocation failed")]
    AllocationFailed,

    #[error("index out of range[{index}] with length {len}")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("index out of range[{start}:{end}] with capacity {cap}")]
    SliceOutOfRange { start: isize, end: isize, cap: usize },

    #[error("divide by zero")]
    DivideByZero,

    /// A value thrown by user code, carried as its rendered message.
    #[error("{0}")]
    User(String),

    /// A value implementing the language's `Error` interface.
    #[error("{}", error_message(.0))]
    Error(TraitBox<dyn ErrorValue>),
}

/// Coarse classification used at recovery points.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    NilDereference,
    IncompatibleType,
    AllocationFailed,
    IndexOutOfRange,
    DivideByZero,
    UserPanic,
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::NilDereference => ErrorKind::NilDereference,
            RuntimeError::IncompatibleType { .. } => ErrorKind::IncompatibleType,
            RuntimeError::AllocationFailed => ErrorKind::AllocationFailed,
            RuntimeError::IndexOutOfRange { .. } | RuntimeError::SliceOutOfRange { .. } => {
                ErrorKind::IndexOutOfRange
            }
            RuntimeError::DivideByZero => ErrorKind::DivideByZero,
            RuntimeError::User(_) | RuntimeError::Error(_) => ErrorKind::UserPanic,
        }
    }

    /// Wrap this error behind the `Error` interface.
    ///
    /// Errors that already carry an interface value hand it back as is.
    pub fn into_error_value(self) -> TraitBox<dyn ErrorValue> {
        match self {
            RuntimeError::Error(value) => value,
            other => TraitBox::new(PanicError::new(other.to_string())),
        }
    }
}

fn error_message(value: &TraitBox<dyn ErrorValue>) -> Str {
    match value.try_get() {
        Ok(e) => e.error(),
        Err(_) => Str::from("<nil>"),
    }
}

/// The language's `Error` interface.
pub trait ErrorValue: Send + Sync {
    fn error(&self) -> Str;
}

/// Error value produced when a runtime panic is converted to `ErrorValue`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanicError {
    message: Str,
}

impl PanicError {
    pub fn new(message: impl Into<Str>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ErrorValue for PanicError {
    fn error(&self) -> Str {
        self.message.clone()
    }
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.message, f)
    }
}

crate::impl_mask!(dyn ErrorValue: PanicError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_runtime_wording() {
        assert_eq!(
            RuntimeError::NilDereference.to_string(),
            "invalid memory address or nil pointer dereference"
        );
        assert_eq!(
            RuntimeError::IndexOutOfRange { index: 3, len: 3 }.to_string(),
            "index out of range[3] with length 3"
        );
        assert_eq!(
            RuntimeError::SliceOutOfRange {
                start: 2,
                end: 1,
                cap: 4
            }
            .to_string(),
            "index out of range[2:1] with capacity 4"
        );
        assert_eq!(RuntimeError::DivideByZero.to_string(), "divide by zero");
    }

    #[test]
    fn kinds_group_index_errors() {
        let a = RuntimeError::IndexOutOfRange { index: 0, len: 0 };
        let b = RuntimeError::SliceOutOfRange {
            start: 0,
            end: 1,
            cap: 0,
        };
        assert_eq!(a.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(b.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(RuntimeError::User("x".into()).kind(), ErrorKind::UserPanic);
    }

    #[test]
    fn conversion_to_error_value_keeps_message() {
        let value = RuntimeError::DivideByZero.into_error_value();
        assert_eq!(value.error(), Str::from("divide by zero"));

        let err = RuntimeError::Error(value.clone());
        assert_eq!(err.to_string(), "divide by zero");
        assert_eq!(err.kind(), ErrorKind::UserPanic);
        assert!(err.into_error_value() == value);
    }
}

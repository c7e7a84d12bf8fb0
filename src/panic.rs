//! Panic channel: throw, recover, and the process boundary.
//!
//! Design
//! - A panic is a `RuntimeError` unwound with `std::panic::resume_unwind`.
//!   That path skips the global panic hook, so runtime panics never print
//!   unless they reach the boundary.
//! - `recover` is the only catch site. Native Rust panics caught there are
//!   folded into `RuntimeError::User` with their message.
//! - An error that escapes `run`/`run_with` is rendered as
//!   `panic: <message>` (plus the call trace) and handed to an `AbortHook`,
//!   which never returns. The default hook exits with `EXIT_PANIC`.
//!
//! State machine: Running -> Unwinding -> Recovered (back to Running at the
//! `recover` call) or Terminating (boundary reached).

use crate::error::{ErrorValue, RuntimeError, EXIT_PANIC};
use crate::trace;
use crate::trait_box::TraitBox;
use core::any::Any;
use core::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// Raise `err` through the panic channel.
pub fn throw(err: RuntimeError) -> ! {
    panic::resume_unwind(Box::new(err))
}

/// Raise an arbitrary user value; it is carried as its rendered message.
pub fn panic<T: fmt::Display + ?Sized>(value: &T) -> ! {
    throw(RuntimeError::User(value.to_string()))
}

/// Raise a value implementing the `Error` interface.
pub fn panic_error(err: TraitBox<dyn ErrorValue>) -> ! {
    throw(RuntimeError::Error(err))
}

/// Raise the error of a failed primitive instead of returning it.
pub trait Unwind<T> {
    fn or_throw(self) -> T;
}

impl<T> Unwind<T> for Result<T, RuntimeError> {
    #[inline]
    fn or_throw(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => throw(e),
        }
    }
}

/// Run `f`, catching any panic raised inside it.
///
/// On failure the call trace is cut back to its depth at entry, dropping
/// the frames the panic unwound through.
pub fn recover<R>(f: impl FnOnce() -> R) -> Result<R, RuntimeError> {
    let depth = trace::depth();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => Ok(r),
        Err(payload) => {
            trace::truncate(depth);
            let err = from_payload(payload);
            log::debug!("recovered panic: {}", err);
            Err(err)
        }
    }
}

fn from_payload(payload: Box<dyn Any + Send>) -> RuntimeError {
    let payload = match payload.downcast::<RuntimeError>() {
        Ok(err) => return *err,
        Err(p) => p,
    };
    let payload = match payload.downcast::<String>() {
        Ok(msg) => return RuntimeError::User(*msg),
        Err(p) => p,
    };
    match payload.downcast::<&'static str>() {
        Ok(msg) => RuntimeError::User((*msg).to_string()),
        Err(_) => RuntimeError::User("unknown panic".to_string()),
    }
}

/// Terminates the process with a formatted diagnostic.
pub trait AbortHook {
    fn abort(&self, message: &str) -> !;
}

/// Default hook: print the diagnostic to stderr and exit.
#[derive(Copy, Clone, Debug)]
pub struct ProcessExit {
    code: i32,
}

impl ProcessExit {
    pub const fn new() -> Self {
        Self { code: EXIT_PANIC }
    }

    pub const fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

impl Default for ProcessExit {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortHook for ProcessExit {
    fn abort(&self, message: &str) -> ! {
        eprintln!("{}", message);
        std::process::exit(self.code)
    }
}

/// Render the terminal diagnostic for `err` with the current call trace.
pub fn diagnostic(err: &RuntimeError) -> String {
    let frames = trace::render();
    if frames.is_empty() {
        format!("panic: {}", err)
    } else {
        format!("panic: {}\n{}", err, frames)
    }
}

/// Run a program body under the default boundary.
pub fn run<R>(f: impl FnOnce() -> R) -> R {
    run_with(&ProcessExit::new(), f)
}

/// Run a program body; an escaping panic is reported through `hook`.
pub fn run_with<R, H>(hook: &H, f: impl FnOnce() -> R) -> R
where
    H: AbortHook + ?Sized,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => r,
        Err(payload) => {
            let err = from_payload(payload);
            // Render before clearing: the frames the panic crossed are the report.
            let message = diagnostic(&err);
            trace::clear();
            log::error!("unrecovered panic: {}", err);
            hook.abort(&message)
        }
    }
}

/// Spawn a detached thread running `f` under the default boundary.
pub fn co<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    let _ = thread::spawn(move || run(f));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn recover_returns_value_on_success() {
        assert_eq!(recover(|| 7).unwrap(), 7);
    }

    #[test]
    fn thrown_error_is_recovered_intact() {
        let err = recover(|| throw(RuntimeError::DivideByZero)).unwrap_err();
        assert_eq!(err, RuntimeError::DivideByZero);
    }

    #[test]
    fn user_values_carry_their_message() {
        let err = recover(|| panic(&42)).unwrap_err();
        assert_eq!(err, RuntimeError::User("42".to_string()));
        assert_eq!(err.kind(), ErrorKind::UserPanic);
    }

    #[test]
    fn native_panics_become_user_panics() {
        let prev = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));
        let err = recover(|| -> () { panic!("boom {}", 1) }).unwrap_err();
        std::panic::set_hook(prev);
        assert_eq!(err, RuntimeError::User("boom 1".to_string()));
    }

    #[test]
    fn or_throw_raises_errors() {
        let ok: Result<i32, RuntimeError> = Ok(1);
        assert_eq!(ok.or_throw(), 1);
        let err = recover(|| {
            let r: Result<i32, RuntimeError> = Err(RuntimeError::AllocationFailed);
            r.or_throw()
        })
        .unwrap_err();
        assert_eq!(err, RuntimeError::AllocationFailed);
    }

    #[test]
    fn process_exit_defaults_to_panic_status() {
        assert_eq!(ProcessExit::default().code(), EXIT_PANIC);
        assert_eq!(ProcessExit::new().with_code(70).code(), 70);
    }
}

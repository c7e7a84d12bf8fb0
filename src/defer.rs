//! Scope-exit cleanup.
//!
//! `Defer` is a per-scope stack of closures. When it drops, on normal exit
//! or while unwinding, the closures run in reverse registration order,
//! each exactly once.
//!
//! A closure that panics does not stop the rest from running. Once the
//! stack is drained the first such panic is resumed, unless the scope was
//! already unwinding, in which case it is logged and dropped so the
//! original panic keeps propagating.

use crate::panic::{self, recover};
use std::thread;

#[must_use = "deferred closures run when the stack is dropped"]
pub struct Defer<'a> {
    stack: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a> Defer<'a> {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Register `f` to run when this scope exits.
    pub fn defer(&mut self, f: impl FnOnce() + 'a) {
        self.stack.push(Box::new(f));
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Default for Defer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Defer<'_> {
    fn drop(&mut self) {
        let unwinding = thread::panicking();
        let mut first = None;
        while let Some(f) = self.stack.pop() {
            if let Err(err) = recover(f) {
                if unwinding {
                    log::warn!("deferred call panicked during unwinding: {}", err);
                } else if first.is_none() {
                    first = Some(err);
                } else {
                    log::warn!("deferred call panicked after an earlier one: {}", err);
                }
            }
        }
        if let Some(err) = first {
            panic::throw(err);
        }
    }
}

/// Run `body` with a fresh `Defer` stack that is drained when it returns.
pub fn scope<'a, R>(body: impl FnOnce(&mut Defer<'a>) -> R) -> R {
    let mut d = Defer::new();
    body(&mut d)
}

/// Single-closure guard: runs `f` when dropped.
#[must_use = "the closure runs as soon as the guard is dropped"]
pub struct DeferGuard<F: FnOnce()> {
    f: Option<F>,
}

pub fn defer<F: FnOnce()>(f: F) -> DeferGuard<F> {
    DeferGuard { f: Some(f) }
}

impl<F: FnOnce()> DeferGuard<F> {
    /// Drop the guard without running its closure.
    pub fn cancel(mut self) {
        self.f = None;
    }
}

impl<F: FnOnce()> Drop for DeferGuard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

//! Bounded per-thread call trace.
//!
//! Generated code pushes a frame on entry and pops it on normal return.
//! Frames are not popped while unwinding, so a panic that reaches the
//! boundary reports the calls it crossed, most recent first. Only the
//! newest `DEPTH` frames are kept.
//!
//! With the `trace` feature disabled every function is a no-op.

#[cfg(feature = "trace")]
use std::cell::RefCell;
#[cfg(feature = "trace")]
use std::collections::VecDeque;

/// Maximum number of frames retained per thread.
pub const DEPTH: usize = 20;

#[cfg(feature = "trace")]
thread_local! {
    static FRAMES: RefCell<VecDeque<String>> = RefCell::new(VecDeque::with_capacity(DEPTH));
}

/// Record entry into `frame`.
pub fn push(frame: impl Into<String>) {
    #[cfg(feature = "trace")]
    FRAMES.with(|f| {
        let mut f = f.borrow_mut();
        f.push_front(frame.into());
        f.truncate(DEPTH);
    });
    #[cfg(not(feature = "trace"))]
    let _ = frame;
}

/// Record a normal return from the most recent frame.
pub fn ok() {
    #[cfg(feature = "trace")]
    FRAMES.with(|f| {
        f.borrow_mut().pop_front();
    });
}

/// Number of frames currently recorded.
pub fn depth() -> usize {
    #[cfg(feature = "trace")]
    return FRAMES.with(|f| f.borrow().len());
    #[cfg(not(feature = "trace"))]
    return 0;
}

/// Drop the newest frames until at most `depth` remain.
pub(crate) fn truncate(depth: usize) {
    #[cfg(feature = "trace")]
    FRAMES.with(|f| {
        let mut f = f.borrow_mut();
        while f.len() > depth {
            f.pop_front();
        }
    });
    #[cfg(not(feature = "trace"))]
    let _ = depth;
}

pub fn clear() {
    #[cfg(feature = "trace")]
    FRAMES.with(|f| f.borrow_mut().clear());
}

/// Frames joined by newlines, most recent first.
pub fn render() -> String {
    #[cfg(feature = "trace")]
    return FRAMES.with(|f| {
        let f = f.borrow();
        let mut out = String::new();
        for (i, frame) in f.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(frame);
        }
        out
    });
    #[cfg(not(feature = "trace"))]
    return String::new();
}

/// RAII frame: pushed on creation, popped on drop unless unwinding.
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub struct Frame {
    _private: (),
}

pub fn enter(frame: impl Into<String>) -> Frame {
    push(frame);
    Frame { _private: () }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            ok();
        }
    }
}

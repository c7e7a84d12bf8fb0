//! rt-core: the value and failure model of a compiled language's runtime.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: give generated code a small set of primitives whose ownership,
//!   aliasing and failure rules are explicit and checked.
//! - Layers:
//!   - `atomic`: word-sized atomics (`AtomicWord`), all sequentially
//!     consistent.
//!   - `rc_ref`: `Ref<T>`, a nil-able shared handle on `Arc`, plus
//!     `WeakRef<T>` for breaking cycles.
//!   - `slice` / `array`: `Slice<T>` views over a shared segment with
//!     copy-on-grow; `Array<T, N>` fixed-size values.
//!   - `utf8` / `utf16` / `str`: rune codecs and the `Str` value string.
//!   - `map`: `Map<K, V, S>` keyed by rendered key bytes.
//!   - `any_box` / `trait_box`: type-erased boxes with exact-type casts
//!     driven by a per-type `TypeOps` table.
//!   - `func`: nil-able shared function values.
//!   - `deep_clone`: the `clone` builtin, copying through aliasing handles.
//!   - `panic` / `defer` / `trace` / `error`: the single failure channel,
//!     scope-exit cleanup, and the diagnostics printed at the boundary.
//!
//! Failure model
//! - Every precondition violation is a `RuntimeError` raised through the
//!   panic channel (`std::panic::resume_unwind`). `try_*` methods return the
//!   same error as a `Result` instead.
//! - `recover` is the catch site. Anything that escapes `run` prints
//!   `panic: <message>` plus the call trace and exits with `EXIT_PANIC`.
//!
//! Concurrency
//! - `Ref` counts are atomic; the payload is shared, not locked.
//! - Slice elements sit behind a `parking_lot::RwLock` per segment, so
//!   element access is race free; growing one view still needs `&mut`.
//!   No caller closure runs while a segment lock is held.
//!
//! Notes and non-goals
//! - No cycle collector. Cycles of strong `Ref`s leak; use `WeakRef`.
//! - The crate never installs a logger. It emits through `log`.

pub mod any_box;
pub mod arith;
pub mod array;
pub mod atomic;
pub mod deep_clone;
pub mod defer;
pub mod error;
pub mod func;
pub mod map;
pub mod panic;
pub mod rc_ref;
pub mod slice;
pub mod str;
pub mod trace;
pub mod trait_box;
pub mod utf16;
pub mod utf8;

// Public surface
pub use any_box::{AnyBox, Dynamic, TypeOps};
pub use arith::{div, rem, Divide};
pub use array::Array;
pub use atomic::AtomicWord;
pub use deep_clone::DeepClone;
pub use defer::{defer, scope, Defer, DeferGuard};
pub use error::{ErrorKind, ErrorValue, PanicError, RuntimeError, EXIT_PANIC};
pub use func::{Callable, Func};
pub use map::{ByteSumState, Map, MapKey};
pub use panic::{
    co, panic, panic_error, recover, run, run_with, throw, AbortHook, ProcessExit, Unwind,
};
pub use rc_ref::{Ref, WeakRef};
pub use slice::{copy, Slice};
pub use str::{to_str, Str};
pub use trait_box::{Mask, TraitBox};
pub use utf16::Utf16Source;
pub use utf8::Rune;

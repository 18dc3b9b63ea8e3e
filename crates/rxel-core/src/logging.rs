//! Logging shims.
//!
//! With the `tracing` feature the macros re-export `tracing`'s; without it they
//! expand to nothing so call sites stay unconditional. The no-op macros carry
//! distinct names and are renamed on re-export: a bare `use warn;` would be
//! ambiguous with the built-in `#[warn]` attribute.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! noop_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! noop_trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! noop_warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use noop_debug as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use noop_trace as trace;
#[cfg(not(feature = "tracing"))]
pub(crate) use noop_warn as warn;

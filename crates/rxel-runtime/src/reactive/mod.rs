#![forbid(unsafe_code)]

//! Single-threaded reactive primitives.
//!
//! - [`Stream`]: cold push stream with `map`, `filter`, `inspect`, `dedupe`,
//!   `merge`, `share` and `throttle` operators.
//! - [`Subject`]: hot multicast source.
//! - [`ValueCell`]: write-triggered single-value cell that replays its
//!   current value to new observers.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`AnyStream`]: type-erased stream keyed by [`StreamId`].
//!
//! # Architecture
//!
//! Everything is `Rc<RefCell<..>>` and callback driven. Values are delivered
//! synchronously on the emitting call stack; the only deferral point is
//! [`Stream::throttle`], which hands its interval boundary to a
//! [`Scheduler`](crate::scheduler::Scheduler).
//!
//! # Failure Modes
//!
//! - An observer that panics unwinds through the emitter. No borrow is held
//!   across observer calls, so the structures stay usable after the panic is
//!   caught.
//! - Values emitted by a shared stream while it connects reach only the
//!   observers present at that moment.

pub mod stream;
pub mod subject;
pub mod subscription;
pub mod throttle;

pub use stream::{AnyStream, Observer, Stream, StreamId};
pub use subject::{Subject, ValueCell};
pub use subscription::Subscription;

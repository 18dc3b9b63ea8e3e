#![forbid(unsafe_code)]

//! Runtime: per-instance reactive machinery for rxel elements.
//!
//! - [`reactive`]: streams, subjects, value cells and subscriptions.
//! - [`scheduler`]: sync, frame and timer schedulers for the render throttle.
//! - [`feed`]: field cells and the deduplicated change feed.
//! - [`render`]: the throttled render pipeline and host abstraction.
//! - [`lifecycle`]: attach/detach/attribute-change bridge.
//! - [`element`]: [`ElementClass`] and [`Element`], tying it all together.

pub mod element;
pub mod error;
pub mod feed;
pub mod lifecycle;
pub mod reactive;
pub mod render;
pub mod scheduler;

pub use element::{Element, ElementClass, ElementClassBuilder};
pub use error::{ElementError, Result};
pub use feed::{ChangeEvent, ChangeFeed, Props};
pub use lifecycle::{AttributeChange, LifecycleBridge};
pub use reactive::{AnyStream, Stream, StreamId, Subject, Subscription, ValueCell};
pub use render::{HostElement, RenderFn, RenderRoot, TemplateFn};
pub use scheduler::{
    FrameScheduler, LabClock, Scheduler, SyncScheduler, Task, TaskHandle, TimerScheduler,
};

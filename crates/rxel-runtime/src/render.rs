#![forbid(unsafe_code)]

//! Render scheduling.
//!
//! The render pipeline is
//!
//! ```text
//! startup tick ─┐
//! change feed ──┼─► merge ─► throttle(scheduler) ─► template(props) ─► render(out, root)
//! requests ─────┘
//! ```
//!
//! The startup tick fires once per subscription, so attaching always renders
//! even when the shared feed is already connected by another consumer and
//! therefore replays nothing. When this pipeline is the one connecting the
//! feed, the cells' replay arrives during the same subscribe call and the
//! throttle folds it into that single leading render.
//!
//! The pipeline is registered with the instance's lifecycle bridge at
//! construction: it only runs while attached, and detaching cancels any
//! pending trailing render.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rxel_core::EffectTarget;
use tracing::trace;

use crate::feed::{ChangeFeed, Props};
use crate::reactive::{Stream, Subject};
use crate::scheduler::Scheduler;

/// The host element an instance is attached to.
pub trait HostElement: EffectTarget + 'static {
    /// Isolated rendering surface (for example a shadow root).
    type Surface: 'static;

    /// Create the isolated surface. Called once per instance when the class
    /// asks for an isolated root.
    fn attach_isolated_root(&self) -> Self::Surface;
}

/// Where render output goes.
pub enum RenderRoot<H: HostElement> {
    /// Render into the host element itself.
    Host(Rc<H>),
    /// Render into the host's isolated surface.
    Isolated(H::Surface),
}

impl<H: HostElement> RenderRoot<H> {
    #[must_use]
    pub fn is_isolated(&self) -> bool {
        matches!(self, Self::Isolated(_))
    }

    #[must_use]
    pub fn surface(&self) -> Option<&H::Surface> {
        match self {
            Self::Isolated(surface) => Some(surface),
            Self::Host(_) => None,
        }
    }
}

impl<H: HostElement> fmt::Debug for RenderRoot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(_) => f.write_str("RenderRoot::Host"),
            Self::Isolated(_) => f.write_str("RenderRoot::Isolated"),
        }
    }
}

/// Template: current props to render input.
pub type TemplateFn<T> = Rc<dyn Fn(&Props) -> T>;

/// Render callback: template output into the render root.
pub type RenderFn<H, T> = Rc<dyn Fn(T, &RenderRoot<H>)>;

/// Everything the render pipeline needs from one instance.
pub(crate) struct RenderPipeline<H: HostElement, T: 'static> {
    pub(crate) template: TemplateFn<T>,
    pub(crate) render: RenderFn<H, T>,
    pub(crate) root: Rc<RenderRoot<H>>,
    pub(crate) scheduler: Rc<dyn Scheduler>,
    pub(crate) renders: Rc<Cell<u64>>,
}

impl<H: HostElement, T: 'static> RenderPipeline<H, T> {
    /// Build the throttled render stream over `feed` and explicit `requests`.
    pub(crate) fn stream(self, feed: &ChangeFeed, requests: &Subject<()>) -> Stream<()> {
        let changes = feed.stream().map(|_| ());
        let props = feed.props().clone();
        let Self {
            template,
            render,
            root,
            scheduler,
            renders,
        } = self;
        let scheduler_name = scheduler.name();
        Stream::merge([Stream::of(()), changes, requests.stream()])
            .throttle(scheduler)
            .inspect(move |()| {
                renders.set(renders.get() + 1);
                trace!(
                    class = props.config().class_name(),
                    scheduler = scheduler_name,
                    render = renders.get(),
                    "render.tick"
                );
                let output = template(&props);
                render(output, &root);
            })
    }
}

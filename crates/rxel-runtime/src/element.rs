#![forbid(unsafe_code)]

//! Reactive elements.
//!
//! An [`ElementClass`] combines a sealed property configuration with a
//! template, a render callback and a scheduler. Each [`Element`] built from it
//! owns its field cells, change feed, render pipeline and lifecycle bridge.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use rxel_core::{ComponentClass, EffectTarget};
//! use rxel_runtime::{Element, ElementClass, HostElement};
//!
//! struct Host;
//! impl EffectTarget for Host {
//!     fn dispatch_event(&self, _name: &str) {}
//!     fn set_attribute(&self, _name: &str, _value: &str) {}
//! }
//! impl HostElement for Host {
//!     type Surface = ();
//!     fn attach_isolated_root(&self) {}
//! }
//!
//! let props = Rc::new(ComponentClass::new("x-greeting"));
//! props.get_or_create_field_config("name").unwrap();
//! let class = Rc::new(
//!     ElementClass::builder(props).build(
//!         |p| format!("hello {}", p.value("name")),
//!         |_out: String, _root| {},
//!     ),
//! );
//! let element = Element::new(&class, Rc::new(Host));
//! element.on_attach().unwrap();
//! element.set("name", "world").unwrap();
//! assert_eq!(element.render_count(), 2);
//! ```

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use rxel_core::{ComponentClass, ComponentConfig, EffectRegistry, EffectTarget, PropertyEffect, Value};
use tracing::{debug, error};

use crate::error::{ElementError, Result};
use crate::feed::{ChangeEvent, ChangeFeed, Props};
use crate::lifecycle::{AttributeChange, LifecycleBridge};
use crate::reactive::{AnyStream, Stream, Subject};
use crate::render::{HostElement, RenderFn, RenderPipeline, RenderRoot, TemplateFn};
use crate::scheduler::{Scheduler, SyncScheduler};

// ---------------------------------------------------------------------------
// ElementClass
// ---------------------------------------------------------------------------

/// Builder for [`ElementClass`].
pub struct ElementClassBuilder<H, T> {
    properties: Rc<ComponentClass>,
    scheduler: Rc<dyn Scheduler>,
    isolated_root: bool,
    effects: EffectRegistry,
    _marker: PhantomData<fn() -> (H, T)>,
}

impl<H: HostElement, T: 'static> ElementClassBuilder<H, T> {
    /// Scheduler driving the render throttle. Defaults to [`SyncScheduler`].
    #[must_use]
    pub fn scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Render into an isolated surface created per instance.
    #[must_use]
    pub fn isolated_root(mut self, isolated: bool) -> Self {
        self.isolated_root = isolated;
        self
    }

    /// Append a property effect after notify and reflect.
    #[must_use]
    pub fn effect(mut self, effect: impl PropertyEffect + 'static) -> Self {
        self.effects = self.effects.with(effect);
        self
    }

    /// Replace the whole effect registry.
    #[must_use]
    pub fn effects(mut self, effects: EffectRegistry) -> Self {
        self.effects = effects;
        self
    }

    pub fn build(
        self,
        template: impl Fn(&Props) -> T + 'static,
        render: impl Fn(T, &RenderRoot<H>) + 'static,
    ) -> ElementClass<H, T> {
        ElementClass {
            properties: self.properties,
            template: Rc::new(template),
            render: Rc::new(render),
            scheduler: self.scheduler,
            isolated_root: self.isolated_root,
            effects: Rc::new(self.effects),
        }
    }
}

/// Class-level definition shared by every instance.
pub struct ElementClass<H: HostElement, T: 'static> {
    properties: Rc<ComponentClass>,
    template: TemplateFn<T>,
    render: RenderFn<H, T>,
    scheduler: Rc<dyn Scheduler>,
    isolated_root: bool,
    effects: Rc<EffectRegistry>,
}

impl<H: HostElement, T: 'static> ElementClass<H, T> {
    #[must_use]
    pub fn builder(properties: Rc<ComponentClass>) -> ElementClassBuilder<H, T> {
        ElementClassBuilder {
            properties,
            scheduler: Rc::new(SyncScheduler),
            isolated_root: false,
            effects: EffectRegistry::standard(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn properties(&self) -> &ComponentClass {
        &self.properties
    }

    /// Attribute names the host should watch, in declaration order.
    #[must_use]
    pub fn observed_attribute_names(&self) -> Vec<String> {
        self.properties.observed_attribute_names()
    }

    #[must_use]
    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    #[must_use]
    pub fn has_isolated_root(&self) -> bool {
        self.isolated_root
    }
}

impl<H: HostElement, T: 'static> fmt::Debug for ElementClass<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementClass")
            .field("properties", &self.properties)
            .field("scheduler", &self.scheduler.name())
            .field("isolated_root", &self.isolated_root)
            .field("effects", &self.effects.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// One reactive element instance.
pub struct Element<H: HostElement, T: 'static> {
    host: Rc<H>,
    config: Rc<ComponentConfig>,
    feed: ChangeFeed,
    bridge: LifecycleBridge,
    requests: Subject<()>,
    render_stream: AnyStream,
    renders: Rc<Cell<u64>>,
    root: Rc<RenderRoot<H>>,
    _template: PhantomData<fn() -> T>,
}

impl<H: HostElement, T: 'static> Element<H, T> {
    /// Instantiate `class` on `host`.
    ///
    /// Seals the class's property configuration on first use. The render
    /// pipeline is registered immediately and starts on the first attach.
    pub fn new(class: &ElementClass<H, T>, host: Rc<H>) -> Self {
        let config = class.properties.seal();
        let feed = ChangeFeed::build(
            Rc::clone(&config),
            Rc::clone(&class.effects),
            Rc::clone(&host) as Rc<dyn EffectTarget>,
        );
        let root = Rc::new(if class.isolated_root {
            RenderRoot::Isolated(host.attach_isolated_root())
        } else {
            RenderRoot::Host(Rc::clone(&host))
        });
        let requests = Subject::new();
        let renders = Rc::new(Cell::new(0));
        let render_stream = RenderPipeline {
            template: Rc::clone(&class.template),
            render: Rc::clone(&class.render),
            root: Rc::clone(&root),
            scheduler: Rc::clone(&class.scheduler),
            renders: Rc::clone(&renders),
        }
        .stream(&feed, &requests)
        .erase();

        let bridge = LifecycleBridge::new();
        bridge.register_streams([render_stream.clone()]);
        debug!(
            class = config.class_name(),
            fields = config.len(),
            scheduler = class.scheduler.name(),
            "element.created"
        );

        Self {
            host,
            config,
            feed,
            bridge,
            requests,
            render_stream,
            renders,
            root,
            _template: PhantomData,
        }
    }

    // --- properties -------------------------------------------------------

    /// Current value of a declared field.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.feed
            .props()
            .get(name)
            .ok_or_else(|| ElementError::unknown_property(self.config.class_name(), name))
    }

    /// Write a declared field. Effects run synchronously while attached; their
    /// first failure is returned after the write completes.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .config
            .field_index(name)
            .ok_or_else(|| ElementError::unknown_property(self.config.class_name(), name))?;
        self.feed.write(index, value.into())?;
        Ok(())
    }

    /// `(field, value)` pairs in declaration order.
    #[must_use]
    pub fn properties(&self) -> Vec<(String, Value)> {
        self.feed.props().snapshot()
    }

    #[must_use]
    pub fn props(&self) -> &Props {
        self.feed.props()
    }

    // --- lifecycle --------------------------------------------------------

    /// The host attached the element.
    ///
    /// Effect failures raised while the fields replay their values are logged
    /// and the first one is returned; the element stays attached.
    pub fn on_attach(&self) -> Result<()> {
        self.bridge.on_attach();
        match self.feed.take_error() {
            Some(err) => {
                error!(class = self.config.class_name(), error = %err, "element.attach_effect_failed");
                Err(err.into())
            }
            None => Ok(()),
        }
    }

    /// The host detached the element. Pending renders are cancelled.
    pub fn on_detach(&self) {
        self.bridge.on_detach();
    }

    /// An observed attribute changed on the host.
    pub fn on_attribute_change(
        &self,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<()> {
        self.bridge.on_attribute_change(&self.feed, name, old, new)
    }

    /// Keep `streams` subscribed while the element is attached.
    pub fn register_streams(&self, streams: impl IntoIterator<Item = AnyStream>) {
        self.bridge.register_streams(streams);
    }

    pub fn unregister_streams(&self, streams: impl IntoIterator<Item = AnyStream>) {
        self.bridge.unregister_streams(streams);
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.bridge.is_attached()
    }

    // --- signals ----------------------------------------------------------

    #[must_use]
    pub fn connected(&self) -> Stream<()> {
        self.bridge.connected()
    }

    #[must_use]
    pub fn disconnected(&self) -> Stream<()> {
        self.bridge.disconnected()
    }

    #[must_use]
    pub fn attribute_changed(&self) -> Stream<AttributeChange> {
        self.bridge.attribute_changed()
    }

    /// The deduplicated change feed.
    #[must_use]
    pub fn changes(&self) -> Stream<ChangeEvent> {
        self.feed.stream()
    }

    // --- rendering --------------------------------------------------------

    /// Push a render tick through the throttle. Ignored while detached.
    pub fn request_render(&self) {
        self.requests.next(&());
    }

    /// Renders performed so far.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.renders.get()
    }

    #[must_use]
    pub fn render_root(&self) -> &RenderRoot<H> {
        &self.root
    }

    /// Whether the render pipeline currently has a live subscription.
    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.bridge.is_subscribed(self.render_stream.id())
    }

    // --- accessors --------------------------------------------------------

    #[must_use]
    pub fn host(&self) -> &Rc<H> {
        &self.host
    }

    #[must_use]
    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }
}

impl<H: HostElement, T: 'static> fmt::Debug for Element<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("class", &self.config.class_name())
            .field("attached", &self.is_attached())
            .field("renders", &self.renders.get())
            .field("props", self.feed.props())
            .finish()
    }
}

#![forbid(unsafe_code)]

//! Lifecycle bridge between a host runtime and an instance's streams.
//!
//! # State Machine
//!
//! ```text
//!            on_attach                 on_detach
//! unattached ─────────► attached ─────────────► unattached
//! ```
//!
//! # Invariants
//!
//! 1. A registered stream has a live subscription iff the bridge is attached.
//! 2. Registering a stream twice never creates a second subscription.
//! 3. Streams are subscribed in registration order.
//! 4. Unregistering drops the live subscription regardless of state.
//!
//! Subscribing a stream may re-enter the bridge (a pipeline can register or
//! unregister streams, or detach). No borrow is held while a stream is
//! subscribed or released.

use std::cell::{Cell, RefCell};
use std::fmt;

use ahash::AHashMap;
use rxel_core::decode;
use tracing::{debug, warn};

use crate::error::Result;
use crate::feed::ChangeFeed;
use crate::reactive::{AnyStream, Stream, StreamId, Subject, Subscription};

/// Payload of the attribute-changed signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Attach state, registered streams and lifecycle signals of one instance.
pub struct LifecycleBridge {
    attached: Cell<bool>,
    registered: RefCell<Vec<AnyStream>>,
    active: RefCell<AHashMap<StreamId, Subscription>>,
    connected: Subject<()>,
    disconnected: Subject<()>,
    attribute_changed: Subject<AttributeChange>,
}

impl LifecycleBridge {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attached: Cell::new(false),
            registered: RefCell::new(Vec::new()),
            active: RefCell::new(AHashMap::new()),
            connected: Subject::new(),
            disconnected: Subject::new(),
            attribute_changed: Subject::new(),
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Enter the attached state, subscribe every registered stream, then emit
    /// `connected`.
    pub fn on_attach(&self) {
        self.attached.set(true);
        let waiting: Vec<AnyStream> = {
            let registered = self.registered.borrow();
            let active = self.active.borrow();
            registered
                .iter()
                .filter(|s| !active.contains_key(&s.id()))
                .cloned()
                .collect()
        };
        debug!(streams = waiting.len(), "lifecycle.attach");
        for stream in &waiting {
            if !self.attached.get() {
                // Detached by one of the streams.
                return;
            }
            self.subscribe_stream(stream);
        }
        if self.attached.get() {
            self.connected.next(&());
        }
    }

    /// Leave the attached state, emit `disconnected`, then drop every live
    /// subscription. A no-op when not attached.
    pub fn on_detach(&self) {
        if !self.attached.replace(false) {
            return;
        }
        self.disconnected.next(&());
        let released = std::mem::take(&mut *self.active.borrow_mut());
        debug!(streams = released.len(), "lifecycle.detach");
        drop(released);
    }

    /// Handle a host attribute change.
    ///
    /// Equal old and new values are ignored. Otherwise the attribute-changed
    /// signal fires, and when the attribute belongs to a field the new text is
    /// decoded and written to that field. A removed attribute decodes from the
    /// text `null`.
    ///
    /// # Errors
    ///
    /// Decode failures and effect failures of the resulting write.
    pub fn on_attribute_change(
        &self,
        feed: &ChangeFeed,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<()> {
        if old == new {
            return Ok(());
        }
        self.attribute_changed.next(&AttributeChange {
            name: name.to_owned(),
            from: old.map(str::to_owned),
            to: new.map(str::to_owned),
        });

        let config = feed.config();
        let Some(index) = config.fields().iter().position(|f| f.attribute() == name) else {
            warn!(class = config.class_name(), attribute = name, "attribute.unobserved");
            return Ok(());
        };
        let value = decode(new.unwrap_or("null"), &config.fields()[index])?;
        feed.write(index, value)?;
        Ok(())
    }

    /// Add streams; subscribe them now when attached.
    pub fn register_streams(&self, streams: impl IntoIterator<Item = AnyStream>) {
        let added: Vec<AnyStream> = {
            let mut registered = self.registered.borrow_mut();
            streams
                .into_iter()
                .filter(|stream| {
                    if registered.iter().any(|s| s.id() == stream.id()) {
                        false
                    } else {
                        registered.push(stream.clone());
                        true
                    }
                })
                .collect()
        };
        if !self.attached.get() {
            return;
        }
        for stream in &added {
            self.subscribe_stream(stream);
        }
    }

    /// Remove streams and drop their live subscriptions. Unknown streams are
    /// ignored.
    pub fn unregister_streams(&self, streams: impl IntoIterator<Item = AnyStream>) {
        for stream in streams {
            let id = stream.id();
            self.registered.borrow_mut().retain(|s| s.id() != id);
            let released = self.active.borrow_mut().remove(&id);
            if released.is_some() {
                debug!(stream = ?id, "lifecycle.unsubscribe");
            }
            drop(released);
        }
    }

    /// Registered streams, in registration order.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.registered.borrow().len()
    }

    /// Streams with a live subscription.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.borrow().len()
    }

    #[must_use]
    pub fn is_subscribed(&self, id: StreamId) -> bool {
        self.active.borrow().contains_key(&id)
    }

    /// Emits once per attach, after registered streams are subscribed.
    #[must_use]
    pub fn connected(&self) -> Stream<()> {
        self.connected.stream()
    }

    /// Emits once per detach, before subscriptions are dropped.
    #[must_use]
    pub fn disconnected(&self) -> Stream<()> {
        self.disconnected.stream()
    }

    #[must_use]
    pub fn attribute_changed(&self) -> Stream<AttributeChange> {
        self.attribute_changed.stream()
    }

    fn subscribe_stream(&self, stream: &AnyStream) {
        let id = stream.id();
        {
            let mut active = self.active.borrow_mut();
            if active.contains_key(&id) {
                return;
            }
            // Placeholder marks the stream as subscribing.
            active.insert(id, Subscription::empty());
        }
        debug!(stream = ?id, "lifecycle.subscribe");
        let subscription = stream.subscribe();

        let mut active = self.active.borrow_mut();
        match active.get_mut(&id) {
            Some(slot) if self.attached.get() => *slot = subscription,
            _ => {
                // Detached or unregistered while subscribing.
                active.remove(&id);
                drop(active);
                drop(subscription);
            }
        }
    }
}

impl Default for LifecycleBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LifecycleBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleBridge")
            .field("attached", &self.attached.get())
            .field("registered", &self.registered_count())
            .field("active", &self.active_count())
            .finish()
    }
}

#![forbid(unsafe_code)]

//! A host element that records what effects and renders do to it.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use rxel_core::EffectTarget;
use rxel_runtime::HostElement;
use serde::Serialize;

/// One observable host mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostRecord {
    Event { name: String },
    Attribute { name: String, value: String },
}

/// Handle to an isolated surface created by [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurfaceId(pub u32);

/// Host double: keeps attributes, and logs every event and attribute write.
#[derive(Debug, Default)]
pub struct RecordingHost {
    records: RefCell<Vec<HostRecord>>,
    attributes: RefCell<BTreeMap<String, String>>,
    surfaces: Cell<u32>,
}

impl RecordingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order.
    #[must_use]
    pub fn records(&self) -> Vec<HostRecord> {
        self.records.borrow().clone()
    }

    /// Dispatched event names, in order.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter_map(|r| match r {
                HostRecord::Event { name } => Some(name.clone()),
                HostRecord::Attribute { .. } => None,
            })
            .collect()
    }

    /// Current value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Forget recorded mutations; attribute values are kept.
    pub fn clear_records(&self) {
        self.records.borrow_mut().clear();
    }

    /// Isolated surfaces created so far.
    #[must_use]
    pub fn surfaces_created(&self) -> u32 {
        self.surfaces.get()
    }
}

impl EffectTarget for RecordingHost {
    fn dispatch_event(&self, name: &str) {
        self.records.borrow_mut().push(HostRecord::Event {
            name: name.to_owned(),
        });
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
        self.records.borrow_mut().push(HostRecord::Attribute {
            name: name.to_owned(),
            value: value.to_owned(),
        });
    }
}

impl HostElement for RecordingHost {
    type Surface = SurfaceId;

    fn attach_isolated_root(&self) -> SurfaceId {
        let id = self.surfaces.get();
        self.surfaces.set(id + 1);
        SurfaceId(id)
    }
}

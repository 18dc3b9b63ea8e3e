#![forbid(unsafe_code)]

//! Change feed: per-field cells merged into one deduplicated event stream.
//!
//! Per field the pipeline is
//!
//! ```text
//! cell ─► effects (every raw write) ─► dedupe ─► (field, value)
//! ```
//!
//! and the per-field streams are merged in arrival order. The merged feed is
//! shared, so each cell has exactly one internal observer no matter how many
//! consumers subscribe to [`ChangeFeed::stream`].
//!
//! # Invariants
//!
//! 1. Effects run on every raw write, including writes of an equal value.
//! 2. Each maximal run of equal consecutive values of one field yields one
//!    [`ChangeEvent`].
//! 3. Cells replay their current value when the feed (re)connects, so
//!    effects also run for that replayed value.
//!
//! Writes made while nobody observes the feed update the cell silently; the
//! effects for the latest value run when the feed next connects.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rxel_core::{ComponentConfig, EffectError, EffectRegistry, EffectTarget, FieldConfig, Value};
use tracing::warn;

use crate::reactive::{Stream, ValueCell};

/// One deduplicated field change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub field: String,
    pub value: Value,
}

/// Read view of an instance's current field values, handed to templates.
#[derive(Clone)]
pub struct Props {
    config: Rc<ComponentConfig>,
    cells: Rc<[ValueCell<Value>]>,
}

impl Props {
    /// Current value of `name`, or `None` for an undeclared field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.config.field_index(name).map(|i| self.cells[i].get())
    }

    /// Current value of `name`, `Undefined` for an undeclared field.
    #[must_use]
    pub fn value(&self, name: &str) -> Value {
        self.get(name).unwrap_or_default()
    }

    /// `(field, value)` pairs in declaration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.config
            .fields()
            .iter()
            .zip(self.cells.iter())
            .map(|(field, cell)| (field.name().to_owned(), cell.get()))
            .collect()
    }

    #[must_use]
    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.snapshot()).finish()
    }
}

type ErrorSlot = Rc<RefCell<Option<EffectError>>>;

/// The cells of one instance and the shared change feed over them.
pub struct ChangeFeed {
    props: Props,
    stream: Stream<ChangeEvent>,
    errors: ErrorSlot,
}

impl ChangeFeed {
    /// Build cells seeded with `Undefined` and the feed over them.
    pub fn build(
        config: Rc<ComponentConfig>,
        effects: Rc<EffectRegistry>,
        host: Rc<dyn EffectTarget>,
    ) -> Self {
        let cells: Rc<[ValueCell<Value>]> = config
            .fields()
            .iter()
            .map(|_| ValueCell::new(Value::Undefined))
            .collect();
        let errors: ErrorSlot = Rc::new(RefCell::new(None));

        let per_field: Vec<Stream<ChangeEvent>> = config
            .fields()
            .iter()
            .zip(cells.iter())
            .map(|(field, cell)| {
                field_stream(
                    cell,
                    field.clone(),
                    Rc::clone(&effects),
                    Rc::clone(&host),
                    Rc::clone(&errors),
                )
            })
            .collect();

        Self {
            props: Props { config, cells },
            stream: Stream::merge(per_field).share(),
            errors,
        }
    }

    /// The shared change feed. Every call returns the same stream identity.
    #[must_use]
    pub fn stream(&self) -> Stream<ChangeEvent> {
        self.stream.clone()
    }

    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    #[must_use]
    pub fn config(&self) -> &ComponentConfig {
        &self.props.config
    }

    /// Write the field at `index` and report the first effect failure.
    pub fn write(&self, index: usize, value: Value) -> Result<(), EffectError> {
        self.props.cells[index].set(value);
        self.take_error().map_or(Ok(()), Err)
    }

    /// Take the first effect failure recorded since the last call.
    pub fn take_error(&self) -> Option<EffectError> {
        self.errors.borrow_mut().take()
    }
}

impl fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("props", &self.props)
            .field("stream", &self.stream)
            .finish()
    }
}

fn field_stream(
    cell: &ValueCell<Value>,
    field: FieldConfig,
    effects: Rc<EffectRegistry>,
    host: Rc<dyn EffectTarget>,
    errors: ErrorSlot,
) -> Stream<ChangeEvent> {
    let name = field.name().to_owned();
    cell.stream()
        .inspect(move |value: &Value| {
            if let Err(err) = effects.run(host.as_ref(), field.name(), value, &field) {
                warn!(field = field.name(), error = %err, "effect.failed");
                errors.borrow_mut().get_or_insert(err);
            }
        })
        .dedupe()
        .map(move |value: &Value| ChangeEvent {
            field: name.clone(),
            value: value.clone(),
        })
}

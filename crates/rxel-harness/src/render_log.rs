#![forbid(unsafe_code)]

//! Render callback recorder.

use std::cell::RefCell;
use std::rc::Rc;

use rxel_runtime::{HostElement, RenderRoot};

/// One render callback invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord<T> {
    pub output: T,
    pub isolated: bool,
}

/// Shared log of render callback invocations.
///
/// Clones share the same log; hand [`sink`](Self::sink) to
/// `ElementClassBuilder::build` and inspect the original.
#[derive(Debug)]
pub struct RenderLog<T> {
    records: Rc<RefCell<Vec<RenderRecord<T>>>>,
}

impl<T> Clone for RenderLog<T> {
    fn clone(&self) -> Self {
        Self {
            records: Rc::clone(&self.records),
        }
    }
}

impl<T> Default for RenderLog<T> {
    fn default() -> Self {
        Self {
            records: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T: Clone + 'static> RenderLog<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A render callback appending to this log.
    pub fn sink<H: HostElement>(&self) -> impl Fn(T, &RenderRoot<H>) + 'static {
        let records = Rc::clone(&self.records);
        move |output: T, root: &RenderRoot<H>| {
            records.borrow_mut().push(RenderRecord {
                output,
                isolated: root.is_isolated(),
            });
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Render outputs, oldest first.
    #[must_use]
    pub fn outputs(&self) -> Vec<T> {
        self.records
            .borrow()
            .iter()
            .map(|r| r.output.clone())
            .collect()
    }

    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.records.borrow().last().map(|r| r.output.clone())
    }

    #[must_use]
    pub fn records(&self) -> Vec<RenderRecord<T>> {
        self.records.borrow().clone()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

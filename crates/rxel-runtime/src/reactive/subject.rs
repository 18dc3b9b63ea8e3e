#![forbid(unsafe_code)]

//! Hot sources: [`Subject`] and the write-triggered [`ValueCell`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::stream::{Observer, Stream};
use super::subscription::Subscription;

struct SubjectInner<T: 'static> {
    observers: Vec<(u64, Observer<T>)>,
    next_id: u64,
}

/// Multicast source that pushes values to its current observers.
///
/// Observers are called in subscription order from a snapshot, so an observer
/// may subscribe or unsubscribe others (or emit again) while being notified.
pub struct Subject<T: 'static> {
    inner: Rc<RefCell<SubjectInner<T>>>,
    stream: Stream<T>,
}

impl<T: 'static> Subject<T> {
    #[must_use]
    pub fn new() -> Self {
        let inner = Rc::new(RefCell::new(SubjectInner {
            observers: Vec::new(),
            next_id: 0,
        }));
        let source = Rc::clone(&inner);
        let stream = Stream::new(move |observer: Observer<T>| {
            let id = {
                let mut s = source.borrow_mut();
                let id = s.next_id;
                s.next_id += 1;
                s.observers.push((id, observer));
                id
            };
            let weak = Rc::downgrade(&source);
            Subscription::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().observers.retain(|(oid, _)| *oid != id);
                }
            })
        });
        Self { inner, stream }
    }

    /// Push `value` to every current observer.
    pub fn next(&self, value: &T) {
        let observers: Vec<Observer<T>> = self
            .inner
            .borrow()
            .observers
            .iter()
            .map(|(_, o)| Rc::clone(o))
            .collect();
        for observer in observers {
            observer(value);
        }
    }

    /// The subject's stream. Every call returns the same stream identity.
    #[must_use]
    pub fn stream(&self) -> Stream<T> {
        self.stream.clone()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }
}

impl<T: 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.observer_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ValueCell
// ---------------------------------------------------------------------------

struct CellInner<T: 'static> {
    value: RefCell<T>,
    subject: Subject<T>,
}

/// A single-value cell whose writes are observable.
///
/// Unlike a deduplicating observable, every [`set`](Self::set) notifies
/// observers, including writes of a value equal to the current one. New
/// observers receive the current value immediately on subscription.
pub struct ValueCell<T: Clone + 'static> {
    inner: Rc<CellInner<T>>,
    stream: Stream<T>,
}

impl<T: Clone + 'static> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            stream: self.stream.clone(),
        }
    }
}

impl<T: Clone + 'static> ValueCell<T> {
    pub fn new(initial: T) -> Self {
        let inner = Rc::new(CellInner {
            value: RefCell::new(initial),
            subject: Subject::new(),
        });
        let source = Rc::clone(&inner);
        let stream = Stream::new(move |observer: Observer<T>| {
            let sub = source.subject.stream().subscribe_rc(Rc::clone(&observer));
            let current = source.value.borrow().clone();
            observer(&current);
            sub
        });
        Self { inner, stream }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Store `value` and notify every observer.
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value.clone();
        self.inner.subject.next(&value);
    }

    /// Observe writes, starting with the current value.
    #[must_use]
    pub fn stream(&self) -> Stream<T> {
        self.stream.clone()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.subject.observer_count()
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCell")
            .field("value", &*self.inner.value.borrow())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#![forbid(unsafe_code)]

//! Cold push streams and their operators.
//!
//! A [`Stream`] is a recipe: nothing runs until [`subscribe`](Stream::subscribe)
//! is called, and every subscription runs the recipe independently. Operator
//! state (the last value seen by [`dedupe`](Stream::dedupe), a throttle's
//! pending value) is therefore per subscription. [`share`](Stream::share)
//! turns a stream into a reference-counted multicast so that several
//! subscribers observe one upstream subscription.
//!
//! # Invariants
//!
//! 1. Values are delivered synchronously, in the order the source produced them.
//! 2. Dropping the returned [`Subscription`] stops delivery to that observer.
//! 3. A shared stream holds at most one upstream subscription, and releases it
//!    when its last observer leaves.
//! 4. No `RefCell` borrow is held while an observer runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::subscription::Subscription;

/// Callback receiving stream values.
pub type Observer<T> = Rc<dyn Fn(&T)>;

type SubscribeFn<T> = dyn Fn(Observer<T>) -> Subscription;

/// Identity of a stream value. Clones share an id; operators produce new ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(usize);

/// A cold, single-threaded push stream.
pub struct Stream<T: 'static> {
    subscribe: Rc<SubscribeFn<T>>,
}

impl<T: 'static> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe: Rc::clone(&self.subscribe),
        }
    }
}

impl<T: 'static> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Stream").field(&self.id()).finish()
    }
}

impl<T: 'static> Stream<T> {
    /// Build a stream from its subscribe function.
    pub fn new(subscribe: impl Fn(Observer<T>) -> Subscription + 'static) -> Self {
        Self {
            subscribe: Rc::new(subscribe),
        }
    }

    /// A stream that never emits.
    #[must_use]
    pub fn never() -> Self {
        Self::new(|_| Subscription::empty())
    }

    #[must_use]
    pub fn id(&self) -> StreamId {
        StreamId(Rc::as_ptr(&self.subscribe).cast::<()>() as usize)
    }

    /// Subscribe with a callback.
    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        (self.subscribe)(Rc::new(observer))
    }

    pub(crate) fn subscribe_rc(&self, observer: Observer<T>) -> Subscription {
        (self.subscribe)(observer)
    }

    /// Transform every value.
    #[must_use]
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Stream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<U>| {
            let f = Rc::clone(&f);
            source.subscribe_rc(Rc::new(move |value: &T| observer(&f(value))))
        })
    }

    /// Forward only values matching `predicate`.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        Stream::new(move |observer: Observer<T>| {
            let predicate = Rc::clone(&predicate);
            source.subscribe_rc(Rc::new(move |value: &T| {
                if predicate(value) {
                    observer(value);
                }
            }))
        })
    }

    /// Run `f` on every value before forwarding it.
    #[must_use]
    pub fn inspect(&self, f: impl Fn(&T) + 'static) -> Stream<T> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<T>| {
            let f = Rc::clone(&f);
            source.subscribe_rc(Rc::new(move |value: &T| {
                f(value);
                observer(value);
            }))
        })
    }

    /// Interleave several streams in arrival order.
    ///
    /// Sources are subscribed in iteration order, so values a source emits
    /// synchronously on subscription arrive in that order too.
    #[must_use]
    pub fn merge(streams: impl IntoIterator<Item = Stream<T>>) -> Stream<T> {
        let sources: Rc<[Stream<T>]> = streams.into_iter().collect();
        Stream::new(move |observer: Observer<T>| {
            Subscription::all(
                sources
                    .iter()
                    .map(|source| source.subscribe_rc(Rc::clone(&observer)))
                    .collect(),
            )
        })
    }

    /// Multicast one upstream subscription to every current observer.
    ///
    /// The upstream is subscribed when the first observer arrives and released
    /// when the last one leaves; a later observer reconnects it. Values the
    /// upstream emits while connecting reach only the observers present at
    /// that moment.
    #[must_use]
    pub fn share(&self) -> Stream<T> {
        let source = self.clone();
        let state: Rc<RefCell<ShareState<T>>> = Rc::new(RefCell::new(ShareState::default()));
        Stream::new(move |observer: Observer<T>| {
            let (id, connect) = {
                let mut s = state.borrow_mut();
                let id = s.next_id;
                s.next_id += 1;
                s.observers.push((id, observer));
                let connect = !s.connected;
                s.connected = true;
                (id, connect)
            };

            if connect {
                let weak = Rc::downgrade(&state);
                let upstream = source.subscribe_rc(Rc::new(move |value: &T| {
                    if let Some(state) = weak.upgrade() {
                        ShareState::broadcast(&state, value);
                    }
                }));
                state.borrow_mut().upstream = Some(upstream);
            }
            Self::share_teardown(&state, id)
        })
    }

    fn share_teardown(state: &Rc<RefCell<ShareState<T>>>, id: u64) -> Subscription {
        let weak: Weak<RefCell<ShareState<T>>> = Rc::downgrade(state);
        Subscription::new(move || {
            let Some(state) = weak.upgrade() else { return };
            let upstream = {
                let mut s = state.borrow_mut();
                s.observers.retain(|(oid, _)| *oid != id);
                if s.observers.is_empty() {
                    s.connected = false;
                    s.upstream.take()
                } else {
                    None
                }
            };
            drop(upstream);
        })
    }

    /// Erase the value type so the stream can be held in a registry.
    ///
    /// Subscribing the erased stream subscribes the original with an observer
    /// that discards values; only the side effects of the pipeline remain.
    #[must_use]
    pub fn erase(&self) -> AnyStream {
        let source = self.clone();
        AnyStream {
            id: self.id(),
            subscribe: Rc::new(move || source.subscribe(|_| {})),
        }
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Emit `value` once to each subscriber, synchronously on subscription.
    #[must_use]
    pub fn of(value: T) -> Stream<T> {
        Stream::new(move |observer: Observer<T>| {
            observer(&value);
            Subscription::empty()
        })
    }
}

impl<T: Clone + PartialEq + 'static> Stream<T> {
    /// Drop values equal to the previously forwarded one.
    ///
    /// Each maximal run of equal consecutive values yields exactly one
    /// emission. The comparison state is per subscription.
    #[must_use]
    pub fn dedupe(&self) -> Stream<T> {
        let source = self.clone();
        Stream::new(move |observer: Observer<T>| {
            let last: RefCell<Option<T>> = RefCell::new(None);
            source.subscribe_rc(Rc::new(move |value: &T| {
                let fresh = {
                    let mut last = last.borrow_mut();
                    if last.as_ref() == Some(value) {
                        false
                    } else {
                        *last = Some(value.clone());
                        true
                    }
                };
                if fresh {
                    observer(value);
                }
            }))
        })
    }
}

struct ShareState<T: 'static> {
    observers: Vec<(u64, Observer<T>)>,
    next_id: u64,
    connected: bool,
    upstream: Option<Subscription>,
}

impl<T: 'static> Default for ShareState<T> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
            next_id: 0,
            connected: false,
            upstream: None,
        }
    }
}

impl<T: 'static> ShareState<T> {
    fn broadcast(state: &RefCell<Self>, value: &T) {
        let observers: Vec<Observer<T>> = state
            .borrow()
            .observers
            .iter()
            .map(|(_, o)| Rc::clone(o))
            .collect();
        for observer in observers {
            observer(value);
        }
    }
}

/// A type-erased stream, keyed by the identity of the stream it came from.
#[derive(Clone)]
pub struct AnyStream {
    id: StreamId,
    subscribe: Rc<dyn Fn() -> Subscription>,
}

impl AnyStream {
    #[must_use]
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Subscribe, discarding values.
    pub fn subscribe(&self) -> Subscription {
        (self.subscribe)()
    }
}

impl fmt::Debug for AnyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyStream").field(&self.id).finish()
    }
}

impl<T: 'static> From<Stream<T>> for AnyStream {
    fn from(stream: Stream<T>) -> Self {
        stream.erase()
    }
}

impl<T: 'static> From<&Stream<T>> for AnyStream {
    fn from(stream: &Stream<T>) -> Self {
        stream.erase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Subject;
    use std::cell::Cell;

    fn collect<T: Clone + 'static>(stream: &Stream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let sub = stream.subscribe(move |v: &T| s.borrow_mut().push(v.clone()));
        (seen, sub)
    }

    #[test]
    fn map_filter_inspect_compose() {
        let subject = Subject::new();
        let tapped = Rc::new(Cell::new(0));
        let t = Rc::clone(&tapped);
        let stream = subject
            .stream()
            .inspect(move |_| t.set(t.get() + 1))
            .filter(|v: &i32| v % 2 == 0)
            .map(|v| v * 10);
        let (seen, _sub) = collect(&stream);
        for v in 1..=4 {
            subject.next(&v);
        }
        assert_eq!(*seen.borrow(), vec![20, 40]);
        assert_eq!(tapped.get(), 4);
    }

    #[test]
    fn dedupe_collapses_runs() {
        let subject = Subject::new();
        let (seen, _sub) = collect(&subject.stream().dedupe());
        for v in [1, 1, 2, 2, 2, 1, 3, 3] {
            subject.next(&v);
        }
        assert_eq!(*seen.borrow(), vec![1, 2, 1, 3]);
    }

    #[test]
    fn dedupe_state_is_per_subscription() {
        let subject = Subject::new();
        let deduped = subject.stream().dedupe();
        let (a, _sa) = collect(&deduped);
        subject.next(&5);
        let (b, _sb) = collect(&deduped);
        subject.next(&5);
        assert_eq!(*a.borrow(), vec![5]);
        assert_eq!(*b.borrow(), vec![5]);
    }

    #[test]
    fn merge_preserves_arrival_order() {
        let left = Subject::new();
        let right = Subject::new();
        let (seen, _sub) = collect(&Stream::merge([left.stream(), right.stream()]));
        left.next(&1);
        right.next(&2);
        left.next(&3);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn of_emits_on_each_subscription() {
        let once = Stream::of(7);
        let (a, _sa) = collect(&once);
        let (b, _sb) = collect(&once);
        assert_eq!(*a.borrow(), vec![7]);
        assert_eq!(*b.borrow(), vec![7]);
    }

    #[test]
    fn share_connects_upstream_once() {
        let subject = Subject::new();
        let runs = Rc::new(Cell::new(0));
        let r = Rc::clone(&runs);
        let shared = subject.stream().inspect(move |_| r.set(r.get() + 1)).share();
        let (a, sa) = collect(&shared);
        let (b, sb) = collect(&shared);
        subject.next(&1);
        assert_eq!(runs.get(), 1);
        assert_eq!(*a.borrow(), vec![1]);
        assert_eq!(*b.borrow(), vec![1]);
        assert_eq!(subject.observer_count(), 1);

        drop(sa);
        assert_eq!(subject.observer_count(), 1);
        drop(sb);
        assert_eq!(subject.observer_count(), 0);

        let (c, _sc) = collect(&shared);
        subject.next(&2);
        assert_eq!(*c.borrow(), vec![2]);
        assert_eq!(subject.observer_count(), 1);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let subject = Subject::new();
        let (seen, sub) = collect(&subject.stream().map(|v: &i32| *v));
        subject.next(&1);
        sub.unsubscribe();
        subject.next(&2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn ids_follow_identity() {
        let stream = Stream::<i32>::never();
        assert_eq!(stream.id(), stream.clone().id());
        assert_ne!(stream.id(), stream.map(|v| *v).id());
        assert_eq!(stream.erase().id(), stream.id());
    }
}

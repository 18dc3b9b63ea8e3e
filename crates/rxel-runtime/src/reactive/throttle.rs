#![forbid(unsafe_code)]

//! Leading-and-trailing throttle.
//!
//! ```text
//!  values:  a  b  c            d
//!  out:     a ------ c ------  d ------
//!           |  interval |  interval |
//! ```
//!
//! The first value in a quiet period is forwarded at once and arms a timer on
//! the scheduler. Values arriving while armed replace a single pending slot.
//! When the timer fires, a pending value is forwarded and the timer re-arms;
//! with nothing pending the throttle goes idle.
//!
//! Values the source delivers synchronously while it is being subscribed (a
//! cell replaying its current value, say) collapse into a single leading
//! emission with the last of them, made once the upstream subscription is in
//! place.
//!
//! Dropping the subscription cancels the timer and discards the pending value.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::stream::{Observer, Stream};
use super::subscription::Subscription;
use crate::scheduler::{Scheduler, TaskHandle};

struct ThrottleState<T> {
    armed: bool,
    closed: bool,
    connecting: bool,
    epoch: u64,
    pending: Option<T>,
    timer: Option<TaskHandle>,
}

struct Throttle<T: 'static> {
    state: RefCell<ThrottleState<T>>,
    scheduler: Rc<dyn Scheduler>,
    downstream: Observer<T>,
}

impl<T: Clone + 'static> Throttle<T> {
    fn on_value(self: &Rc<Self>, value: &T) {
        {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            if state.connecting {
                state.pending = Some(value.clone());
                return;
            }
            if state.armed {
                trace!(scheduler = self.scheduler.name(), "throttle.coalesce");
                state.pending = Some(value.clone());
                return;
            }
            // Armed before forwarding so values produced downstream coalesce.
            state.armed = true;
        }
        (self.downstream)(value);
        self.arm();
    }

    /// End of the upstream subscribe call: forward what it replayed, if anything.
    fn connected(self: &Rc<Self>) {
        let leading = {
            let mut state = self.state.borrow_mut();
            state.connecting = false;
            let leading = state.pending.take();
            if leading.is_some() {
                state.armed = true;
            }
            leading
        };
        if let Some(value) = leading {
            (self.downstream)(&value);
            self.arm();
        }
    }

    fn arm(self: &Rc<Self>) {
        let epoch = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.epoch += 1;
            state.epoch
        };
        let weak: Weak<Self> = Rc::downgrade(self);
        let handle = self.scheduler.schedule(Box::new(move || {
            if let Some(throttle) = weak.upgrade() {
                throttle.boundary(epoch);
            }
        }));
        let mut state = self.state.borrow_mut();
        // A synchronous scheduler has already run the boundary.
        if state.epoch == epoch && handle.is_pending() {
            state.timer = Some(handle);
        }
    }

    fn boundary(self: &Rc<Self>, epoch: u64) {
        let trailing = {
            let mut state = self.state.borrow_mut();
            if state.closed || state.epoch != epoch {
                return;
            }
            state.timer = None;
            let trailing = state.pending.take();
            if trailing.is_none() {
                state.armed = false;
            }
            trailing
        };
        if let Some(value) = trailing {
            trace!(scheduler = self.scheduler.name(), "throttle.trailing");
            (self.downstream)(&value);
            self.arm();
        }
    }

    fn close(&self) {
        let timer = {
            let mut state = self.state.borrow_mut();
            state.closed = true;
            state.pending = None;
            state.timer.take()
        };
        if let Some(timer) = timer {
            timer.cancel();
        }
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Throttle with leading and trailing emission on `scheduler`.
    #[must_use]
    pub fn throttle(&self, scheduler: Rc<dyn Scheduler>) -> Stream<T> {
        let source = self.clone();
        Stream::new(move |observer: Observer<T>| {
            let throttle = Rc::new(Throttle {
                state: RefCell::new(ThrottleState {
                    armed: false,
                    closed: false,
                    connecting: true,
                    epoch: 0,
                    pending: None,
                    timer: None,
                }),
                scheduler: Rc::clone(&scheduler),
                downstream: observer,
            });
            let link = Rc::clone(&throttle);
            let upstream = source.subscribe_rc(Rc::new(move |value: &T| link.on_value(value)));
            throttle.connected();
            Subscription::new(move || {
                throttle.close();
                drop(upstream);
            })
        })
    }
}

#![forbid(unsafe_code)]

//! RAII subscription handles.
//!
//! A [`Subscription`] owns the teardown of one active stream subscription.
//! Dropping it, or calling [`unsubscribe`](Subscription::unsubscribe), runs the
//! teardown exactly once.

use std::fmt;

/// Handle to an active subscription. Unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// A subscription that runs `teardown` when released.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Combine several subscriptions; released in reverse order.
    pub fn all(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || {
            for sub in subscriptions.into_iter().rev() {
                drop(sub);
            }
        })
    }

    /// Release now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Whether the teardown has already run (or there never was one).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.teardown.is_none()
    }

    fn release(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

//! Change notification signals
//!
//! A [`Signal`] is a one-to-many observer list owned by the object that emits
//! it. Observers register a handler and get a [`SubscriptionId`] back; the
//! same id deregisters them. Handlers run synchronously inside `emit`, in
//! no particular order.
//!
//! Handlers are snapshotted before dispatch, so a handler may subscribe or
//! unsubscribe (itself included) while the signal is being emitted. Such
//! changes apply from the next `emit`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::foundation::collections::{SubscriberMap, SubscriptionId};

/// Old and new value carried by a change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change<T> {
    /// Value before the change
    pub previous: T,
    /// Value after the change
    pub current: T,
}

type Handler<T> = Rc<dyn Fn(&T)>;

/// Observer list for one kind of notification
pub struct Signal<T> {
    handlers: RefCell<SubscriberMap<Handler<T>>>,
}

impl<T> Signal<T> {
    /// Create a signal with no subscribers
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(SubscriberMap::with_key()),
        }
    }

    /// Register a handler, returning the id that removes it again
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> SubscriptionId {
        self.handlers.borrow_mut().insert(Rc::new(handler))
    }

    /// Remove a handler; returns false if it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers.borrow_mut().remove(id).is_some()
    }

    /// Notify every registered handler
    pub fn emit(&self, value: &T) {
        let handlers: Vec<Handler<T>> = self.handlers.borrow().values().cloned().collect();
        for handler in handlers {
            handler(value);
        }
    }

    /// Number of registered handlers
    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

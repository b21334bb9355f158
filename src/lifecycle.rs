//! Per-panel lifecycle notifications.
//!
//! Every trackable panel owns a `LifecycleEvents` hub. Whoever drives the
//! panel (the UI host) calls [`LifecycleEvents::emit`] when the panel is
//! activated, closed, or shown/hidden; observers such as the navigation guard
//! subscribe closures and keep the returned [`SubscriptionId`] so they can
//! detach later.
//!
//! Delivery is synchronous. The handler list is snapshotted before delivery, so
//! a handler may subscribe or unsubscribe (itself included) while an event is
//! being emitted without invalidating the iteration.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The panel became the active one (shown or entered).
    Activated,
    /// The panel was closed by its owner.
    Closed,
    /// The panel's visibility flag changed; read the new value from the panel.
    VisibilityChanged,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleEvent::Activated => "activated",
            LifecycleEvent::Closed => "closed",
            LifecycleEvent::VisibilityChanged => "visibility changed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(LifecycleEvent)>;

#[derive(Default)]
pub struct LifecycleEvents {
    handlers: RefCell<Vec<(SubscriptionId, Handler)>>,
    next_id: Cell<u64>,
}

impl fmt::Debug for LifecycleEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleEvents")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LifecycleEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(LifecycleEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Detach a handler. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        handlers.len() != before
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.handlers.borrow().iter().any(|(sub, _)| *sub == id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn emit(&self, event: LifecycleEvent) {
        let snapshot: Vec<(SubscriptionId, Handler)> = self.handlers.borrow().clone();
        for (id, handler) in snapshot {
            // Skip handlers detached by an earlier handler in this same delivery.
            if !self.is_subscribed(id) {
                continue;
            }
            handler(event);
        }
    }
}

//! Capability contracts for panels the navigation guard can observe.
//!
//! A [`Trackable`] is any panel that reports lifecycle events and can be told to
//! take focus. Panels that can hold unsaved work also expose the [`Saveable`]
//! facet through [`Trackable::saveable`]; the guard queries for the facet
//! instead of downcasting.
//!
//! Panels are shared as [`TrackableRef`], which compares by identity: two refs
//! are equal only if they point at the same panel instance.

use std::fmt;
use std::io;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::lifecycle::LifecycleEvents;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("could not save {label}: {source}")]
    Io {
        label: String,
        #[source]
        source: io::Error,
    },
    #[error("could not save {label}: {reason}")]
    Rejected { label: String, reason: String },
}

impl SaveError {
    pub fn io(label: impl Into<String>, source: io::Error) -> Self {
        SaveError::Io {
            label: label.into(),
            source,
        }
    }

    pub fn rejected(label: impl Into<String>, reason: impl Into<String>) -> Self {
        SaveError::Rejected {
            label: label.into(),
            reason: reason.into(),
        }
    }
}

pub trait Trackable {
    /// Display text, used to label the exit prompt.
    fn label(&self) -> String;

    fn is_visible(&self) -> bool;

    /// Ask the panel to take focus. Returns whether focus was acquired.
    ///
    /// Implementations usually emit [`LifecycleEvent::Activated`] from here, the
    /// same way a toolkit raises an enter event when focus moves.
    ///
    /// [`LifecycleEvent::Activated`]: crate::lifecycle::LifecycleEvent::Activated
    fn take_focus(&self) -> bool;

    fn events(&self) -> &LifecycleEvents;

    /// The save facet, if this panel can hold unsaved changes.
    fn saveable(&self) -> Option<&dyn Saveable> {
        None
    }
}

pub trait Saveable {
    fn has_unsaved_changes(&self) -> bool;

    /// Persist the current state. On `Ok`, `has_unsaved_changes` must report false.
    fn commit_changes(&self) -> Result<(), SaveError>;
}

/// Shared, identity-compared handle to a trackable panel.
#[derive(Clone)]
pub struct TrackableRef(Rc<dyn Trackable>);

impl TrackableRef {
    pub fn new<T: Trackable + 'static>(panel: Rc<T>) -> Self {
        Self(panel)
    }

    pub fn ptr_eq(&self, other: &TrackableRef) -> bool {
        // Compare data pointers only; vtable pointers for the same type may differ
        // between codegen units.
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    pub fn downgrade(&self) -> WeakTrackableRef {
        WeakTrackableRef(Rc::downgrade(&self.0))
    }

    pub fn is_saveable(&self) -> bool {
        self.0.saveable().is_some()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.0
            .saveable()
            .is_some_and(|facet| facet.has_unsaved_changes())
    }
}

impl<T: Trackable + 'static> From<Rc<T>> for TrackableRef {
    fn from(panel: Rc<T>) -> Self {
        Self::new(panel)
    }
}

impl std::ops::Deref for TrackableRef {
    type Target = dyn Trackable;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl PartialEq for TrackableRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for TrackableRef {}

impl fmt::Debug for TrackableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TrackableRef").field(&self.0.label()).finish()
    }
}

#[derive(Clone)]
pub struct WeakTrackableRef(Weak<dyn Trackable>);

impl WeakTrackableRef {
    pub fn upgrade(&self) -> Option<TrackableRef> {
        self.0.upgrade().map(TrackableRef)
    }
}

impl fmt::Debug for WeakTrackableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakTrackableRef")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Plain {
        events: LifecycleEvents,
    }

    impl Trackable for Plain {
        fn label(&self) -> String {
            "plain".to_string()
        }
        fn is_visible(&self) -> bool {
            true
        }
        fn take_focus(&self) -> bool {
            true
        }
        fn events(&self) -> &LifecycleEvents {
            &self.events
        }
    }

    struct Dirty {
        events: LifecycleEvents,
        dirty: Cell<bool>,
    }

    impl Trackable for Dirty {
        fn label(&self) -> String {
            "dirty".to_string()
        }
        fn is_visible(&self) -> bool {
            true
        }
        fn take_focus(&self) -> bool {
            true
        }
        fn events(&self) -> &LifecycleEvents {
            &self.events
        }
        fn saveable(&self) -> Option<&dyn Saveable> {
            Some(self)
        }
    }

    impl Saveable for Dirty {
        fn has_unsaved_changes(&self) -> bool {
            self.dirty.get()
        }
        fn commit_changes(&self) -> Result<(), SaveError> {
            self.dirty.set(false);
            Ok(())
        }
    }

    #[test]
    fn identity_not_structure_decides_equality() {
        let a = TrackableRef::new(Rc::new(Plain {
            events: LifecycleEvents::new(),
        }));
        let b = TrackableRef::new(Rc::new(Plain {
            events: LifecycleEvents::new(),
        }));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn saveable_facet_is_optional() {
        let plain = TrackableRef::new(Rc::new(Plain {
            events: LifecycleEvents::new(),
        }));
        assert!(!plain.is_saveable());
        assert!(!plain.has_unsaved_changes());

        let dirty = Rc::new(Dirty {
            events: LifecycleEvents::new(),
            dirty: Cell::new(true),
        });
        let r = TrackableRef::from(dirty.clone());
        assert!(r.is_saveable());
        assert!(r.has_unsaved_changes());
        r.saveable().unwrap().commit_changes().unwrap();
        assert!(!dirty.has_unsaved_changes());
    }

    #[test]
    fn weak_ref_does_not_keep_panel_alive() {
        let r = TrackableRef::new(Rc::new(Plain {
            events: LifecycleEvents::new(),
        }));
        let weak = r.downgrade();
        assert_eq!(weak.upgrade(), Some(r.clone()));
        drop(r);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn save_error_messages_name_the_panel() {
        let err = SaveError::rejected("Report", "read-only");
        assert_eq!(err.to_string(), "could not save Report: read-only");
        let err = SaveError::io("Report", io::Error::other("disk full"));
        assert_eq!(err.to_string(), "could not save Report: disk full");
    }
}

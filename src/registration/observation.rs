//! Observer and listener bookkeeping for a registration

use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::events::EventType;
use crate::hotkey::{Key, Modifiers};

/// Handler run when an observed event fires
pub type Handler = Rc<dyn Fn()>;

/// Listener told when a registration turns on or off
pub type RegistrationListener = Rc<dyn Fn(bool)>;

/// Listener told the new key and modifiers after a change
pub type ShortcutListener = Rc<dyn Fn(Option<Key>, Modifiers)>;

/// A listener call queued while the registry is borrowed
pub(crate) type Notification = Box<dyn FnOnce()>;

/// Identity of an observation; two observations are never equal by content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationId(Uuid);

impl ObservationId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a registration or shortcut change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// An event type paired with the handler to run for it
#[derive(Clone)]
pub struct Observation {
    pub id: ObservationId,
    pub event_type: EventType,
    pub handler: Handler,
}

impl Observation {
    pub fn new(event_type: EventType, handler: Handler) -> Self {
        Self {
            id: ObservationId::new(),
            event_type,
            handler,
        }
    }
}

impl fmt::Debug for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observation")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Change listeners attached to one registration
#[derive(Default)]
pub(crate) struct Listeners {
    registration: Vec<(ListenerId, RegistrationListener)>,
    shortcut: Vec<(ListenerId, ShortcutListener)>,
}

impl Listeners {
    pub fn add_registration(&mut self, listener: RegistrationListener) -> ListenerId {
        let id = ListenerId::new();
        self.registration.push((id, listener));
        id
    }

    pub fn add_shortcut(&mut self, listener: ShortcutListener) -> ListenerId {
        let id = ListenerId::new();
        self.shortcut.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.registration.len() + self.shortcut.len();
        self.registration.retain(|(lid, _)| *lid != id);
        self.shortcut.retain(|(lid, _)| *lid != id);
        before != self.registration.len() + self.shortcut.len()
    }

    pub fn registration_calls(&self, registered: bool) -> Vec<Notification> {
        self.registration
            .iter()
            .map(|(_, listener)| {
                let listener = Rc::clone(listener);
                Box::new(move || listener(registered)) as Notification
            })
            .collect()
    }

    pub fn shortcut_calls(&self, key: Option<Key>, modifiers: Modifiers) -> Vec<Notification> {
        self.shortcut
            .iter()
            .map(|(_, listener)| {
                let listener = Rc::clone(listener);
                Box::new(move || listener(key, modifiers)) as Notification
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_observations_are_distinct_by_id() {
        let handler: Handler = Rc::new(|| {});
        let a = Observation::new(EventType::KeyDown, Rc::clone(&handler));
        let b = Observation::new(EventType::KeyDown, handler);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_listener_calls_are_deferred() {
        let seen = Rc::new(Cell::new(None));
        let mut listeners = Listeners::default();
        let sink = Rc::clone(&seen);
        listeners.add_registration(Rc::new(move |on: bool| sink.set(Some(on))));

        let calls = listeners.registration_calls(true);
        assert_eq!(seen.get(), None);
        calls.into_iter().for_each(|call| call());
        assert_eq!(seen.get(), Some(true));
    }

    #[test]
    fn test_remove_listener() {
        let mut listeners = Listeners::default();
        let id = listeners.add_shortcut(Rc::new(|_: Option<Key>, _: Modifiers| {}));
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        assert!(listeners.shortcut_calls(None, Modifiers::empty()).is_empty());
    }
}

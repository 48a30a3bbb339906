//! Registration state machine
//!
//! A registration is the single in-process owner of one named shortcut. It
//! holds the key and modifiers, the OS registration handle, and the observers.
//!
//! States: Unregistered (initial) <-> Registered. A registration is only
//! Registered when it has a key, at least one modifier, and registration was
//! requested and succeeded.

use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::observation::{
    Handler, ListenerId, Listeners, Notification, Observation, ObservationId,
    RegistrationListener, ShortcutListener,
};
use super::registry::Routes;
use crate::dispatch::EventDispatcher;
use crate::error::HotkeyError;
use crate::events::{EventType, HotKeyEventKind};
use crate::hotkey::{Key, Modifiers, Name};
use crate::platform::{HotKeyHandle, HotKeyId, HotkeyService, NO_ERR};
use crate::store::{PreferenceStore, StoredShortcut};

/// Collaborators a registration needs while changing state
pub(crate) struct Backend<'a> {
    pub service: &'a mut dyn HotkeyService,
    pub store: &'a mut dyn PreferenceStore,
    pub dispatcher: &'a mut EventDispatcher,
    pub routes: &'a mut Routes,
}

/// The per-name proxy between a shortcut and its OS registration
pub struct Registration {
    id: HotKeyId,
    name: Name,
    key: Option<Key>,
    modifiers: Modifiers,
    /// Some iff registered with the OS
    handle: Option<HotKeyHandle>,
    /// Defers re-registration while a batch of changes is applied
    suppressed: bool,
    observations: Vec<Observation>,
    last_key_up: Option<Instant>,
    listeners: Listeners,
    pending: Vec<Notification>,
}

impl Registration {
    pub(crate) fn new(name: Name, id: HotKeyId) -> Self {
        Self {
            id,
            name,
            key: None,
            modifiers: Modifiers::empty(),
            handle: None,
            suppressed: false,
            observations: Vec::new(),
            last_key_up: None,
            listeners: Listeners::default(),
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> HotKeyId {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn key(&self) -> Option<Key> {
        self.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_registered(&self) -> bool {
        self.handle.is_some()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Shortcut rendered as modifier symbols followed by the key label
    pub fn shortcut_string(&self) -> String {
        match self.key {
            Some(key) => format!("{}{}", self.modifiers, key),
            None => String::new(),
        }
    }

    /// Snapshot of the current value for persistence
    pub fn stored_value(&self) -> StoredShortcut {
        StoredShortcut {
            key: self.key,
            modifiers: self.modifiers,
            name: self.name.clone(),
        }
    }

    /// Take a persisted value without registering or notifying
    pub(crate) fn adopt(&mut self, stored: StoredShortcut) {
        self.key = stored.key;
        self.modifiers = stored.modifiers;
    }

    // ------------------------------------------------------------------
    // Key and modifier mutation
    // ------------------------------------------------------------------

    pub(crate) fn set_key(&mut self, key: Option<Key>, backend: &mut Backend<'_>) {
        self.key = key;
        self.apply_change(backend);
    }

    pub(crate) fn set_modifiers(&mut self, modifiers: Modifiers, backend: &mut Backend<'_>) {
        self.modifiers = modifiers;
        self.apply_change(backend);
    }

    /// Replace key and modifiers together with one re-registration pass
    pub(crate) fn set_shortcut(
        &mut self,
        key: Option<Key>,
        modifiers: Modifiers,
        backend: &mut Backend<'_>,
    ) {
        self.suppressed = true;
        self.set_key(key, backend);
        self.set_modifiers(modifiers, backend);
        self.suppressed = false;

        if self.is_registered() {
            self.unregister(backend, true);
        }
    }

    /// Clear key and modifiers; leaves the registration Unregistered
    pub(crate) fn remove_key_and_modifiers(&mut self, backend: &mut Backend<'_>) {
        self.set_shortcut(None, Modifiers::empty(), backend);
    }

    fn apply_change(&mut self, backend: &mut Backend<'_>) {
        if !self.suppressed && self.is_registered() {
            self.unregister(backend, true);
        }
        // Listeners hear about every change, suppressed or not
        let calls = self.listeners.shortcut_calls(self.key, self.modifiers);
        self.pending.extend(calls);
    }

    // ------------------------------------------------------------------
    // OS registration
    // ------------------------------------------------------------------

    /// Register with the OS; failures are logged and leave the state Unregistered
    pub(crate) fn register(&mut self, backend: &mut Backend<'_>) {
        if self.suppressed {
            return;
        }
        let Some(key) = self.key else {
            debug!(name = %self.name, "not registering hotkey without a key");
            return;
        };
        if self.modifiers.is_empty() {
            debug!(name = %self.name, "not registering hotkey without modifiers");
            return;
        }

        if self.is_registered() {
            self.unregister(backend, false);
        }

        let status = backend.dispatcher.install(backend.service);
        if status != NO_ERR {
            let err = HotkeyError::InstallationFailed { status };
            warn!(name = %self.name, status, "{err}");
            return;
        }

        let handle = match backend
            .service
            .register(key.code(), self.modifiers.carbon_flags(), self.id)
        {
            Ok(handle) => handle,
            Err(status) => {
                let err = HotkeyError::RegistrationFailed {
                    name: self.name.to_string(),
                    status,
                };
                warn!(status, "{err}");
                return;
            }
        };

        backend.routes.insert(self.id.id, self.name.clone());

        let stored_key = self.name.combined_value();
        let persisted = self
            .stored_value()
            .encode()
            .and_then(|bytes| backend.store.set(&stored_key, bytes));
        if let Err(err) = persisted {
            warn!(name = %self.name, error = %err, "failed to persist shortcut");
        }

        self.handle = Some(handle);
        info!(name = %self.name, shortcut = %self.shortcut_string(), id = %self.id, "hotkey registered");
        let calls = self.listeners.registration_calls(true);
        self.pending.extend(calls);
    }

    /// Unregister from the OS and drop the persisted value
    ///
    /// The state becomes Unregistered even when the OS reports a failure.
    /// With `reregister`, registration is attempted again right away.
    pub(crate) fn unregister(&mut self, backend: &mut Backend<'_>, reregister: bool) {
        if self.suppressed {
            return;
        }
        let Some(handle) = self.handle.take() else {
            return;
        };

        let status = backend.service.unregister(handle);
        if status != NO_ERR {
            let err = HotkeyError::UnregistrationFailed {
                name: self.name.to_string(),
                status,
            };
            warn!(status, "{err}");
        }
        backend.routes.remove(&self.id.id);

        if let Err(err) = backend.store.remove(&self.name.combined_value()) {
            warn!(name = %self.name, error = %err, "failed to clear persisted shortcut");
        }

        debug!(name = %self.name, "hotkey unregistered");
        let calls = self.listeners.registration_calls(false);
        self.pending.extend(calls);

        if reregister {
            self.register(backend);
        }
    }

    /// Release the OS registration only, leaving the store untouched
    pub(crate) fn release(&mut self, service: &mut dyn HotkeyService) {
        if let Some(handle) = self.handle.take() {
            let status = service.unregister(handle);
            if status != NO_ERR {
                warn!(name = %self.name, status, "failed to release hotkey");
            }
        }
    }

    /// Unregister and forget the persisted value, registered or not
    pub(crate) fn teardown(&mut self, backend: &mut Backend<'_>) {
        self.suppressed = false;
        self.unregister(backend, false);
        if let Err(err) = backend.store.remove(&self.name.combined_value()) {
            warn!(name = %self.name, error = %err, "failed to clear persisted shortcut");
        }
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Append an observation; the caller decides whether to register
    pub(crate) fn observe(&mut self, event_type: EventType, handler: Handler) -> ObservationId {
        let observation = Observation::new(event_type, handler);
        let id = observation.id;
        self.observations.push(observation);
        id
    }

    pub(crate) fn remove_observation(&mut self, id: ObservationId) -> bool {
        let before = self.observations.len();
        self.observations.retain(|o| o.id != id);
        before != self.observations.len()
    }

    pub(crate) fn remove_all_observations(&mut self) {
        self.observations.clear();
    }

    pub(crate) fn add_registration_listener(&mut self, listener: RegistrationListener) -> ListenerId {
        self.listeners.add_registration(listener)
    }

    pub(crate) fn add_shortcut_listener(&mut self, listener: ShortcutListener) -> ListenerId {
        self.listeners.add_shortcut(listener)
    }

    pub(crate) fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Turn an OS event into the handlers to run, in observation order
    ///
    /// A release also yields a double tap measured from the previous release.
    pub(crate) fn resolve_event(&mut self, kind: HotKeyEventKind, at: Instant) -> Vec<Handler> {
        let mut fired = Vec::with_capacity(2);
        match kind {
            HotKeyEventKind::Pressed => fired.push(EventType::KeyDown),
            HotKeyEventKind::Released => {
                fired.push(EventType::KeyUp);
                if let Some(previous) = self.last_key_up {
                    fired.push(EventType::DoubleTap {
                        interval: at.saturating_duration_since(previous),
                    });
                }
                self.last_key_up = Some(at);
            }
        }

        self.observations
            .iter()
            .filter(|o| fired.iter().any(|event| o.event_type.matches(event)))
            .map(|o| Rc::clone(&o.handler))
            .collect()
    }

    /// Listener calls queued since the last drain
    pub(crate) fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key", &self.key)
            .field("modifiers", &self.modifiers)
            .field("registered", &self.is_registered())
            .field("observations", &self.observations.len())
            .finish()
    }
}

//! Named shortcut facade
//!
//! A [`Command`] is a lightweight handle made of a [`Name`] and a non-owning
//! reference to the center it belongs to. Every accessor and mutator goes
//! through the center's registry, so all commands with the same name share
//! one registration.
//!
//! Commands do not keep the center alive. Handlers may capture them freely;
//! once the last [`HotkeyCenter`] handle is dropped, accessors report a blank,
//! disabled shortcut and mutators do nothing.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use tracing::debug;

use crate::center::{HotkeyCenter, WeakCenter};
use crate::events::EventType;
use crate::hotkey::{Key, Modifiers, Name};
use crate::platform::HotKeyId;
use crate::registration::{Backend, ListenerId, ObservationId, Registration};

#[derive(Clone)]
pub struct Command {
    center: WeakCenter,
    name: Name,
}

impl Command {
    /// Command named `raw_value` under the center's default prefix
    ///
    /// A previously persisted shortcut for the name is adopted but not
    /// registered.
    pub fn new(center: &HotkeyCenter, raw_value: impl Into<String>) -> Self {
        Self::with_name(center, center.name(raw_value))
    }

    pub fn with_name(center: &HotkeyCenter, name: Name) -> Self {
        center.resolve(&name);
        Self {
            center: center.downgrade(),
            name,
        }
    }

    /// Command with an explicit shortcut
    ///
    /// Overwrites whatever value other commands with the same name hold.
    pub fn with_shortcut(
        center: &HotkeyCenter,
        raw_value: impl Into<String>,
        key: Key,
        modifiers: impl Into<Modifiers>,
    ) -> Self {
        let command = Self::new(center, raw_value);
        command.set_shortcut(Some(key), modifiers.into());
        command
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The center this command belongs to, if it still exists
    pub fn center(&self) -> Option<HotkeyCenter> {
        self.center.upgrade()
    }

    pub fn key(&self) -> Option<Key> {
        self.read(|r| r.key()).flatten()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.read(|r| r.modifiers()).unwrap_or_default()
    }

    /// Whether the shortcut is currently registered with the OS
    pub fn is_enabled(&self) -> bool {
        self.read(|r| r.is_registered()).unwrap_or(false)
    }

    /// Compound id used to route OS events to this command
    pub fn hotkey_id(&self) -> HotKeyId {
        self.read(|r| r.id()).unwrap_or_default()
    }

    /// Modifier symbols followed by the key label, e.g. `⌥⇧Space`
    pub fn shortcut_string(&self) -> String {
        self.read(|r| r.shortcut_string()).unwrap_or_default()
    }

    pub fn set_key(&self, key: Option<Key>) {
        self.update(|r, backend| r.set_key(key, backend));
    }

    pub fn set_modifiers(&self, modifiers: impl Into<Modifiers>) {
        let modifiers = modifiers.into();
        self.update(|r, backend| r.set_modifiers(modifiers, backend));
    }

    /// Replace key and modifiers with a single re-registration
    pub fn set_shortcut(&self, key: Option<Key>, modifiers: impl Into<Modifiers>) {
        let modifiers = modifiers.into();
        self.update(|r, backend| r.set_shortcut(key, modifiers, backend));
    }

    /// Run `handler` on every `event_type` event; also enables the command
    pub fn observe(&self, event_type: EventType, handler: impl Fn() + 'static) -> ObservationId {
        let handler = Rc::new(handler);
        self.update(|r, backend| {
            let id = r.observe(event_type, handler);
            r.register(backend);
            id
        })
        .unwrap_or_else(ObservationId::new)
    }

    pub fn remove_observation(&self, id: ObservationId) -> bool {
        self.update(|r, _| r.remove_observation(id)).unwrap_or(false)
    }

    pub fn remove_all_observations(&self) {
        self.update(|r, _| r.remove_all_observations());
    }

    /// Register with the OS; a no-op without a key and at least one modifier
    pub fn enable(&self) {
        self.update(|r, backend| r.register(backend));
    }

    /// Unregister from the OS, keeping key and modifiers
    pub fn disable(&self) {
        self.update(|r, backend| r.unregister(backend, false));
    }

    /// Unregister, clear persistence and forget the registration
    ///
    /// Commands with this name start fresh afterwards.
    pub fn remove(&self) {
        if let Some(center) = self.live_center() {
            center.remove(&self.name);
        }
    }

    pub fn remove_key_and_modifiers(&self) {
        self.update(|r, backend| r.remove_key_and_modifiers(backend));
    }

    /// Listen for the command turning on or off
    pub fn on_registration_change(&self, listener: impl Fn(bool) + 'static) -> ListenerId {
        let listener = Rc::new(listener);
        self.update(|r, _| r.add_registration_listener(listener))
            .unwrap_or_else(ListenerId::new)
    }

    /// Listen for key or modifier changes
    pub fn on_shortcut_change(
        &self,
        listener: impl Fn(Option<Key>, Modifiers) + 'static,
    ) -> ListenerId {
        let listener = Rc::new(listener);
        self.update(|r, _| r.add_shortcut_listener(listener))
            .unwrap_or_else(ListenerId::new)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.update(|r, _| r.remove_listener(id)).unwrap_or(false)
    }

    fn live_center(&self) -> Option<HotkeyCenter> {
        let center = self.center.upgrade();
        if center.is_none() {
            debug!(name = %self.name, "hotkey center is gone, ignoring command");
        }
        center
    }

    fn read<R>(&self, f: impl FnOnce(&Registration) -> R) -> Option<R> {
        let center = self.live_center()?;
        Some(center.read(&self.name, f))
    }

    fn update<R>(&self, f: impl FnOnce(&mut Registration, &mut Backend<'_>) -> R) -> Option<R> {
        let center = self.live_center()?;
        Some(center.update(&self.name, f))
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.center.ptr_eq(&other.center)
    }
}

impl Eq for Command {}

impl Hash for Command {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("center_alive", &self.center.is_alive())
            .finish()
    }
}

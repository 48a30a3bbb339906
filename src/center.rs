//! Owner of the shortcut subsystem
//!
//! A [`HotkeyCenter`] holds the registry, the event dispatcher and the two
//! external collaborators (OS hotkey service and preference store). It is a
//! cheap, clonable handle; every clone refers to the same state.
//!
//! Everything runs on the thread that pumps the OS event loop. Listener and
//! observer callbacks run after the internal borrow is released, so they may
//! call back into the center.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::dispatch::EventDispatcher;
use crate::error::{HotkeyError, Result};
use crate::events::HotKeyEventKind;
use crate::hotkey::{Key, Modifiers, Name};
use crate::platform::{EventSink, HotKeyId, HotkeyService};
use crate::registration::{Backend, Handler, Notification, Registration, Registry};
use crate::store::{PreferenceStore, StoredShortcut};

struct Inner {
    prefix: String,
    registry: Registry,
    dispatcher: EventDispatcher,
    service: Box<dyn HotkeyService>,
    store: Box<dyn PreferenceStore>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Process teardown: release OS resources, keep persisted values
        for registration in self.registry.registrations_mut() {
            registration.release(self.service.as_mut());
        }
        if let Err(err) = self.dispatcher.uninstall(self.service.as_mut()) {
            warn!(error = %err, "failed to remove hotkey event handler on teardown");
        }
    }
}

/// Shared handle to the shortcut subsystem
#[derive(Clone)]
pub struct HotkeyCenter {
    inner: Rc<RefCell<Inner>>,
}

impl HotkeyCenter {
    /// Create a center; `prefix` is the default prefix for [`HotkeyCenter::name`]
    pub fn new(
        service: impl HotkeyService + 'static,
        store: impl PreferenceStore + 'static,
        prefix: impl Into<String>,
    ) -> Self {
        let signature = process_signature();
        let prefix = prefix.into();

        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<Inner>>| {
            let weak = weak.clone();
            let sink: EventSink = Rc::new(move |id: HotKeyId, kind: HotKeyEventKind| {
                match weak.upgrade() {
                    Some(inner) => HotkeyCenter { inner }.handle_event(id, kind),
                    None => false,
                }
            });

            RefCell::new(Inner {
                prefix,
                registry: Registry::new(signature),
                dispatcher: EventDispatcher::new(signature, sink),
                service: Box::new(service),
                store: Box::new(store),
            })
        });

        debug!(signature = %format!("{signature:08x}"), "hotkey center created");
        Self { inner }
    }

    /// Name with the configured default prefix
    pub fn name(&self, raw_value: impl Into<String>) -> Name {
        Name::with_prefix(raw_value, self.inner.borrow().prefix.clone())
    }

    pub fn prefix(&self) -> String {
        self.inner.borrow().prefix.clone()
    }

    pub(crate) fn downgrade(&self) -> WeakCenter {
        WeakCenter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Signature stamped on every hotkey id issued by this center
    pub fn signature(&self) -> u32 {
        self.inner.borrow().dispatcher.signature()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.inner.borrow().registry.lookup(name).is_some()
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.inner.borrow().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().registry.is_empty()
    }

    pub fn is_installed(&self) -> bool {
        self.inner.borrow().dispatcher.is_installed()
    }

    /// Install the shared event handler; a no-op if already installed
    pub fn install(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let Inner {
            dispatcher,
            service,
            ..
        } = &mut *inner;
        match dispatcher.install(service.as_mut()) {
            crate::platform::NO_ERR => Ok(()),
            status => Err(HotkeyError::InstallationFailed { status }),
        }
    }

    /// Remove the shared event handler
    ///
    /// Registrations stay registered with the OS but no longer receive events
    /// until the handler is installed again.
    pub fn uninstall(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let Inner {
            dispatcher,
            service,
            ..
        } = &mut *inner;
        dispatcher.uninstall(service.as_mut())
    }

    /// Check whether an enabled system shortcut already uses this combination
    pub fn is_reserved_by_system(&self, key: Key, modifiers: Modifiers) -> Result<bool> {
        let shortcuts = self
            .inner
            .borrow()
            .service
            .system_shortcuts()
            .map_err(|status| HotkeyError::SystemRetrievalFailed { status })?;

        Ok(shortcuts
            .iter()
            .any(|s| s.enabled && s.key_code == key.code() && s.modifiers == modifiers))
    }

    /// Handle an event from the OS hotkey service
    ///
    /// Returns `false` for events that do not belong to this center so the OS
    /// can pass them on.
    pub fn handle_event(&self, id: HotKeyId, kind: HotKeyEventKind) -> bool {
        self.dispatch_at(id, kind, Instant::now())
    }

    pub(crate) fn dispatch_at(&self, id: HotKeyId, kind: HotKeyEventKind, at: Instant) -> bool {
        let handlers: Vec<Handler> = {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                warn!(%id, "hotkey event arrived during a registry update, passing it on");
                return false;
            };

            if !inner.dispatcher.accepts(id) {
                debug!(%id, "ignoring hotkey event with a foreign signature");
                return false;
            }

            let Some(registration) = inner.registry.resolve_mut(id.id) else {
                debug!(%id, "ignoring hotkey event for an unknown id");
                return false;
            };
            if !registration.is_registered() {
                return false;
            }

            debug!(name = %registration.name(), ?kind, "hotkey event");
            registration.resolve_event(kind, at)
        };

        for handler in handlers {
            handler();
        }
        true
    }

    // ------------------------------------------------------------------
    // Registration access used by the facade
    // ------------------------------------------------------------------

    /// Make sure a registration exists for `name`
    ///
    /// A new registration adopts any persisted value without registering.
    pub(crate) fn resolve(&self, name: &Name) {
        let mut inner = self.inner.borrow_mut();
        if inner.registry.lookup(name).is_some() {
            return;
        }

        let stored = match StoredShortcut::load(inner.store.as_ref(), name) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(name = %name, error = %err, "ignoring unreadable persisted shortcut");
                None
            }
        };

        let registration = inner.registry.get_or_create(name);
        if let Some(stored) = stored {
            debug!(name = %name, "adopting persisted shortcut");
            registration.adopt(stored);
        }
    }

    /// Read from the registration for `name`, creating it if needed
    pub(crate) fn read<R>(&self, name: &Name, f: impl FnOnce(&Registration) -> R) -> R {
        self.resolve(name);
        let mut inner = self.inner.borrow_mut();
        f(inner.registry.get_or_create(name))
    }

    /// Mutate the registration for `name`, then deliver queued notifications
    pub(crate) fn update<R>(
        &self,
        name: &Name,
        f: impl FnOnce(&mut Registration, &mut Backend<'_>) -> R,
    ) -> R {
        self.resolve(name);

        let (result, notifications) = {
            let mut inner = self.inner.borrow_mut();
            let Inner {
                registry,
                dispatcher,
                service,
                store,
                ..
            } = &mut *inner;

            let (registration, routes) = registry.get_or_create_with_routes(name);
            let mut backend = Backend {
                service: service.as_mut(),
                store: store.as_mut(),
                dispatcher,
                routes,
            };
            let result = f(registration, &mut backend);
            (result, registration.take_notifications())
        };

        deliver(notifications);
        result
    }

    /// Tear down and forget the registration for `name`
    pub(crate) fn remove(&self, name: &Name) {
        let notifications = {
            let mut inner = self.inner.borrow_mut();
            let Inner {
                registry,
                dispatcher,
                service,
                store,
                ..
            } = &mut *inner;

            let (registration, routes) = registry.get_or_create_with_routes(name);
            let mut backend = Backend {
                service: service.as_mut(),
                store: store.as_mut(),
                dispatcher,
                routes,
            };
            registration.teardown(&mut backend);
            let notifications = registration.take_notifications();
            registry.remove(name);
            notifications
        };

        debug!(name = %name, "registration removed");
        deliver(notifications);
    }
}

/// Non-owning reference to a [`HotkeyCenter`]
///
/// Handed to facade values so handlers stored inside the center can capture
/// them without keeping the center alive.
#[derive(Clone)]
pub(crate) struct WeakCenter {
    inner: Weak<RefCell<Inner>>,
}

impl WeakCenter {
    pub fn upgrade(&self) -> Option<HotkeyCenter> {
        self.inner.upgrade().map(|inner| HotkeyCenter { inner })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl PartialEq for HotkeyCenter {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for HotkeyCenter {}

impl std::fmt::Debug for HotkeyCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("HotkeyCenter")
                .field("prefix", &inner.prefix)
                .field("registry", &inner.registry)
                .field("installed", &inner.dispatcher.is_installed())
                .finish(),
            Err(_) => f.write_str("HotkeyCenter { <busy> }"),
        }
    }
}

fn deliver(notifications: Vec<Notification>) {
    for notify in notifications {
        notify();
    }
}

/// Random, non-zero signature for this center's hotkey ids
fn process_signature() -> u32 {
    let bytes = Uuid::new_v4().into_bytes();
    let signature = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    signature.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use crate::hotkey::Modifier;
    use crate::platform::{RecordingService, SystemShortcut};
    use crate::store::MemoryStore;
    use std::cell::Cell;
    use std::time::Duration;

    fn center() -> (HotkeyCenter, RecordingService, MemoryStore) {
        let service = RecordingService::new();
        let store = MemoryStore::new();
        let center = HotkeyCenter::new(service.clone(), store.clone(), "test.");
        (center, service, store)
    }

    fn counter() -> (Rc<Cell<u32>>, Handler) {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        (count, Rc::new(move || seen.set(seen.get() + 1)))
    }

    fn enabled(center: &HotkeyCenter, raw: &str, event_type: EventType, handler: Handler) -> Name {
        let name = center.name(raw);
        center.update(&name, |r, backend| {
            r.set_shortcut(Some(Key::Space), Modifier::Command.into(), backend);
            r.observe(event_type, handler);
            r.register(backend);
        });
        name
    }

    #[test]
    fn test_name_uses_prefix() {
        let (center, _, _) = center();
        assert_eq!(center.name("toggle").combined_value(), "test.toggle");
        assert_eq!(center.prefix(), "test.");
    }

    #[test]
    fn test_ids_carry_center_signature() {
        let (center, _, _) = center();
        let name = center.name("toggle");
        assert_ne!(center.signature(), 0);
        assert_eq!(center.read(&name, |r| r.id()).signature, center.signature());
        assert_eq!(center.clone(), center);
    }

    #[test]
    fn test_dispatch_reaches_observer() {
        let (center, service, _) = center();
        let (count, handler) = counter();
        enabled(&center, "toggle", EventType::KeyDown, handler);

        let flags = Modifiers::from(Modifier::Command).carbon_flags();
        assert!(service.press(Key::Space.code(), flags));
        assert_eq!(count.get(), 1);
        // Key up has no matching observer but is still ours
        assert!(service.release(Key::Space.code(), flags));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_foreign_signature_passes_through() {
        let (center, service, _) = center();
        let (count, handler) = counter();
        let name = enabled(&center, "toggle", EventType::KeyDown, handler);
        let id = center.read(&name, |r| r.id());

        let foreign = HotKeyId {
            signature: id.signature.wrapping_add(1),
            id: id.id,
        };
        assert!(!service.send(foreign, HotKeyEventKind::Pressed));
        assert!(!service.send(
            HotKeyId {
                signature: id.signature,
                id: id.id + 100
            },
            HotKeyEventKind::Pressed
        ));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_unregistered_id_is_not_handled() {
        let (center, _, _) = center();
        let (count, handler) = counter();
        let name = enabled(&center, "toggle", EventType::KeyDown, handler);
        let id = center.read(&name, |r| r.id());

        center.update(&name, |r, backend| r.unregister(backend, false));
        assert!(!center.handle_event(id, HotKeyEventKind::Pressed));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_double_tap_dispatch() {
        let (center, _, _) = center();
        let (count, handler) = counter();
        let name = enabled(&center, "toggle", EventType::double_tap(1.0), handler);
        let id = center.read(&name, |r| r.id());

        let t0 = Instant::now();
        center.dispatch_at(id, HotKeyEventKind::Released, t0);
        center.dispatch_at(id, HotKeyEventKind::Released, t0 + Duration::from_millis(500));
        assert_eq!(count.get(), 1);

        let t1 = t0 + Duration::from_millis(500) + Duration::from_secs(2);
        center.dispatch_at(id, HotKeyEventKind::Released, t1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_handler_may_reenter_center() {
        let (center, service, _) = center();
        let name = center.name("toggle");
        let reentrant = center.downgrade();
        let target = name.clone();
        let handler: Handler = Rc::new(move || {
            if let Some(center) = reentrant.upgrade() {
                center.update(&target, |r, backend| r.unregister(backend, false));
            }
        });
        enabled(&center, "toggle", EventType::KeyDown, handler);

        let flags = Modifiers::from(Modifier::Command).carbon_flags();
        assert!(service.press(Key::Space.code(), flags));
        assert!(!center.read(&name, |r| r.is_registered()));
    }

    #[test]
    fn test_resolve_adopts_persisted_value() {
        let (center, service, mut store) = center();
        let name = center.name("palette");
        let stored = StoredShortcut {
            key: Some(Key::P),
            modifiers: Modifiers::from([Modifier::Command, Modifier::Shift]),
            name: name.clone(),
        };
        store
            .set(&name.combined_value(), stored.encode().unwrap())
            .unwrap();

        let (key, modifiers, registered) =
            center.read(&name, |r| (r.key(), r.modifiers(), r.is_registered()));
        assert_eq!(key, Some(Key::P));
        assert_eq!(modifiers, stored.modifiers);
        assert!(!registered);
        assert_eq!(service.register_calls(), 0);
    }

    #[test]
    fn test_resolve_ignores_corrupt_value() {
        let (center, _, mut store) = center();
        let name = center.name("palette");
        store.set(&name.combined_value(), b"{".to_vec()).unwrap();

        assert_eq!(center.read(&name, |r| r.key()), None);
    }

    #[test]
    fn test_remove_forgets_registration() {
        let (center, service, store) = center();
        let (_, handler) = counter();
        let name = enabled(&center, "toggle", EventType::KeyDown, handler);
        assert!(store.contains("test.toggle"));

        center.remove(&name);
        assert!(!center.contains(&name));
        assert!(service.registered().is_empty());
        assert!(!store.contains("test.toggle"));
    }

    #[test]
    fn test_install_and_uninstall() {
        let (center, service, _) = center();
        center.install().unwrap();
        center.install().unwrap();
        assert_eq!(service.install_calls(), 1);

        service.fail_next_remove(-50);
        assert!(matches!(
            center.uninstall(),
            Err(HotkeyError::UninstallationFailed { status: -50 })
        ));
        center.uninstall().unwrap();
        assert!(!center.is_installed());
        assert!(!service.is_handler_installed());
    }

    #[test]
    fn test_install_failure_surfaces() {
        let (center, service, _) = center();
        service.fail_next_install(-108);
        assert!(matches!(
            center.install(),
            Err(HotkeyError::InstallationFailed { status: -108 })
        ));
    }

    #[test]
    fn test_drop_releases_os_but_keeps_store() {
        let (center, service, store) = center();
        let (_, handler) = counter();
        enabled(&center, "toggle", EventType::KeyDown, handler);

        drop(center);
        assert!(service.registered().is_empty());
        assert!(!service.is_handler_installed());
        assert!(store.contains("test.toggle"));
    }

    #[test]
    fn test_reserved_by_system() {
        let (center, service, _) = center();
        let spotlight = Modifiers::from(Modifier::Command);
        service.set_system_shortcuts(vec![
            SystemShortcut {
                key_code: Key::Space.code(),
                modifiers: spotlight,
                enabled: true,
            },
            SystemShortcut {
                key_code: Key::Tab.code(),
                modifiers: Modifier::Control.into(),
                enabled: false,
            },
        ]);

        assert!(center.is_reserved_by_system(Key::Space, spotlight).unwrap());
        assert!(!center
            .is_reserved_by_system(Key::Tab, Modifier::Control.into())
            .unwrap());
        assert!(!center
            .is_reserved_by_system(Key::Space, Modifier::Option.into())
            .unwrap());
    }

    #[test]
    fn test_system_query_failure() {
        let (center, service, _) = center();
        service.fail_next_system_query(-1);
        let err = center
            .is_reserved_by_system(Key::Space, Modifier::Command.into())
            .unwrap_err();
        assert!(matches!(err, HotkeyError::SystemRetrievalFailed { status: -1 }));
    }
}

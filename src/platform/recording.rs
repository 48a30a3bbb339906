//! In-process hotkey service
//!
//! Records every registration and simulates OS callbacks. Clones share state,
//! so a test can keep one handle after moving another into a `HotkeyCenter`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use super::{EventSink, HotKeyHandle, HotKeyId, HotkeyService, OsStatus, SystemShortcut, NO_ERR};
use crate::events::HotKeyEventKind;

/// A hotkey currently registered with a [`RecordingService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedHotKey {
    pub key_code: u16,
    pub modifiers: u32,
    pub id: HotKeyId,
}

#[derive(Default)]
struct State {
    sink: Option<EventSink>,
    hotkeys: BTreeMap<usize, RecordedHotKey>,
    next_handle: usize,
    install_calls: usize,
    register_calls: usize,
    unregister_calls: usize,
    system: Vec<SystemShortcut>,
    fail_install: Option<OsStatus>,
    fail_remove: Option<OsStatus>,
    fail_register: Option<OsStatus>,
    fail_unregister: Option<OsStatus>,
    fail_system: Option<OsStatus>,
}

/// Hotkey service that keeps registrations in memory
#[derive(Clone, Default)]
pub struct RecordingService {
    state: Rc<RefCell<State>>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hotkeys registered right now, in registration order
    pub fn registered(&self) -> Vec<RecordedHotKey> {
        self.state.borrow().hotkeys.values().copied().collect()
    }

    pub fn is_handler_installed(&self) -> bool {
        self.state.borrow().sink.is_some()
    }

    /// Number of successful handler installations
    pub fn install_calls(&self) -> usize {
        self.state.borrow().install_calls
    }

    /// Number of successful registrations
    pub fn register_calls(&self) -> usize {
        self.state.borrow().register_calls
    }

    /// Number of unregistration requests, failed ones included
    pub fn unregister_calls(&self) -> usize {
        self.state.borrow().unregister_calls
    }

    pub fn fail_next_install(&self, status: OsStatus) {
        self.state.borrow_mut().fail_install = Some(status);
    }

    pub fn fail_next_remove(&self, status: OsStatus) {
        self.state.borrow_mut().fail_remove = Some(status);
    }

    pub fn fail_next_register(&self, status: OsStatus) {
        self.state.borrow_mut().fail_register = Some(status);
    }

    pub fn fail_next_unregister(&self, status: OsStatus) {
        self.state.borrow_mut().fail_unregister = Some(status);
    }

    pub fn fail_next_system_query(&self, status: OsStatus) {
        self.state.borrow_mut().fail_system = Some(status);
    }

    pub fn set_system_shortcuts(&self, shortcuts: Vec<SystemShortcut>) {
        self.state.borrow_mut().system = shortcuts;
    }

    /// Simulate the user pressing a registered key combination
    ///
    /// Returns `false` when nothing is registered for it or the handler
    /// declined the event.
    pub fn press(&self, key_code: u16, modifiers: u32) -> bool {
        self.trigger(key_code, modifiers, HotKeyEventKind::Pressed)
    }

    /// Simulate the user releasing a registered key combination
    pub fn release(&self, key_code: u16, modifiers: u32) -> bool {
        self.trigger(key_code, modifiers, HotKeyEventKind::Released)
    }

    /// Deliver a raw event to the installed handler, as the OS would
    pub fn send(&self, id: HotKeyId, kind: HotKeyEventKind) -> bool {
        // Release the borrow before calling out: the sink may re-enter.
        let sink = self.state.borrow().sink.clone();
        match sink {
            Some(sink) => sink(id, kind),
            None => false,
        }
    }

    fn trigger(&self, key_code: u16, modifiers: u32, kind: HotKeyEventKind) -> bool {
        let id = self
            .state
            .borrow()
            .hotkeys
            .values()
            .find(|h| h.key_code == key_code && h.modifiers == modifiers)
            .map(|h| h.id);

        match id {
            Some(id) => self.send(id, kind),
            None => false,
        }
    }
}

impl HotkeyService for RecordingService {
    fn install_handler(&mut self, sink: EventSink) -> OsStatus {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.fail_install.take() {
            return status;
        }
        state.sink = Some(sink);
        state.install_calls += 1;
        NO_ERR
    }

    fn remove_handler(&mut self) -> OsStatus {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.fail_remove.take() {
            return status;
        }
        state.sink = None;
        NO_ERR
    }

    fn register(
        &mut self,
        key_code: u16,
        modifiers: u32,
        id: HotKeyId,
    ) -> Result<HotKeyHandle, OsStatus> {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.fail_register.take() {
            return Err(status);
        }

        state.next_handle += 1;
        let handle = state.next_handle;
        state.hotkeys.insert(
            handle,
            RecordedHotKey {
                key_code,
                modifiers,
                id,
            },
        );
        state.register_calls += 1;
        debug!(key_code, modifiers, %id, handle, "recorded hotkey registration");

        Ok(HotKeyHandle(handle))
    }

    fn unregister(&mut self, handle: HotKeyHandle) -> OsStatus {
        let mut state = self.state.borrow_mut();
        state.unregister_calls += 1;
        if let Some(status) = state.fail_unregister.take() {
            return status;
        }
        state.hotkeys.remove(&handle.0);
        NO_ERR
    }

    fn system_shortcuts(&self) -> Result<Vec<SystemShortcut>, OsStatus> {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.fail_system.take() {
            return Err(status);
        }
        Ok(state.system.clone())
    }
}

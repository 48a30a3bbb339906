//! OS hotkey service boundary
//!
//! The registration core never talks to Carbon directly. It goes through
//! [`HotkeyService`], which the macOS backend implements with
//! `RegisterEventHotKey` and friends, and which [`RecordingService`] implements
//! in-process for tests and non-macOS builds.

#[cfg(target_os = "macos")]
pub mod carbon;
mod recording;

use std::fmt;
use std::rc::Rc;

use crate::events::HotKeyEventKind;
use crate::hotkey::Modifiers;

pub use recording::{RecordedHotKey, RecordingService};

/// OSStatus: signed 32-bit, zero means success
pub type OsStatus = i32;

/// noErr
pub const NO_ERR: OsStatus = 0;

/// eventNotHandledErr: lets the OS pass an event on to other handlers
pub const EVENT_NOT_HANDLED_ERR: OsStatus = -9874;

/// Compound identifier correlating OS callbacks to a registration
///
/// `signature` is generated once per [`crate::HotkeyCenter`]; `id` is a
/// per-registration counter. The default, all-zero id is never issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HotKeyId {
    pub signature: u32,
    pub id: u32,
}

impl fmt::Display for HotKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}:{}", self.signature, self.id)
    }
}

/// Opaque handle returned by a successful OS registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotKeyHandle(pub usize);

/// Callback invoked for every hotkey event the OS delivers
///
/// Returns `true` when the event was handled; `false` lets the OS pass it on.
pub type EventSink = Rc<dyn Fn(HotKeyId, HotKeyEventKind) -> bool>;

/// A shortcut reserved by the system (Spotlight, Mission Control, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemShortcut {
    pub key_code: u16,
    pub modifiers: Modifiers,
    pub enabled: bool,
}

/// Contract of the low-level OS hotkey facility
pub trait HotkeyService {
    /// Install the single process-level event handler for pressed/released events
    fn install_handler(&mut self, sink: EventSink) -> OsStatus;

    /// Remove the installed event handler
    fn remove_handler(&mut self) -> OsStatus;

    /// Register a hotkey; `modifiers` is a Carbon modifier mask
    fn register(
        &mut self,
        key_code: u16,
        modifiers: u32,
        id: HotKeyId,
    ) -> Result<HotKeyHandle, OsStatus>;

    /// Unregister a previously registered hotkey
    fn unregister(&mut self, handle: HotKeyHandle) -> OsStatus;

    /// Shortcuts currently reserved by the system
    fn system_shortcuts(&self) -> Result<Vec<SystemShortcut>, OsStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkey_id_display() {
        let id = HotKeyId {
            signature: 0x6e686b31,
            id: 7,
        };
        assert_eq!(id.to_string(), "6e686b31:7");
    }
}

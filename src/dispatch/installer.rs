//! Installs the single OS event handler and vets incoming hotkey ids

use tracing::{debug, info, warn};

use crate::error::{HotkeyError, Result};
use crate::platform::{EventSink, HotKeyId, HotkeyService, OsStatus, NO_ERR};

/// Owner of the one process-level hotkey event handler
///
/// Every registration shares this handler. Events are routed back by the
/// id half of their [`HotKeyId`]; the signature half must match ours.
pub struct EventDispatcher {
    signature: u32,
    sink: EventSink,
    installed: bool,
}

impl EventDispatcher {
    pub fn new(signature: u32, sink: EventSink) -> Self {
        Self {
            signature,
            sink,
            installed: false,
        }
    }

    pub fn signature(&self) -> u32 {
        self.signature
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Install the handler; a no-op returning success once installed
    pub fn install(&mut self, service: &mut dyn HotkeyService) -> OsStatus {
        if self.installed {
            return NO_ERR;
        }

        let status = service.install_handler(self.sink.clone());
        if status == NO_ERR {
            self.installed = true;
            info!(signature = %format!("{:08x}", self.signature), "hotkey event handler installed");
        } else {
            warn!(status, "failed to install hotkey event handler");
        }
        status
    }

    /// Remove the handler if installed
    pub fn uninstall(&mut self, service: &mut dyn HotkeyService) -> Result<()> {
        if !self.installed {
            return Ok(());
        }

        let status = service.remove_handler();
        if status != NO_ERR {
            return Err(HotkeyError::UninstallationFailed { status });
        }

        self.installed = false;
        debug!("hotkey event handler removed");
        Ok(())
    }

    /// Check that an incoming id was issued by this process
    pub fn accepts(&self, id: HotKeyId) -> bool {
        id.signature == self.signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::HotKeyEventKind;
    use crate::platform::RecordingService;
    use std::rc::Rc;

    fn dispatcher() -> EventDispatcher {
        EventDispatcher::new(0xfeed, Rc::new(|_: HotKeyId, _: HotKeyEventKind| true))
    }

    #[test]
    fn test_install_is_idempotent() {
        let mut service = RecordingService::new();
        let mut dispatcher = dispatcher();

        assert_eq!(dispatcher.install(&mut service), NO_ERR);
        assert_eq!(dispatcher.install(&mut service), NO_ERR);
        assert!(dispatcher.is_installed());
        assert_eq!(service.install_calls(), 1);
    }

    #[test]
    fn test_failed_install_can_retry() {
        let mut service = RecordingService::new();
        service.fail_next_install(-108);
        let mut dispatcher = dispatcher();

        assert_eq!(dispatcher.install(&mut service), -108);
        assert!(!dispatcher.is_installed());
        assert_eq!(dispatcher.install(&mut service), NO_ERR);
        assert!(service.is_handler_installed());
    }

    #[test]
    fn test_uninstall() {
        let mut service = RecordingService::new();
        let mut dispatcher = dispatcher();
        dispatcher.uninstall(&mut service).unwrap();

        dispatcher.install(&mut service);
        dispatcher.uninstall(&mut service).unwrap();
        assert!(!dispatcher.is_installed());
        assert!(!service.is_handler_installed());
    }

    #[test]
    fn test_uninstall_failure_propagates() {
        let mut service = RecordingService::new();
        let mut dispatcher = dispatcher();
        dispatcher.install(&mut service);

        service.fail_next_remove(-9870);
        let err = dispatcher.uninstall(&mut service).unwrap_err();
        assert!(matches!(err, HotkeyError::UninstallationFailed { status: -9870 }));
        assert!(dispatcher.is_installed());
    }

    #[test]
    fn test_accepts_only_own_signature() {
        let dispatcher = dispatcher();
        assert!(dispatcher.accepts(HotKeyId {
            signature: 0xfeed,
            id: 3
        }));
        assert!(!dispatcher.accepts(HotKeyId {
            signature: 0xbeef,
            id: 3
        }));
    }
}

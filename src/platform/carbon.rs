//! Carbon Event Manager backend
//!
//! `RegisterEventHotKey` hotkeys keep firing while secure input is active,
//! unlike a CGEventTap, and need no Accessibility permission.
//!
//! All calls must happen on the thread that pumps the event loop.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::time::Duration;

use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use tracing::{debug, error, warn};

use super::{
    EventSink, HotKeyHandle, HotKeyId, HotkeyService, OsStatus, SystemShortcut,
    EVENT_NOT_HANDLED_ERR, NO_ERR,
};
use crate::events::HotKeyEventKind;
use crate::hotkey::Modifiers;

// ============================================================================
// Carbon Event Manager FFI
// ============================================================================

#[link(name = "Carbon", kind = "framework")]
extern "C" {}

#[repr(C)]
#[derive(Clone, Copy)]
struct EventHotKeyID {
    signature: u32,
    id: u32,
}

#[repr(C)]
struct EventTypeSpec {
    event_class: u32,
    event_kind: u32,
}

type EventHandlerRef = *mut c_void;
type EventHandlerCallRef = *mut c_void;
type EventRef = *mut c_void;
type EventTargetRef = *mut c_void;
type EventHotKeyRef = *mut c_void;
type EventHandlerProc = unsafe extern "C" fn(EventHandlerCallRef, EventRef, *mut c_void) -> OsStatus;

#[allow(non_snake_case)]
extern "C" {
    fn GetApplicationEventTarget() -> EventTargetRef;
    fn GetEventDispatcherTarget() -> EventTargetRef;

    fn InstallEventHandler(
        target: EventTargetRef,
        handler: EventHandlerProc,
        num_types: u32,
        type_list: *const EventTypeSpec,
        user_data: *mut c_void,
        out_ref: *mut EventHandlerRef,
    ) -> OsStatus;

    fn RemoveEventHandler(handler: EventHandlerRef) -> OsStatus;

    fn RegisterEventHotKey(
        key_code: u32,
        modifiers: u32,
        hotkey_id: EventHotKeyID,
        target: EventTargetRef,
        options: u32,
        out_ref: *mut EventHotKeyRef,
    ) -> OsStatus;

    fn UnregisterEventHotKey(hotkey: EventHotKeyRef) -> OsStatus;

    fn GetEventKind(event: EventRef) -> u32;

    fn GetEventParameter(
        event: EventRef,
        name: u32,
        desired_type: u32,
        actual_type: *mut u32,
        buffer_size: u32,
        actual_size: *mut u32,
        data: *mut c_void,
    ) -> OsStatus;

    fn ReceiveNextEvent(
        num_types: u32,
        type_list: *const EventTypeSpec,
        timeout: f64,
        pull_event: u8,
        out_event: *mut EventRef,
    ) -> OsStatus;

    fn SendEventToEventTarget(event: EventRef, target: EventTargetRef) -> OsStatus;

    fn ReleaseEvent(event: EventRef);

    fn CopySymbolicHotKeys(out_array: *mut CFArrayRef) -> OsStatus;
}

const K_EVENT_CLASS_KEYBOARD: u32 = u32::from_be_bytes(*b"keyb");
const K_EVENT_HOT_KEY_PRESSED: u32 = 5;
const K_EVENT_HOT_KEY_RELEASED: u32 = 6;
const K_EVENT_PARAM_DIRECT_OBJECT: u32 = u32::from_be_bytes(*b"----");
const TYPE_EVENT_HOT_KEY_ID: u32 = u32::from_be_bytes(*b"hkid");

const EVENT_LOOP_TIMED_OUT_ERR: OsStatus = -9875;

const SYMBOLIC_CODE: &str = "kHISymbolicHotKeyCode";
const SYMBOLIC_MODIFIERS: &str = "kHISymbolicHotKeyModifiers";
const SYMBOLIC_ENABLED: &str = "kHISymbolicHotKeyEnabled";

// ============================================================================
// Event Handler Callback
// ============================================================================

extern "C" fn hotkey_event_handler(
    _call_ref: EventHandlerCallRef,
    event: EventRef,
    user_data: *mut c_void,
) -> OsStatus {
    // Panics must not unwind across the FFI boundary
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut raw = EventHotKeyID {
            signature: 0,
            id: 0,
        };

        let status = unsafe {
            GetEventParameter(
                event,
                K_EVENT_PARAM_DIRECT_OBJECT,
                TYPE_EVENT_HOT_KEY_ID,
                ptr::null_mut(),
                std::mem::size_of::<EventHotKeyID>() as u32,
                ptr::null_mut(),
                &mut raw as *mut _ as *mut c_void,
            )
        };
        if status != NO_ERR {
            warn!(status, "failed to read hotkey id from event");
            return status;
        }

        let kind = match unsafe { GetEventKind(event) } {
            K_EVENT_HOT_KEY_PRESSED => HotKeyEventKind::Pressed,
            K_EVENT_HOT_KEY_RELEASED => HotKeyEventKind::Released,
            _ => return EVENT_NOT_HANDLED_ERR,
        };

        if user_data.is_null() {
            return EVENT_NOT_HANDLED_ERR;
        }
        // SAFETY: user_data points at the boxed sink owned by CarbonHotkeyService,
        // which outlives the installed handler.
        let sink = unsafe { &*(user_data as *const EventSink) };

        let id = HotKeyId {
            signature: raw.signature,
            id: raw.id,
        };
        if sink(id, kind) {
            NO_ERR
        } else {
            EVENT_NOT_HANDLED_ERR
        }
    }));

    match result {
        Ok(status) => status,
        Err(_) => {
            error!("panic in hotkey event handler");
            EVENT_NOT_HANDLED_ERR
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// [`HotkeyService`] backed by the Carbon Event Manager
pub struct CarbonHotkeyService {
    handler: Option<EventHandlerRef>,
    sink: Option<Box<EventSink>>,
}

impl CarbonHotkeyService {
    pub fn new() -> Self {
        Self {
            handler: None,
            sink: None,
        }
    }
}

impl Default for CarbonHotkeyService {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyService for CarbonHotkeyService {
    fn install_handler(&mut self, sink: EventSink) -> OsStatus {
        let event_types = [
            EventTypeSpec {
                event_class: K_EVENT_CLASS_KEYBOARD,
                event_kind: K_EVENT_HOT_KEY_PRESSED,
            },
            EventTypeSpec {
                event_class: K_EVENT_CLASS_KEYBOARD,
                event_kind: K_EVENT_HOT_KEY_RELEASED,
            },
        ];

        let sink = Box::new(sink);
        let user_data = &*sink as *const EventSink as *mut c_void;
        let mut handler_ref: EventHandlerRef = ptr::null_mut();

        let status = unsafe {
            InstallEventHandler(
                GetApplicationEventTarget(),
                hotkey_event_handler,
                event_types.len() as u32,
                event_types.as_ptr(),
                user_data,
                &mut handler_ref,
            )
        };

        if status == NO_ERR {
            self.handler = Some(handler_ref);
            self.sink = Some(sink);
            debug!("carbon event handler installed");
        }
        status
    }

    fn remove_handler(&mut self) -> OsStatus {
        let Some(handler) = self.handler else {
            return NO_ERR;
        };

        let status = unsafe { RemoveEventHandler(handler) };
        if status == NO_ERR {
            self.handler = None;
            self.sink = None;
            debug!("carbon event handler removed");
        }
        status
    }

    fn register(
        &mut self,
        key_code: u16,
        modifiers: u32,
        id: HotKeyId,
    ) -> Result<HotKeyHandle, OsStatus> {
        let mut hotkey_ref: EventHotKeyRef = ptr::null_mut();
        let status = unsafe {
            RegisterEventHotKey(
                u32::from(key_code),
                modifiers,
                EventHotKeyID {
                    signature: id.signature,
                    id: id.id,
                },
                GetApplicationEventTarget(),
                0,
                &mut hotkey_ref,
            )
        };

        if status == NO_ERR {
            Ok(HotKeyHandle(hotkey_ref as usize))
        } else {
            Err(status)
        }
    }

    fn unregister(&mut self, handle: HotKeyHandle) -> OsStatus {
        unsafe { UnregisterEventHotKey(handle.0 as EventHotKeyRef) }
    }

    fn system_shortcuts(&self) -> Result<Vec<SystemShortcut>, OsStatus> {
        let mut array_ref: CFArrayRef = ptr::null();
        let status = unsafe { CopySymbolicHotKeys(&mut array_ref) };
        if status != NO_ERR {
            return Err(status);
        }
        if array_ref.is_null() {
            return Ok(Vec::new());
        }

        // Copy rule: we own the returned array
        let array: CFArray<CFDictionary<CFString, CFType>> =
            unsafe { CFArray::wrap_under_create_rule(array_ref) };

        let code_key = CFString::from_static_string(SYMBOLIC_CODE);
        let modifiers_key = CFString::from_static_string(SYMBOLIC_MODIFIERS);
        let enabled_key = CFString::from_static_string(SYMBOLIC_ENABLED);

        let shortcuts = array
            .iter()
            .filter_map(|entry| {
                let number = |key: &CFString| {
                    entry
                        .find(key)
                        .and_then(|value| value.downcast::<CFNumber>())
                        .and_then(|n| n.to_i64())
                };

                let key_code = u16::try_from(number(&code_key)?).ok()?;
                let mask = number(&modifiers_key).unwrap_or(0);
                let enabled = entry
                    .find(&enabled_key)
                    .and_then(|value| value.downcast::<CFBoolean>())
                    .map(bool::from)
                    .unwrap_or(false);

                Some(SystemShortcut {
                    key_code,
                    modifiers: Modifiers::from_carbon_flags(mask as u32),
                    enabled,
                })
            })
            .collect();

        Ok(shortcuts)
    }
}

impl Drop for CarbonHotkeyService {
    fn drop(&mut self) {
        let status = self.remove_handler();
        if status != NO_ERR {
            warn!(status, "failed to remove carbon event handler on drop");
        }
    }
}

/// Pull at most one event from the queue and dispatch it
///
/// Processes without an AppKit run loop call this repeatedly so hotkey
/// events reach the installed handler. Returns `false` on timeout.
pub fn pump_events(timeout: Duration) -> bool {
    let mut event: EventRef = ptr::null_mut();
    let status = unsafe { ReceiveNextEvent(0, ptr::null(), timeout.as_secs_f64(), 1, &mut event) };

    match status {
        NO_ERR => {
            unsafe {
                SendEventToEventTarget(event, GetEventDispatcherTarget());
                ReleaseEvent(event);
            }
            true
        }
        EVENT_LOOP_TIMED_OUT_ERR => false,
        status => {
            debug!(status, "ReceiveNextEvent returned an error");
            false
        }
    }
}

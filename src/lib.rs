//! named-hotkeys: named global keyboard shortcuts for macOS
//!
//! A shortcut is identified by a [`Name`]. Any number of [`Command`] values can
//! refer to the same name; they all share one [`registration::Registration`],
//! which owns the key, the modifiers, the observers and the single OS-level
//! hotkey registration.
//!
//! ```no_run
//! use named_hotkeys::{Command, EventType, HotkeyCenter, Key, Modifier, Modifiers};
//! use named_hotkeys::platform::RecordingService;
//! use named_hotkeys::store::MemoryStore;
//!
//! let center = HotkeyCenter::new(RecordingService::new(), MemoryStore::new(), "app.");
//! let toggle = Command::with_shortcut(
//!     &center,
//!     "toggle",
//!     Key::Space,
//!     Modifiers::from([Modifier::Shift, Modifier::Option]),
//! );
//! toggle.observe(EventType::KeyDown, || println!("toggled"));
//! assert!(toggle.is_enabled());
//! ```

pub mod center;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod hotkey;
pub mod platform;
pub mod registration;
pub mod store;

pub use center::HotkeyCenter;
pub use command::Command;
pub use error::{HotkeyError, Result};
pub use events::{EventType, HotKeyEventKind};
pub use hotkey::{Key, Modifier, Modifiers, Name};
pub use registration::{ListenerId, ObservationId};

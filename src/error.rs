//! Error taxonomy for hotkey registration, dispatch and persistence

use std::path::PathBuf;

use crate::platform::OsStatus;

/// Errors produced by the hotkey subsystem
///
/// Most of these never reach callers: failures inside `register`/`unregister`
/// are logged and recovered locally. They still flow through this type so the
/// log lines carry a consistent message.
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("failed to install hotkey event handler (status {status})")]
    InstallationFailed { status: OsStatus },

    #[error("failed to register hotkey '{name}' (status {status})")]
    RegistrationFailed { name: String, status: OsStatus },

    #[error("failed to unregister hotkey '{name}' (status {status})")]
    UnregistrationFailed { name: String, status: OsStatus },

    #[error("failed to encode shortcut for '{key}'")]
    EncodingFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode shortcut stored under '{key}'")]
    DecodingFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read system hotkeys (status {status})")]
    SystemRetrievalFailed { status: OsStatus },

    #[error("failed to remove hotkey event handler (status {status})")]
    UninstallationFailed { status: OsStatus },

    #[error("preference store I/O error at {}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid shortcut: {0}")]
    InvalidShortcut(String),
}

pub type Result<T> = std::result::Result<T, HotkeyError>;

//! Configuration loading and management

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{ensure, Context, Result};
use named_hotkeys::{HotkeyError, Key, Modifier, Modifiers};

const DEFAULT_PREFIX: &str = "named-hotkeys.";
const DEFAULT_DOUBLE_TAP: f64 = 0.3;
const DEFAULT_BINDINGS: &str = "toggle=control+option+space";

/// A configured shortcut: `name=mod+mod+key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub key: Key,
    pub modifiers: Modifiers,
}

impl FromStr for Binding {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| HotkeyError::InvalidShortcut(format!("'{s}': {reason}"));

        let (name, combo) = s.split_once('=').ok_or_else(|| invalid("expected name=shortcut"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("empty name"));
        }

        let mut parts: Vec<&str> = combo.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|k| !k.is_empty()).ok_or_else(|| invalid("missing key"))?;
        let key = Key::from_str(key)?;
        let modifiers = parts
            .into_iter()
            .map(Modifier::from_str)
            .collect::<Result<Modifiers, _>>()?;

        Ok(Self {
            name: name.to_string(),
            key,
            modifiers,
        })
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// JSON file holding persisted shortcuts
    pub store_path: PathBuf,

    /// Prefix for every shortcut name
    pub prefix: String,

    /// Maximum interval between key-ups reported as a double tap, in seconds
    pub double_tap: f64,

    pub bindings: Vec<Binding>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        Self::from_vars(Path::new(&home), |var| std::env::var(var).ok())
    }

    fn from_vars(home: &Path, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = home.join(".local").join("share").join("named-hotkeys");
        let store_path = data_dir.join("shortcuts.json");

        let prefix = var("NAMED_HOTKEYS_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let double_tap = match var("NAMED_HOTKEYS_DOUBLE_TAP") {
            Some(value) => {
                let secs = value
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("invalid NAMED_HOTKEYS_DOUBLE_TAP '{value}'"))?;
                ensure!(
                    secs.is_finite() && secs >= 0.0,
                    "NAMED_HOTKEYS_DOUBLE_TAP must be a non-negative number of seconds, got '{value}'"
                );
                secs
            }
            None => DEFAULT_DOUBLE_TAP,
        };

        let bindings = var("NAMED_HOTKEYS_BINDINGS").unwrap_or_else(|| DEFAULT_BINDINGS.to_string());
        let bindings = parse_bindings(&bindings).context("invalid NAMED_HOTKEYS_BINDINGS")?;

        Ok(Self {
            data_dir,
            store_path,
            prefix,
            double_tap,
            bindings,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn parse_bindings(s: &str) -> Result<Vec<Binding>, HotkeyError> {
    s.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(Binding::from_str)
        .collect()
}

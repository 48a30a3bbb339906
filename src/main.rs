//! named-hotkeys-daemon: binds configured global shortcuts and logs their events
//!
//! Shortcuts come from the configuration; a value persisted by an earlier run
//! takes precedence over the configured default. The daemon pumps the Carbon
//! event loop on the main thread until SIGINT or SIGTERM.

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
mod config;
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
mod lifecycle;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "named-hotkeys-daemon starting"
    );

    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        store = %config.store_path.display(),
        bindings = config.bindings.len(),
        "configuration loaded"
    );

    run(config)?;

    info!("named-hotkeys-daemon stopped");
    Ok(())
}

#[cfg(target_os = "macos")]
fn run(config: Config) -> Result<()> {
    use std::time::Duration;

    use named_hotkeys::platform::carbon::{pump_events, CarbonHotkeyService};
    use named_hotkeys::store::JsonFileStore;
    use named_hotkeys::HotkeyCenter;

    use crate::lifecycle::ShutdownSignal;

    let store = JsonFileStore::open(&config.store_path)?;
    let center = HotkeyCenter::new(CarbonHotkeyService::new(), store, config.prefix.clone());

    let shutdown = ShutdownSignal::new();
    shutdown.listen()?;

    let commands: Vec<_> = config
        .bindings
        .iter()
        .map(|binding| bind(&center, binding, config.double_tap))
        .collect();

    info!(commands = commands.len(), "daemon initialized, entering main loop");

    while !shutdown.is_triggered() {
        pump_events(Duration::from_millis(100));
    }

    info!("shutting down...");
    // Dropping the last handle releases OS registrations but keeps the store
    drop(commands);
    drop(center);
    Ok(())
}

#[cfg(target_os = "macos")]
fn bind(
    center: &named_hotkeys::HotkeyCenter,
    binding: &config::Binding,
    double_tap: f64,
) -> named_hotkeys::Command {
    use named_hotkeys::{Command, EventType};
    use tracing::{debug, warn};

    let command = Command::new(center, binding.name.clone());
    if command.key().is_none() {
        command.set_shortcut(Some(binding.key), binding.modifiers);
    }

    if let Some(key) = command.key() {
        match center.is_reserved_by_system(key, command.modifiers()) {
            Ok(true) => warn!(
                name = %command.name(),
                shortcut = %command.shortcut_string(),
                "shortcut is also used by the system"
            ),
            Ok(false) => {}
            Err(e) => debug!(error = %e, "could not query system shortcuts"),
        }
    }

    let name = command.name().clone();
    command.observe(EventType::KeyDown, move || {
        info!(name = %name, "key down");
    });
    let name = command.name().clone();
    command.observe(EventType::double_tap(double_tap), move || {
        info!(name = %name, "double tap");
    });

    if !command.is_enabled() {
        warn!(name = %command.name(), "shortcut is not active");
    }
    command
}

#[cfg(not(target_os = "macos"))]
fn run(_config: Config) -> Result<()> {
    anyhow::bail!("named-hotkeys-daemon only runs on macOS")
}

//! Signal handling for graceful shutdown
//!
//! The Carbon event loop has to be pumped on the main thread, so signals are
//! awaited on a helper thread running its own tokio runtime. The main loop
//! polls [`ShutdownSignal::is_triggered`] between pumps.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info};

/// Handles shutdown signals (SIGTERM, SIGINT)
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    /// Start listening for signals on a dedicated thread
    pub fn listen(&self) -> io::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()?;
        let this = self.clone();

        thread::Builder::new()
            .name("shutdown-signal".to_string())
            .spawn(move || {
                match runtime.block_on(wait()) {
                    Ok(()) => info!("shutdown signal received"),
                    Err(e) => debug!(?e, "signal listener failed, stopping"),
                }
                this.trigger();
            })?;

        Ok(())
    }
}

/// Wait for a shutdown signal
async fn wait() -> io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            debug!("received SIGTERM");
        }
        _ = sigint.recv() => {
            debug!("received SIGINT");
        }
    }
    Ok(())
}

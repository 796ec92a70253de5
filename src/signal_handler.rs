use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Ctrl-C turned into a shared flag that blocking workers can poll.
#[derive(Clone, Default)]
pub struct SignalHandler {
    shutdown_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        info!("Shutdown requested");
    }

    /// The flag itself, for handing to a worker thread.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_requested)
    }

    /// Set the flag on the first Ctrl-C.
    pub fn start_signal_monitoring(&self) -> JoinHandle<()> {
        let handler = self.clone();
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Received Ctrl-C, stopping");
                    handler.request_shutdown();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        })
    }
}

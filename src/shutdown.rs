use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::info;

/// Cleared once SIGINT or SIGTERM arrives. Clones share the flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    running: Arc<AtomicBool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    /// A token with no signal handler attached.
    pub fn new() -> Self {
        Shutdown {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A token cleared by SIGINT or SIGTERM. Only one handler can be
    /// installed per process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let shutdown = Self::new();
        let handle = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Stopping...");
            handle.trigger();
        })?;
        Ok(shutdown)
    }

    pub fn trigger(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` in short steps. Returns `false` if shutdown was
    /// requested in the meantime.
    pub fn sleep(&self, duration: Duration) -> bool {
        const STEP: Duration = Duration::from_millis(50);
        let deadline = Instant::now() + duration;

        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            sleep(STEP.min(deadline - now));
        }
        false
    }
}

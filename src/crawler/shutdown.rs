//! Run-scoped shutdown control
//!
//! One controller exists per run. It owns the process-wide cancellation
//! flag: once triggered, the frontier stops admitting, no new fetch starts,
//! in-flight fetches drain, and the run as a whole rejects. The transition
//! is one-way; there is no recovery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shared cancellation flag with its trigger rules
#[derive(Debug, Default)]
pub struct ShutdownController {
    shutting_down: AtomicBool,
}

impl ShutdownController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Requests shutdown; idempotent
    pub fn trigger(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Applies the page-error suppression policy: fatal page errors and
    /// panicked fetches trigger shutdown unless the run is configured to
    /// ignore page errors
    pub fn trigger_unless_ignored(&self, ignore_page_errors: bool) {
        if !ignore_page_errors {
            self.trigger();
        }
    }

    /// Installs the operator-interrupt listener for the duration of one run
    ///
    /// The first interrupt requests graceful shutdown: no new work, in-flight
    /// fetches finish, the run rejects. A second interrupt terminates the
    /// process immediately. Dropping the returned guard deregisters the
    /// listener, so repeated runs in one process never stack handlers.
    pub fn install_signal_handler(self: &Arc<Self>) -> SignalGuard {
        let controller = Arc::clone(self);
        let listener = tokio::spawn(async move {
            loop {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                if controller.is_shutting_down() {
                    std::process::exit(1);
                }
                controller.trigger();
                tracing::warn!(
                    "Gracefully shutting down. To exit immediately, press ^C again"
                );
            }
        });
        SignalGuard { listener }
    }
}

/// Deregisters the interrupt listener when dropped
pub struct SignalGuard {
    listener: JoinHandle<()>,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

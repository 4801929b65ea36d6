//! Process-wide shutdown state.
//!
//! Ctrl+C is handled once, globally. What it does depends on what is running:
//! - nothing registered (one-shot tasks): exit immediately with 130
//! - watch session registered: notify the coordinator and unblock the
//!   static server so `watch` returns and the process exits with code 0

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the watch actors
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Exit status of a one-shot task cut short by Ctrl+C (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Setup the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(code) = interrupt(SHUTDOWN_TX.get()) {
            std::process::exit(code);
        }
        if let Some(server) = SERVER.get() {
            server.unblock();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Signal the watch session, or return the exit code when there is none.
fn interrupt(session: Option<&crossbeam::channel::Sender<()>>) -> Option<i32> {
    let Some(tx) = session else {
        return Some(INTERRUPTED_EXIT_CODE);
    };
    crate::log!("watch"; "shutting down...");
    let _ = tx.send(());
    None
}

/// Register the watch session's shutdown channel.
pub fn register_shutdown(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Register the static server so Ctrl+C can unblock its request loop.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Check if shutdown has been requested
///
/// Relaxed ordering: worst case a loop runs one more iteration.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag_default() {
        // Only the Ctrl+C handler sets the flag.
        assert!(!is_shutdown());
    }

    #[test]
    fn test_interrupt_without_session_exits_130() {
        assert_eq!(interrupt(None), Some(130));
    }

    #[test]
    fn test_interrupt_winds_down_session() {
        let (tx, rx) = crossbeam::channel::bounded(1);
        assert_eq!(interrupt(Some(&tx)), None);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_register_shutdown_once() {
        let (tx, rx) = crossbeam::channel::bounded(1);
        register_shutdown(tx);
        SHUTDOWN_TX.get().unwrap().send(()).unwrap();
        assert!(rx.try_recv().is_ok());
    }
}

//! FileSystem Actor
//!
//! Watches the inputs of every task and sends debounced rebuild requests to
//! the ControlActor. The watcher is attached before the actor runs, so
//! changes made while the caller finishes start-up are buffered, not lost.
//!
//! Architecture:
//! ```text
//! Watcher → Debouncer (pure timing) → settle (disk state) → Router (scope) → ControlMsg
//! ```

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::ControlMsg;
use crate::{debug, log};

// Existence correction of raw changes.
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// Event routing (actionable events -> ControlMsg).
mod router;
// Task inputs resolved for matching.
mod scope;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;


pub use scope::WatchScope;

use debouncer::Debouncer;
use router::{events_to_messages, log_events};
use watch_roots::WatchRoots;

/// Watches task inputs and turns settled changes into `ControlMsg`s.
pub struct FsActor {
    /// Raw notify results; the watcher callback runs on notify's thread.
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Dropping the watcher stops all watches.
    watcher: RecommendedWatcher,
    roots: WatchRoots,
    control_tx: mpsc::Sender<ControlMsg>,
    scope: WatchScope,
}

impl FsActor {
    pub fn new(scope: WatchScope, control_tx: mpsc::Sender<ControlMsg>) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut roots = WatchRoots::new(scope.watch_roots());
        roots.attach_existing(&mut watcher)?;

        Ok(Self { notify_rx, watcher, roots, control_tx, scope })
    }

    pub async fn run(self) {
        let Self { notify_rx, mut watcher, mut roots, control_tx, scope } = self;
        let mut events = bridge(notify_rx);
        let mut debouncer = Debouncer::new();

        loop {
            tokio::select! {
                biased;
                Some(event) = events.recv() => debouncer.add_event(&event),
                () = tokio::time::sleep(debouncer.sleep_duration()) => {
                    roots.maintain(&mut watcher);
                    let Some(batch) = debouncer.take_if_ready().and_then(classifier::settle) else {
                        continue;
                    };
                    log_events(&batch);
                    if !forward(&control_tx, events_to_messages(&batch, &scope)).await {
                        break;
                    }
                }
            }
        }
        debug!("watch"; "fs actor stopped");
    }
}

/// Move notify results from its std channel onto a tokio one.
fn bridge(
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
) -> mpsc::Receiver<notify::Event> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        for result in notify_rx {
            match result {
                Ok(event) => {
                    if tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => log!("watch"; "notify error: {}", e),
            }
        }
    });
    rx
}

/// False once the ControlActor is gone.
async fn forward(control_tx: &mpsc::Sender<ControlMsg>, msgs: Vec<ControlMsg>) -> bool {
    for msg in msgs {
        if control_tx.send(msg).await.is_err() {
            return false;
        }
    }
    true
}

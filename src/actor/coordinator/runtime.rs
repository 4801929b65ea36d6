use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::controller::{ControlActor, SessionEnd};
use crate::actor::fs::FsActor;
use crate::actor::messages::WsMsg;
use crate::actor::ws::WsActor;

/// Run all actors until Ctrl+C or until the ControlActor ends the session.
pub(super) async fn run_actors(
    fs: FsActor,
    control: ControlActor,
    ws: WsActor,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Receiver<()>,
) -> SessionEnd {
    let fs_handle = tokio::spawn(fs.run());
    let mut control_handle = tokio::spawn(control.run());
    let ws_handle = tokio::spawn(ws.run());

    let end = loop {
        if shutdown_rx.try_recv().is_ok() {
            crate::debug!("actor"; "shutdown signal received");
            break SessionEnd::Shutdown;
        }
        tokio::select! {
            joined = &mut control_handle => {
                break joined.unwrap_or(SessionEnd::Shutdown);
            }
            () = tokio::time::sleep(Duration::from_millis(100)) => {}
        }
    };

    // The watcher loop only ends once a send fails; stop it directly
    fs_handle.abort();
    control_handle.abort();

    crate::debug!("actor"; "sending shutdown to ws");
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    let _ = tokio::time::timeout(Duration::from_millis(500), ws_handle).await;

    end
}

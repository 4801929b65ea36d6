//! Actor Coordinator - wires up the watch session
//!
//! The Coordinator is a thin orchestrator that:
//! - Starts the WebSocket server and attaches the live channel
//! - Starts the static server unless the profile proxies an app server
//! - Wires up the actors and runs them until Ctrl+C or a config change

mod runtime;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use super::controller::{ControlActor, SessionEnd};
use super::fs::{FsActor, WatchScope};
use super::messages::{ControlMsg, WsMsg};
use super::ws::WsActor;
use crate::cli::serve;
use crate::core::register_shutdown;
use crate::reload::server::{SCRIPT_PATH, start_ws_server};
use crate::reload::LiveChannel;
use crate::task::{BuildContext, TaskGraph};
use crate::{debug, log};

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    ctx: Arc<BuildContext>,
    graph: Arc<TaskGraph>,
}

impl Coordinator {
    pub fn new(ctx: Arc<BuildContext>, graph: Arc<TaskGraph>) -> Self {
        Self { ctx, graph }
    }

    /// Run the watch session until it ends.
    pub async fn run(self) -> Result<SessionEnd> {
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);
        let (control_tx, control_rx) = mpsc::channel::<ControlMsg>(CHANNEL_BUFFER);

        let ws_port = start_ws_server(self.ctx.serve.ws_port, ws_tx.clone())
            .context("failed to start the live-reload server")?;
        self.ctx.attach_live(LiveChannel::new(ws_tx.clone(), ws_port));

        let server = match &self.ctx.profile.config.proxy {
            None => {
                let bound = serve::bind(self.ctx.destination.clone(), &self.ctx.serve, ws_port)?;
                log!("serve"; "serving {} at http://{}", self.ctx.destination.display(), bound.addr());
                Some(bound.spawn())
            }
            Some(proxy) => {
                log!("serve"; "proxying {}, add to its pages:", proxy);
                log!("serve"; "<script src=\"http://localhost:{}{}\"></script>", ws_port, SCRIPT_PATH);
                None
            }
        };

        // Attach before the session is announced so no early change is lost
        let fs_actor = FsActor::new(WatchScope::from_context(&self.ctx), control_tx)
            .context("failed to start the file watcher")?;
        let control_actor = ControlActor::new(control_rx, Arc::clone(&self.graph), Arc::clone(&self.ctx));
        let ws_actor = WsActor::new(ws_rx);

        let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
        register_shutdown(shutdown_tx);

        self.ctx.set_watching();
        log!("watch"; "watching for changes, press Ctrl+C to stop");

        debug!("actor"; "start");
        let end = runtime::run_actors(fs_actor, control_actor, ws_actor, ws_tx, shutdown_rx).await;

        if let Some(server) = server {
            let _ = tokio::task::spawn_blocking(move || server.stop()).await;
        }
        debug!("actor"; "stopped ({:?})", end);
        Ok(end)
    }
}

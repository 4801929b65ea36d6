//! Control Actor
//!
//! Turns rebuild requests into task runs. Each request spawns its own run:
//! a second change arriving mid-build starts another build rather than
//! waiting for the first.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::{ControlMsg, WatchTarget};
use crate::logger::status_error;
use crate::reload::ReloadMessage;
use crate::task::{BuildContext, TaskGraph};
use crate::{debug, log};

/// Why the watch session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Shutdown,
    ConfigChanged,
}

pub struct ControlActor {
    rx: mpsc::Receiver<ControlMsg>,
    graph: Arc<TaskGraph>,
    ctx: Arc<BuildContext>,
}

impl ControlActor {
    pub fn new(rx: mpsc::Receiver<ControlMsg>, graph: Arc<TaskGraph>, ctx: Arc<BuildContext>) -> Self {
        Self { rx, graph, ctx }
    }

    pub async fn run(mut self) -> SessionEnd {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ControlMsg::Rebuild(target) => {
                    debug!("watch"; "rebuild {}", target.task());
                    tokio::spawn(rebuild(Arc::clone(&self.graph), Arc::clone(&self.ctx), target));
                }
                ControlMsg::ConfigChanged(path) => {
                    log!("watch"; "{} changed, restart stitch to apply it", path.display());
                    return SessionEnd::ConfigChanged;
                }
                ControlMsg::Shutdown => break,
            }
        }
        SessionEnd::Shutdown
    }
}

/// Run a target's task, then reload browsers if the target calls for it.
async fn rebuild(graph: Arc<TaskGraph>, ctx: Arc<BuildContext>, target: WatchTarget) {
    match graph.run(target.task()).await {
        Ok(()) => {
            if target.reloads(ctx.options.inject_styles) {
                ctx.send_live(ReloadMessage::reload());
            }
        }
        Err(e) => {
            let summary = e.to_string();
            let detail = format!("{:#}", anyhow::Error::from(e));
            status_error(&format!("{} failed", target.task()), &detail);
            ctx.send_live(ReloadMessage::notify(summary, ctx.pipeline.notify_timeout));
        }
    }
}

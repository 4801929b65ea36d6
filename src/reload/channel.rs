//! Sending side of the live-reload channel.

use tokio::sync::mpsc;

use super::ReloadMessage;
use crate::actor::messages::WsMsg;
use crate::debug;

/// Handle tasks use to reach connected browsers.
///
/// Sends never block a build: when the actor is backlogged the message is
/// dropped with a debug line.
#[derive(Debug, Clone)]
pub struct LiveChannel {
    tx: mpsc::Sender<WsMsg>,
    port: u16,
}

impl LiveChannel {
    pub const fn new(tx: mpsc::Sender<WsMsg>, port: u16) -> Self {
        Self { tx, port }
    }

    /// Port the WebSocket server actually bound.
    pub const fn port(&self) -> u16 {
        self.port
    }

    pub fn send(&self, msg: ReloadMessage) {
        let label = msg.label();
        if let Err(e) = self.tx.try_send(WsMsg::Send(msg)) {
            debug!("ws"; "dropped {} message: {}", label, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_reaches_actor() {
        let (tx, mut rx) = mpsc::channel(4);
        let live = LiveChannel::new(tx, 35729);
        live.send(ReloadMessage::reload());

        let Some(WsMsg::Send(msg)) = rx.recv().await else {
            panic!("expected a send");
        };
        assert_eq!(msg, ReloadMessage::Reload);
        assert_eq!(live.port(), 35729);
    }

    #[test]
    fn test_send_without_receiver_does_not_panic() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        LiveChannel::new(tx, 1).send(ReloadMessage::reload());
    }
}

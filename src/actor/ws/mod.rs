//! WebSocket Actor
//!
//! Owns the live-reload clients and broadcasts `ReloadMessage`s to them.
//!
//! ```text
//! tasks --LiveChannel--> WsActor --broadcast--> browsers
//! ws server --AddClient--^
//! ```

mod delivery;

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::WsMsg;
use crate::reload::ReloadMessage;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    clients: Clients,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        // Reads drain pings and notice closed tabs
        let clients_for_reader = Arc::clone(&self.clients);
        std::thread::spawn(move || client_reader_loop(&clients_for_reader));

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Send(msg) => {
                    crate::debug!("ws"; "sending {}", msg.label());
                    self.broadcast(Message::Text(msg.to_json().into()));
                }
                WsMsg::AddClient(stream) => self.add_client(stream),
                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    break;
                }
            }
        }

        for mut client in self.clients.lock().drain(..) {
            let _ = client.close(None);
            let _ = client.flush();
        }
    }

    /// Complete the handshake, greet the client and register it.
    fn add_client(&self, stream: TcpStream) {
        // Blocking during the handshake, non-blocking for polling reads after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let _ = ws.get_ref().set_nonblocking(true);

                let hello = ReloadMessage::connected();
                if let Err(e) = ws.send(Message::Text(hello.to_json().into())) {
                    crate::log!("ws"; "failed to send connected message: {}", e);
                    return;
                }

                let mut clients = self.clients.lock();
                clients.push(ws);
                crate::debug!("ws"; "client connected (total: {})", clients.len());
            }
            Err(e) => crate::log!("ws"; "handshake failed: {}", e),
        }
    }
}

/// Flush pending writes and poll for close frames until the actor drops
/// its handle.
fn client_reader_loop(clients: &Clients) {
    while Arc::strong_count(clients) > 1 {
        std::thread::sleep(Duration::from_millis(100));

        clients.lock().retain_mut(|ws| {
            let _ = ws.flush();
            match ws.read() {
                Ok(Message::Close(_)) => {
                    crate::debug!("ws"; "client closed");
                    false
                }
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => true,
                Err(_) => false,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    /// Connect a client through a real socket pair and hand the server side to the actor.
    fn connect(tx: &mpsc::Sender<WsMsg>) -> WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>> {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let tx = tx.clone();
        let accept = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            tx.blocking_send(WsMsg::AddClient(stream)).unwrap();
        });
        let (ws, _) = tungstenite::connect(format!("ws://{addr}")).unwrap();
        accept.join().unwrap();
        ws
    }

    fn read_text(ws: &mut WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>>) -> String {
        loop {
            if let Message::Text(text) = ws.read().unwrap() {
                return text.to_string();
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_connected_then_broadcast() {
        let (tx, rx) = mpsc::channel(8);
        let actor = tokio::spawn(WsActor::new(rx).run());

        let client_tx = tx.clone();
        let mut ws = tokio::task::spawn_blocking(move || connect(&client_tx)).await.unwrap();

        let (hello, ws_back) = tokio::task::spawn_blocking(move || {
            let text = read_text(&mut ws);
            (text, ws)
        })
        .await
        .unwrap();
        ws = ws_back;
        assert!(hello.contains(r#""type":"connected""#));

        tx.send(WsMsg::Send(ReloadMessage::reload())).await.unwrap();
        let reload = tokio::task::spawn_blocking(move || read_text(&mut ws)).await.unwrap();
        assert_eq!(reload, r#"{"type":"reload"}"#);

        tx.send(WsMsg::Shutdown).await.unwrap();
        actor.await.unwrap();
    }
}

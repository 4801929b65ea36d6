//! WebSocket server for live reload.
//!
//! Accepted connections are handed to `WsActor`. A plain
//! `GET /livereload.js` on the same port is answered with the client
//! script, so a proxied application can load it without the static server.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;
use crate::embed::serve::livereload_js;
use crate::utils::net::bind_first_free;
use crate::{debug, log};

/// Path the client script is served under on the WebSocket port.
pub const SCRIPT_PATH: &str = "/livereload.js";

/// Bind the WebSocket port and start accepting clients on a thread.
///
/// Returns the port actually bound.
pub fn start_ws_server(base_port: u16, ws_tx: mpsc::Sender<WsMsg>) -> Result<u16> {
    let (listener, _) = bind_first_free("ws", base_port, |port| TcpListener::bind(("127.0.0.1", port)))?;
    let port = listener.local_addr()?.port();
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    debug!("ws"; "connection from {}", addr);
                    let _ = stream.set_nonblocking(false);

                    if is_script_request(&stream) {
                        if let Err(e) = respond_script(stream, port) {
                            debug!("ws"; "script response failed: {}", e);
                        }
                        continue;
                    }

                    if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                        // Actor stopped: watch session is over
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    log!("ws"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(port)
}

/// Whether the connection asks for the client script rather than an upgrade.
fn is_script_request(stream: &TcpStream) -> bool {
    let _ = stream.set_read_timeout(Some(Duration::from_millis(500)));
    let mut buf = [0u8; 64];
    let n = stream.peek(&mut buf).unwrap_or(0);
    let _ = stream.set_read_timeout(None);
    is_script_request_line(&buf[..n])
}

fn is_script_request_line(head: &[u8]) -> bool {
    let Some(rest) = head.strip_prefix(b"GET ") else {
        return false;
    };
    let Some(path) = rest.strip_prefix(SCRIPT_PATH.as_bytes()) else {
        return false;
    };
    matches!(path.first(), Some(b' ' | b'?'))
}

fn respond_script(mut stream: TcpStream, port: u16) -> std::io::Result<()> {
    let body = livereload_js(port);
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nConnection: close\r\n\r\n",
        crate::utils::mime::types::JAVASCRIPT,
        body.len()
    )?;
    stream.write_all(body.as_bytes())?;
    stream.flush()
}

//! Static development server for the destination root.
//!
//! Serves built files with `index.html` as directory index and injects the
//! live-reload client into every HTML response. Only started by `watch` when
//! the active profile has no proxy target.

mod path;
mod response;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use tiny_http::{Request, Server};

use crate::config::ServeConfig;
use crate::core::{is_shutdown, register_server};
use crate::embed::serve::LIVERELOAD_URL;
use crate::utils::net::bind_first_free;
use crate::{debug, log};

/// Request handler threads.
const WORKERS: usize = 4;

/// What a request handler needs.
struct ServeState {
    root: PathBuf,
    index: String,
    ws_port: u16,
}

/// Bound server ready to accept requests.
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    state: Arc<ServeState>,
    pool: rayon::ThreadPool,
}

/// Running request loop.
pub struct ServerHandle {
    server: Arc<Server>,
    thread: JoinHandle<()>,
}

/// Bind the HTTP server without starting the request loop.
pub fn bind(destination: PathBuf, config: &ServeConfig, ws_port: u16) -> Result<BoundServer> {
    let (server, port) = bind_first_free("serve", config.port, |port| {
        Server::http(SocketAddr::new(config.interface, port))
    })?;
    // port 0 binds an OS-chosen port
    let addr = server
        .server_addr()
        .to_ip()
        .unwrap_or_else(|| SocketAddr::new(config.interface, port));
    let server = Arc::new(server);
    register_server(Arc::clone(&server));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(WORKERS)
        .thread_name(|i| format!("serve-{i}"))
        .build()?;

    Ok(BoundServer {
        server,
        addr,
        state: Arc::new(ServeState {
            root: destination,
            index: config.index.clone(),
            ws_port,
        }),
        pool,
    })
}

impl BoundServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the request loop on its own thread.
    pub fn spawn(self) -> ServerHandle {
        let server = Arc::clone(&self.server);
        let thread = thread::spawn(move || self.run());
        ServerHandle { server, thread }
    }

    fn run(self) {
        for request in self.server.incoming_requests() {
            let state = Arc::clone(&self.state);
            self.pool.spawn(move || {
                if let Err(e) = handle_request(request, &state) {
                    log!("serve"; "request error: {e}");
                }
            });
        }
        debug!("serve"; "request loop stopped");
    }
}

impl ServerHandle {
    /// Unblock the request loop and wait for it to return.
    pub fn stop(self) {
        self.server.unblock();
        let _ = self.thread.join();
    }
}

fn handle_request(request: Request, state: &ServeState) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    debug!("serve"; "{} {}", request.method(), request.url());

    let url = request.url().to_string();
    if url.split('?').next() == Some(LIVERELOAD_URL) {
        return response::respond_livereload_js(request, state.ws_port);
    }

    match path::resolve_path(&url, &state.root, &state.index) {
        Some(file) => response::respond_file(request, &file),
        None => response::respond_not_found(request, &state.root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{IpAddr, Ipv4Addr, TcpStream};
    use tempfile::TempDir;

    fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_serves_pages_with_client_injected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<body>hi</body>").unwrap();

        let config = ServeConfig {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..ServeConfig::default()
        };
        let bound = bind(dir.path().to_path_buf(), &config, 35999).unwrap();
        let addr = bound.addr();
        let handle = bound.spawn();

        let page = get(addr, "/");
        assert!(page.starts_with("HTTP/1.1 200"));
        assert!(page.contains(r#"hi<script src="/__stitch/livereload.js" defer></script></body>"#));

        let script = get(addr, LIVERELOAD_URL);
        assert!(script.contains("35999"));

        let missing = get(addr, "/nope.css");
        assert!(missing.starts_with("HTTP/1.1 404"));

        handle.stop();
    }
}

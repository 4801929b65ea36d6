//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::embed::serve::{LIVERELOAD_URL, livereload_js, script_tag};
use crate::utils::mime::{self, types};

/// Respond with a file, injecting the live-reload client into HTML.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = maybe_inject_livereload(body, content_type);
    send_body(request, 200, content_type, body)
}

/// Respond with `404.html` from the served root if present, plain text otherwise.
pub fn respond_not_found(request: Request, serve_root: &Path) -> Result<()> {
    let custom_404 = serve_root.join("404.html");
    let has_custom = custom_404.is_file();

    if is_head_request(&request) {
        let mime = if has_custom { types::HTML } else { types::PLAIN };
        return send_head(request, 404, mime);
    }

    if has_custom && let Ok(body) = fs::read(&custom_404) {
        let body = maybe_inject_livereload(body, types::HTML);
        return send_body(request, 404, types::HTML, body);
    }

    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, types::PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with the live-reload client from memory.
pub fn respond_livereload_js(request: Request, ws_port: u16) -> Result<()> {
    let body = livereload_js(ws_port);
    send_body(request, 200, types::JAVASCRIPT, body.into_bytes())
}

/// Insert the client script tag before `</body>` of HTML bodies.
pub fn maybe_inject_livereload(body: Vec<u8>, content_type: &str) -> Vec<u8> {
    if !mime::is_html(content_type) {
        return body;
    }

    let script = script_tag(LIVERELOAD_URL);
    let script = script.as_bytes();
    const PATTERN: &[u8] = b"</body>";

    let pos = body
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(body.len());

    let mut result = Vec::with_capacity(body.len() + script.len());
    result.extend_from_slice(&body[..pos]);
    result.extend_from_slice(script);
    result.extend_from_slice(&body[pos..]);
    result
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let mut response = Response::empty(StatusCode(status));
    for header in headers(content_type) {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    let mut response = Response::from_data(body).with_status_code(StatusCode(status));
    for header in headers(content_type) {
        response.add_header(header);
    }
    request.respond(response)?;
    Ok(())
}

/// Development responses are never cached by the browser.
fn headers(content_type: &'static str) -> Vec<Header> {
    [("Content-Type", content_type), ("Cache-Control", "no-store")]
        .into_iter()
        .filter_map(|(key, value)| Header::from_bytes(key, value).ok())
        .collect()
}

//! Embedded static resources.
//!
//! The live-reload client is minified by `build.rs`, with the overlay
//! stylesheet inlined. Only the WebSocket port is filled in at run time.

pub mod serve {
    /// Left in the minified client by `build.rs`.
    const WS_PORT_PLACEHOLDER: &str = "__STITCH_WS_PORT__";

    const LIVERELOAD_MIN_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/livereload.min.js"));

    /// URL the static server exposes the client under.
    pub const LIVERELOAD_URL: &str = "/__stitch/livereload.js";

    /// Client script connecting to the live-reload socket on `ws_port`.
    pub fn livereload_js(ws_port: u16) -> String {
        LIVERELOAD_MIN_JS.replace(WS_PORT_PLACEHOLDER, &ws_port.to_string())
    }

    /// Tag inserted before `</body>` of served HTML pages.
    pub fn script_tag(src: &str) -> String {
        format!(r#"<script src="{src}" defer></script>"#)
    }
}

//! `[serve]` section configuration.
//!
//! Development server used by `watch` when the active profile has no proxy.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 3000                 # HTTP port for the destination root
//! ws_port = 35729             # Live-reload WebSocket port
//! index = "index.html"        # Directory index file
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.
//! Both ports are retried upward when taken.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,
    /// HTTP port number.
    pub port: u16,
    /// Live-reload WebSocket port.
    pub ws_port: u16,
    /// Directory index file.
    pub index: String,
}

pub struct ServeFields {
    pub port: FieldPath,
    pub ws_port: FieldPath,
    pub index: FieldPath,
}

impl ServeConfig {
    pub const FIELDS: ServeFields = ServeFields {
        port: FieldPath::new("serve.port"),
        ws_port: FieldPath::new("serve.ws_port"),
        index: FieldPath::new("serve.index"),
    };

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == 0 {
            diag.error(Self::FIELDS.port, "port must not be 0");
        } else if self.port < 1024 {
            diag.warn(Self::FIELDS.port, "ports below 1024 usually need elevated privileges");
        }
        if self.ws_port == 0 {
            diag.error(Self::FIELDS.ws_port, "port must not be 0");
        }
        if self.port == self.ws_port {
            diag.error_with_hint(
                Self::FIELDS.ws_port,
                format!("{} equals {}", Self::FIELDS.ws_port, Self::FIELDS.port),
                "the live-reload socket needs its own port",
            );
        }
        if !crate::bundle::is_plain_file_name(&self.index) {
            diag.error(Self::FIELDS.index, format!("`{}` is not a file name", self.index));
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            ws_port: 35729,
            index: "index.html".into(),
        }
    }
}

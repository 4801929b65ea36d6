//! Live-reload message protocol.
//!
//! # Message Types
//!
//! - `reload`: full page reload
//! - `css`: replace the stylesheet whose href ends with `target`
//! - `notify`: transient overlay for `timeout` milliseconds
//! - `connected`: sent once after the handshake

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    Reload,

    Css {
        /// Output path relative to the destination root, e.g. `css/site.css`
        target: String,
        content: String,
    },

    Notify { message: String, timeout: u64 },

    Connected { version: String },
}

impl ReloadMessage {
    pub const fn reload() -> Self {
        Self::Reload
    }

    pub fn css(target: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Css {
            target: target.into(),
            content: content.into(),
        }
    }

    pub fn notify(message: impl Into<String>, timeout: u64) -> Self {
        Self::Notify {
            message: message.into(),
            timeout,
        }
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Short label for debug logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::Css { .. } => "css",
            Self::Notify { .. } => "notify",
            Self::Connected { .. } => "connected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_json() {
        assert_eq!(ReloadMessage::reload().to_json(), r#"{"type":"reload"}"#);
    }

    #[test]
    fn test_css_json() {
        let json = ReloadMessage::css("css/site.css", "a{}").to_json();
        assert_eq!(json, r#"{"type":"css","target":"css/site.css","content":"a{}"}"#);
    }

    #[test]
    fn test_notify_json() {
        let json = ReloadMessage::notify("ParseError", 3000).to_json();
        assert_eq!(json, r#"{"type":"notify","message":"ParseError","timeout":3000}"#);
    }

    #[test]
    fn test_connected_roundtrip() {
        let msg = ReloadMessage::connected();
        let back: ReloadMessage = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(back, msg);
        assert_eq!(back.label(), "connected");
    }
}

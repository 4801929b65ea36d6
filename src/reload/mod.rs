//! Live-reload channel.
//!
//! ```text
//! tasks ──LiveChannel──► WsActor ──websocket──► browser client
//! ```
//!
//! # Modules
//!
//! - `message` - JSON messages understood by the client script
//! - `channel` - Sending side handed to tasks
//! - `server` - WebSocket listener with port retry

pub mod channel;
pub mod message;
pub mod server;

pub use channel::LiveChannel;
pub use message::ReloadMessage;

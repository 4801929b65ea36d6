//! Actor System for watch mode
//!
//! Message-passing concurrency for watch sessions:
//!
//! ```text
//! FsActor --> ControlActor --> TaskGraph --> LiveChannel --> WsActor
//! (watch)     (rebuild)        (tasks)                      (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `controller` - Runs the task for each rebuild request
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod controller;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use controller::SessionEnd;
pub use coordinator::Coordinator;

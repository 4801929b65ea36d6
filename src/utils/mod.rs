//! Shared helpers: command execution, MIME detection, ports, paths, pluralization.

pub mod exec;
pub mod mime;
pub mod net;
pub mod path;
pub mod plural;

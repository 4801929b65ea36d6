//! Core types shared across the codebase.

mod error;
mod kind;
mod options;
mod state;

pub use error::BuildError;
pub use kind::BundleKind;
pub use options::BuildOptions;
pub use state::{is_shutdown, register_server, register_shutdown, setup_shutdown_handler};

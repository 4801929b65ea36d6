//! Path utilities.
//!
//! - [`fs`]: filesystem path normalization and root-relative forms used by
//!   glob matching (`normalize_path`, `resolve_path`, `relative_slash`)

pub mod fs;

pub use fs::{is_within, normalize_path, relative_slash, resolve_path};

//! `[glob]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [glob]
//! negation = "ordered"   # or "global"
//! ```
//!
//! `ordered`: a `!pattern` excludes only what earlier patterns included.
//! `global`: a `!pattern` excludes wherever it appears in the list.

use crate::bundle::NegationMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobConfig {
    pub negation: NegationMode,
}

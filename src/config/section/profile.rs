//! `[profile]` and `[profiles.<name>]` configuration.
//!
//! A profile describes one environment the same sources are built for.
//!
//! # Example
//!
//! ```toml
//! [profile]
//! default = "site"
//!
//! [profiles.site]
//! destination = "build"         # destination root
//! markup = true                 # build HTML pages
//!
//! [profiles.app]
//! destination = "../public/assets"
//! proxy = "http://localhost:8000"   # an existing app server, no static server
//! markup = false
//! styles_dir = "css"
//! scripts_dir = "js"
//! ```
//!
//! Selection order: `--profile`, then `[profile] default`, then a profile
//! named `default`, then the only declared profile. Without any
//! `[profiles.*]` table a built-in `default` profile is used.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Destination root, relative to the project root.
    pub destination: PathBuf,
    /// Application URL the live-reload script is embedded into instead of
    /// starting the static server.
    pub proxy: Option<String>,
    /// Build markup pages.
    pub markup: bool,
    /// Style output directory under the destination root.
    pub styles_dir: PathBuf,
    /// Script output directory under the destination root.
    pub scripts_dir: PathBuf,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("build"),
            proxy: None,
            markup: true,
            styles_dir: PathBuf::from("css"),
            scripts_dir: PathBuf::from("js"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSelect {
    pub default: Option<String>,
}

/// The profile chosen at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveProfile {
    pub name: String,
    pub config: ProfileConfig,
}

impl Default for ActiveProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE.into(),
            config: ProfileConfig::default(),
        }
    }
}

pub fn select_profile(
    profiles: &BTreeMap<String, ProfileConfig>,
    requested: Option<&str>,
    configured: Option<&str>,
) -> Result<ActiveProfile, ConfigError> {
    let found = |name: &str| {
        profiles.get(name).map(|config| ActiveProfile {
            name: name.to_string(),
            config: config.clone(),
        })
    };

    if let Some(name) = requested.or(configured) {
        if profiles.is_empty() && name == DEFAULT_PROFILE {
            return Ok(ActiveProfile::default());
        }
        return found(name).ok_or_else(|| {
            let known: Vec<_> = profiles.keys().map(String::as_str).collect();
            ConfigError::Validation(if known.is_empty() {
                format!("unknown profile `{name}`, no [profiles.*] declared")
            } else {
                format!("unknown profile `{name}`, expected one of: {}", known.join(", "))
            })
        });
    }

    if profiles.is_empty() {
        return Ok(ActiveProfile::default());
    }
    if let Some(active) = found(DEFAULT_PROFILE) {
        return Ok(active);
    }
    if profiles.len() == 1
        && let Some((name, config)) = profiles.iter().next()
    {
        return Ok(ActiveProfile {
            name: name.clone(),
            config: config.clone(),
        });
    }

    Err(ConfigError::Validation(format!(
        "several profiles declared ({}), choose one with --profile or [profile] default",
        profiles.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
    )))
}

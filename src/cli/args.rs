//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Front-end asset bundler: ordered concatenation, style and script
/// transforms, watch with live reload
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "stitch.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Environment profile from `[profiles.<name>]`
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Production build: minify output, no source maps, no style injection
    #[arg(long, global = true)]
    pub prod: bool,

    /// Log every matched input file and raw watch events
    #[arg(long, global = true)]
    pub debug: bool,

    /// Force source maps, also in production builds
    #[arg(long = "sm", global = true)]
    pub source_maps: bool,

    /// Task to run (default: build)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available tasks
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Clean, then build styles, scripts and markup in parallel
    #[command(visible_alias = "b")]
    Build,
    /// Delete declared outputs from the destination root
    Clean,
    /// Build style bundles
    Styles,
    /// Build script bundles
    Scripts,
    /// Build markup pages
    Markup,
    /// Build, then watch with live reload
    #[command(visible_alias = "d")]
    Dev,
    /// Watch sources and rebuild on change
    #[command(visible_alias = "w")]
    Watch,
}

impl Commands {
    /// Name of the task this command runs.
    pub const fn task(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Clean => "clean",
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Markup => "markup",
            Self::Dev => "dev",
            Self::Watch => "watch",
        }
    }
}

impl Cli {
    /// Task to run; `build` when no subcommand was given.
    pub fn task(&self) -> &'static str {
        self.command.map_or("build", Commands::task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_task_is_build() {
        let cli = Cli::try_parse_from(["stitch"]).unwrap();
        assert_eq!(cli.task(), "build");
        assert!(!cli.prod);
        assert_eq!(cli.config, PathBuf::from("stitch.toml"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["stitch", "dev", "--prod", "--sm", "--debug", "--profile", "app"])
            .unwrap();
        assert_eq!(cli.command, Some(Commands::Dev));
        assert_eq!(cli.task(), "dev");
        assert!(cli.prod && cli.source_maps && cli.debug);
        assert_eq!(cli.profile.as_deref(), Some("app"));
    }

    #[test]
    fn test_config_flag() {
        let cli = Cli::try_parse_from(["stitch", "-C", "conf/assets.toml", "clean"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("conf/assets.toml"));
        assert_eq!(cli.task(), "clean");
    }

    #[test]
    fn test_unknown_task_rejected() {
        assert!(Cli::try_parse_from(["stitch", "deploy"]).is_err());
    }
}

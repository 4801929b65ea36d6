//! Stitch - a front-end asset bundler with watch and live reload.

mod actor;
mod bundle;
mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod pipeline;
mod reload;
mod task;
mod utils;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::ProjectConfig;
use core::BuildOptions;
use task::{BuildContext, build_graph};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.debug);

    let config = ProjectConfig::load(&cli)?;
    let options = BuildOptions::resolve(cli.prod, cli.source_maps, config.pipeline.source_maps);
    debug!("config"; "profile `{}`, {} mode", config.active.name, options.mode());

    let ctx = Arc::new(BuildContext::new(&config, options)?);
    let graph = build_graph(ctx)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let task = cli.task();
    let started = Instant::now();
    let result = rt.block_on(graph.run(task));
    rt.shutdown_timeout(Duration::from_millis(500));

    result.with_context(|| format!("task `{task}` failed"))?;
    log!("stitch"; "finished `{}` after {} ms", task, started.elapsed().as_millis());
    Ok(())
}

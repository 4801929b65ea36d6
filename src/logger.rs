//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` for per-file and per-event detail shown with `--debug`
//! - `WatchStatus` for the watch-mode rebuild status block
//!
//! # Example
//!
//! ```ignore
//! log!("styles"; "site.css ({} files)", count);
//! debug!("watch"; "event: {:?}", event);
//! status_success("rebuilt styles");
//! ```

use std::io::{Write, stdout};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use crossterm::cursor;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use owo_colors::{OwoColorize, Style};
use parking_lot::Mutex;

/// Global verbose flag (set by the `--debug` CLI flag)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --debug is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Execute code only when --debug is enabled
///
/// Use this to avoid computing expensive debug data when not needed.
#[macro_export]
macro_rules! debug_do {
    ($($body:tt)*) => {{
        if $crate::logger::is_verbose() {
            $($body)*
        }
    }};
}

/// Write one `[module] message` line below any status block.
pub fn log(module: &str, message: &str) {
    let prefix = format!("[{module}]").style(prefix_style(module)).to_string();

    WATCH_STATUS.lock().detach();

    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

fn prefix_style(module: &str) -> Style {
    let style = Style::new().bold();
    match module.to_ascii_lowercase().as_str() {
        "serve" | "ws" => style.bright_blue(),
        "watch" => style.bright_green(),
        "styles" | "scripts" | "markup" | "clean" => style.bright_cyan(),
        "error" => style.bright_red(),
        _ => style.bright_yellow(),
    }
}

/// Wall-clock `HH:MM:SS` (UTC).
fn now() -> String {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("{:02}:{:02}:{:02}", secs / 3600 % 24, secs / 60 % 60, secs % 60)
}

// ============================================================================
// Watch status
// ============================================================================

/// The rebuild result block shown while watching.
///
/// A new result replaces the previous block in place, so a burst of
/// rebuilds leaves one line (plus error detail) on screen. Any `log!` in
/// between detaches the block and it is left alone.
pub struct WatchStatus {
    /// Height of the block currently on screen.
    last_lines: usize,
}

static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> = LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    pub fn success(&mut self, message: &str) {
        self.replace(&"✓".green().to_string(), message);
    }

    pub fn error(&mut self, summary: &str, detail: &str) {
        let message = match detail {
            "" => summary.to_string(),
            detail => format!("{summary}\n{detail}"),
        };
        self.replace(&"✗".red().to_string(), &message);
    }

    fn replace(&mut self, symbol: &str, message: &str) {
        let mut out = stdout().lock();
        if let Ok(lines @ 1..) = u16::try_from(self.last_lines) {
            execute!(out, cursor::MoveUp(lines), Clear(ClearType::FromCursorDown)).ok();
        }
        writeln!(out, "{} {symbol} {message}", format!("[{}]", now()).dimmed()).ok();
        out.flush().ok();
        self.last_lines = line_count(message);
    }

    pub fn detach(&mut self) {
        self.last_lines = 0;
    }
}

fn line_count(message: &str) -> usize {
    message.lines().count().max(1)
}

pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

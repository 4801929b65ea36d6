//! Errors raised while loading `stitch.toml`.

use std::fmt;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use thiserror::Error;

use super::FieldPath;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),

    // No #[from]: a source() would print the diagnostics twice
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One finding about one config field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub severity: Severity,
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{}{}", "[".dimmed(), self.field.as_str().cyan(), "]".dimmed())?;
        write!(f, "{} {}", "→".red(), self.message)?;
        match &self.hint {
            Some(hint) => write!(f, "\n  {} {}", "hint:".yellow(), hint),
            None => Ok(()),
        }
    }
}

/// Findings from every section's `validate`, reported in one go.
///
/// Only errors fail the load; warnings are logged and the build proceeds.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    items: Vec<ConfigDiagnostic>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, field: FieldPath, message: String, hint: Option<String>) {
        self.items.push(ConfigDiagnostic { severity, field, message, hint });
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(Severity::Error, field, message.into(), None);
    }

    pub fn error_with_hint(&mut self, field: FieldPath, message: impl Into<String>, hint: impl Into<String>) {
        self.push(Severity::Error, field, message.into(), Some(hint.into()));
    }

    pub fn warn(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(Severity::Warning, field, message.into(), None);
    }

    /// Informational; logged right away and never stored.
    pub fn hint(&mut self, field: FieldPath, message: impl Into<String>) {
        crate::log!("hint"; "[{}] {}", field.as_str(), message.into());
    }

    pub fn print_warnings(&self) {
        for w in self.warnings() {
            crate::log!("warning"; "[{}] {}", w.field.as_str(), w.message);
        }
    }

    fn of(&self, severity: Severity) -> Vec<&ConfigDiagnostic> {
        self.items.iter().filter(|d| d.severity == severity).collect()
    }

    pub fn errors(&self) -> Vec<&ConfigDiagnostic> {
        self.of(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<&ConfigDiagnostic> {
        self.of(Severity::Warning)
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.items.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors();
        writeln!(f, "{}", "config validation failed:".red().bold())?;
        for err in &errors {
            write!(f, "\n{err}\n")?;
        }
        if errors.len() > 1 {
            write!(
                f,
                "\n{} {} {}",
                "found".dimmed(),
                errors.len().to_string().red().bold(),
                "errors".dimmed()
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("stitch.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = io_err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("stitch.toml"));

        let err = ConfigError::Validation("unknown profile `staging`".to_string());
        assert!(err.to_string().contains("unknown profile"));
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let mut diag = ConfigDiagnostics::new();
        diag.warn(FieldPath::new("serve.port"), "privileged port");

        assert!(diag.is_empty());
        assert_eq!(diag.warnings().len(), 1);
        assert!(diag.into_result().is_ok());
    }

    #[test]
    fn test_diagnostics_collects_errors() {
        let mut diag = ConfigDiagnostics::new();
        diag.error(FieldPath::new("bundles.styles"), "`file` is empty");
        diag.warn(FieldPath::new("serve.port"), "privileged port");
        diag.error_with_hint(FieldPath::new("pipeline.less"), "`lessc` not found", "npm i -g less");

        assert_eq!(diag.len(), 2);
        assert_eq!(diag.errors()[1].hint.as_deref(), Some("npm i -g less"));

        let text = diag.into_result().unwrap_err().to_string();
        assert!(text.contains("bundles.styles"));
        assert!(text.contains("found"));
        assert!(!text.contains("privileged"));
    }
}

//! Error types and terminal error reporting
//!
//! Configuration-phase errors (bad format lists, missing tools) abort before
//! any bundler invocation. Bundler-phase failures are wrapped in a
//! [`BundlerDiagnostic`] carrying whatever plugin/location context the
//! external toolchain surfaced, and are formatted once at the top level.

use std::fmt;
use std::io;
use std::path::PathBuf;

use colored::Colorize;
use serde::Deserialize;
use thiserror::Error;

/// Errors produced by tsbuild itself
#[derive(Debug, Error)]
pub enum Error {
    /// Empty or unrecognized module format list
    #[error("invalid module format list: {0}")]
    InvalidFormat(String),

    /// Running Node does not satisfy the template engine requirement
    #[error("unsupported Node version: {running} does not satisfy the requirement of Node {required}")]
    UnsupportedNodeVersion { required: String, running: String },

    /// Read/write/mkdir failure with path context
    #[error("{message}: {path}")]
    Fs {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required external tool is missing from PATH
    #[error("required tool not found on PATH: {0}")]
    ToolNotFound(String),

    /// Failure surfaced by the external bundler/transform/minify toolchain
    #[error("{0}")]
    Bundler(BundlerDiagnostic),

    /// A spawned bundler task panicked or was aborted
    #[error("bundler task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Shorthand for wrapping an io error with path context
    pub fn fs(message: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Fs {
            message: message.into(),
            path: path.into(),
            source,
        }
    }
}

/// Source location reported by the bundler for a failing module
#[derive(Debug, Clone, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u64,
    pub column: u64,
}

/// Structured failure reported by the rollup driver process
///
/// The driver prints this as a single JSON line on stderr; when the process
/// dies without one (missing rollup install, OOM, ...) the raw stderr text
/// becomes the message and everything else stays empty.
#[derive(Debug, Clone, Deserialize)]
pub struct BundlerDiagnostic {
    pub message: String,
    #[serde(default)]
    pub plugin: Option<String>,
    #[serde(default)]
    pub loc: Option<SourceLocation>,
    #[serde(default)]
    pub frame: Option<String>,
}

impl BundlerDiagnostic {
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            plugin: None,
            loc: None,
            frame: None,
        }
    }

    /// Parse the driver's structured stderr, falling back to the raw text
    pub fn from_stderr(stderr: &str) -> Self {
        stderr
            .lines()
            .rev()
            .find(|line| line.trim_start().starts_with('{'))
            .and_then(|line| serde_json::from_str(line).ok())
            .unwrap_or_else(|| Self::from_message(stderr.trim().to_string()))
    }

    /// Headline in rollup's reporting style: `(plugin) message`
    fn headline(&self) -> String {
        match self.plugin.as_deref() {
            // rollup-plugin-typescript2 registers itself as "rpt2"
            Some("rpt2") => format!("(typescript) {}", self.message),
            Some(plugin) => format!("({} plugin) {}", plugin, self.message),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for BundlerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())
    }
}

/// Print a failure to stderr with plugin-origin context when available
pub fn log_error(err: &Error) {
    match err {
        Error::Bundler(diag) => {
            eprintln!("{}", diag.headline().red().bold());
            if let Some(loc) = &diag.loc {
                eprintln!();
                eprintln!("at {}:{}:{}", loc.file, loc.line, loc.column);
            }
            if let Some(frame) = &diag.frame {
                eprintln!();
                eprintln!("{}", frame.dimmed());
            }
            eprintln!();
        }
        other => {
            eprintln!("{} {}", "Error!".red().bold(), other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_from_structured_stderr() {
        let stderr = "some noise\n{\"message\":\"Unexpected token\",\"plugin\":\"babel\",\"loc\":{\"file\":\"src/index.ts\",\"line\":3,\"column\":7}}\n";
        let diag = BundlerDiagnostic::from_stderr(stderr);
        assert_eq!(diag.message, "Unexpected token");
        assert_eq!(diag.plugin.as_deref(), Some("babel"));
        let loc = diag.loc.unwrap();
        assert_eq!(loc.line, 3);
        assert_eq!(loc.column, 7);
    }

    #[test]
    fn test_diagnostic_from_raw_stderr() {
        let diag = BundlerDiagnostic::from_stderr("node: command not found\n");
        assert_eq!(diag.message, "node: command not found");
        assert!(diag.plugin.is_none());
    }

    #[test]
    fn test_headline_maps_typescript_plugin() {
        let mut diag = BundlerDiagnostic::from_message("TS2304: Cannot find name 'foo'");
        diag.plugin = Some("rpt2".to_string());
        assert_eq!(
            diag.headline(),
            "(typescript) TS2304: Cannot find name 'foo'"
        );
    }
}

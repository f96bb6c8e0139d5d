//! Error types for headless installation.
//!
//! This module defines the errors that stop an installation from producing a
//! result. Each variant includes an actionable fix suggestion. A wrapped
//! installer that runs to completion but exits non-zero is not an error; it
//! is reported through [`InstallerResult`](crate::InstallerResult).

use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Characters of prompt text quoted in an unexpected-prompt message.
const PROMPT_EXCERPT_CHARS: usize = 500;

/// Errors that prevent a headless installation from completing.
///
/// The set is closed over the ways a call can fail: a bad target path, a
/// missing runtime, a protocol failure while driving the installer (timeout
/// or unexpected prompt), or an automation failure around the child process.
///
/// # Example
///
/// ```rust
/// use bmad_headless::InstallerError;
///
/// fn handle_error(error: InstallerError) {
///     eprintln!("Installation failed: {}", error);
///     eprintln!("To fix: {}", error.fix_suggestion());
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallerError {
    /// The target path does not exist.
    #[error("Target path does not exist: {}", .path.display())]
    PathNotFound {
        /// The path that was given.
        path: PathBuf,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The target path exists but is not a directory.
    #[error("Target path is not a directory: {}", .path.display())]
    NotADirectory {
        /// The path that was given.
        path: PathBuf,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// A runtime the installer needs is missing or too old.
    ///
    /// The installer is run through `npx`, which requires Node.js 20+.
    #[error("Runtime not found: {name}")]
    RuntimeMissing {
        /// Name of the missing prerequisite (e.g., "Node.js 20+").
        name: String,
        /// Version that was found, when an older one is installed.
        found: Option<String>,
        /// URL where the prerequisite can be downloaded.
        install_url: Option<String>,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The interactive session exceeded its time budget.
    #[error("Installation timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// The configured session timeout.
        timeout: Duration,
        /// Time spent before the session was abandoned.
        elapsed: Duration,
        /// Output received since the last answered prompt.
        buffered_output: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The installer asked something no prompt rule recognises.
    #[error(
        "Unexpected prompt detected. Expected one of [{}]. Prompt text: {}",
        .expected.join(", "),
        excerpt(.prompt_text)
    )]
    UnexpectedPrompt {
        /// Output containing the unrecognised prompt.
        prompt_text: String,
        /// Names of the rules that were tried.
        expected: Vec<String>,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// Driving the child process failed (PTY, spawn, or I/O).
    #[error("Automation error: {message}")]
    Automation {
        /// Description of the failure.
        message: String,
        /// Underlying I/O error, if any.
        source: Option<std::io::Error>,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },
}

fn excerpt(text: &str) -> String {
    text.trim().chars().take(PROMPT_EXCERPT_CHARS).collect()
}

impl InstallerError {
    /// Wrap an automation failure without an underlying I/O error.
    pub(crate) fn automation(message: impl Into<String>) -> Self {
        Self::Automation {
            message: message.into(),
            source: None,
            fix: "Re-run with --debug to see the installer output".to_string(),
        }
    }

    /// Wrap an I/O failure while driving the child process.
    pub(crate) fn automation_io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Automation {
            message: format!("{}: {}", message.into(), source),
            source: Some(source),
            fix: "Re-run with --debug to see the installer output".to_string(),
        }
    }

    /// Get an actionable suggestion for fixing this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bmad_headless::InstallerError;
    /// use std::path::PathBuf;
    ///
    /// let error = InstallerError::PathNotFound {
    ///     path: PathBuf::from("/missing"),
    ///     fix: "Create the directory first".to_string(),
    /// };
    /// assert_eq!(error.fix_suggestion(), "Create the directory first");
    /// ```
    pub fn fix_suggestion(&self) -> &str {
        match self {
            Self::PathNotFound { fix, .. } => fix,
            Self::NotADirectory { fix, .. } => fix,
            Self::RuntimeMissing { fix, .. } => fix,
            Self::Timeout { fix, .. } => fix,
            Self::UnexpectedPrompt { fix, .. } => fix,
            Self::Automation { fix, .. } => fix,
        }
    }

    /// Diagnostic context for this error as JSON.
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::PathNotFound { path, .. } | Self::NotADirectory { path, .. } => {
                json!({ "target_path": path.display().to_string() })
            }
            Self::RuntimeMissing {
                name,
                found,
                install_url,
                ..
            } => json!({
                "missing_dependency": name,
                "found": found,
                "install_url": install_url,
            }),
            Self::Timeout {
                timeout,
                elapsed,
                buffered_output,
                ..
            } => json!({
                "timeout": timeout.as_secs(),
                "elapsed_seconds": elapsed.as_secs_f64(),
                "last_output": buffered_output,
            }),
            Self::UnexpectedPrompt {
                prompt_text,
                expected,
                ..
            } => json!({
                "before": prompt_text,
                "expected_patterns": expected,
            }),
            Self::Automation { message, .. } => json!({ "error": message }),
        }
    }
}

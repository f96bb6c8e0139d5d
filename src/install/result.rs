//! Result types for headless installation.
//!
//! An [`InstallerResult`] is produced once per completed session. It records
//! how the installer was run, every response that was injected, and how the
//! installer exited.

use crate::detection::ConfigSnapshot;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Characters of prompt text kept in each response log entry.
pub const PROMPT_TEXT_CHARS: usize = 200;

/// How the installer treated the target directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum InstallMode {
    /// Fresh installation; no marker directory existed.
    Install,
    /// Reinstall over an existing installation.
    Update,
    /// Existing installation refreshed through the installer's quick-update path.
    QuickUpdate,
}

/// One injected response, recorded for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseLogEntry {
    /// When the response was sent.
    pub timestamp: DateTime<Utc>,
    /// Name of the prompt rule that matched.
    pub rule: String,
    /// Output leading up to and including the match, at most
    /// [`PROMPT_TEXT_CHARS`] characters.
    pub prompt_text: String,
    /// The line that was sent (without the line terminator).
    pub response: String,
}

impl ResponseLogEntry {
    /// Record a response sent now.
    pub fn new(rule: &str, prompt_text: &str, response: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            rule: rule.to_string(),
            prompt_text: tail_chars(prompt_text.trim(), PROMPT_TEXT_CHARS),
            response: response.to_string(),
        }
    }

    /// Serialize this entry as a single JSON line.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max)).collect()
}

/// Outcome of a headless installation that ran to completion.
///
/// A non-zero exit from the installer is reported here with `success: false`
/// rather than as an [`InstallerError`](crate::InstallerError), so callers can
/// tell "the installer declined" apart from "the installer could not be
/// driven".
///
/// # Example
///
/// ```rust,no_run
/// use bmad_headless::{install, InstallOptions, InstallerConfig};
/// use std::path::Path;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let config = InstallerConfig::default();
///     let result = install(Path::new("."), &config, InstallOptions::default(), |_| {}).await;
///
///     if let Ok(result) = result {
///         println!("{} mode, exit code {}", result.mode, result.exit_code);
///         for entry in &result.response_log {
///             println!("{} -> {:?}", entry.rule, entry.response);
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct InstallerResult {
    /// `true` when the installer exited with code 0.
    pub success: bool,
    /// Exit code reported by the installer.
    pub exit_code: i32,
    /// Whether this was a fresh install or an update.
    pub mode: InstallMode,
    /// Responses in the order the prompts were observed.
    pub response_log: Vec<ResponseLogEntry>,
    /// Existing configuration, when one was found and preservation was on.
    pub preserved_config: Option<ConfigSnapshot>,
    /// Human-readable failure description for non-zero exits.
    pub error_message: Option<String>,
    /// Wall-clock time of the whole call.
    #[serde(rename = "duration_seconds", serialize_with = "serialize_secs")]
    pub duration: Duration,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl InstallerResult {
    /// Response log as JSON lines, one entry per line.
    pub fn audit_lines(&self) -> Result<Vec<String>, serde_json::Error> {
        self.response_log
            .iter()
            .map(ResponseLogEntry::to_json_line)
            .collect()
    }
}

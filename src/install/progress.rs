//! Progress reporting types for headless installation.
//!
//! The [`InstallProgress`] enum represents discrete stages of a headless
//! installation. Events are delivered to the callback passed to
//! [`install`](crate::install()), which scopes all reporting to one call.

use crate::install::ResponseLogEntry;
use std::path::PathBuf;

/// Progress stages during a headless installation.
///
/// # Example
///
/// ```rust
/// use bmad_headless::InstallProgress;
///
/// fn on_progress(progress: InstallProgress) {
///     match &progress {
///         InstallProgress::Output { chunk } => print!("{}", chunk),
///         InstallProgress::Responded { entry } => {
///             eprintln!("answered {} with {:?}", entry.rule, entry.response);
///         }
///         other => eprintln!("{}", other.description()),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum InstallProgress {
    /// Installation has started.
    Started {
        /// The directory being provisioned.
        target: PathBuf,
    },

    /// Checking the Node.js runtime before launching.
    CheckingPrerequisites,

    /// A previous installation was found in the target.
    ExistingInstallation {
        /// Version recorded on disk, if any.
        version: Option<String>,
    },

    /// The installer is being launched.
    Launching {
        /// The command line, for display.
        command: String,
    },

    /// Raw installer output. Only emitted when the config enables debug.
    Output {
        /// Output text as received from the terminal.
        chunk: String,
    },

    /// A prompt was answered.
    Responded {
        /// The audit record for the response.
        entry: ResponseLogEntry,
    },

    /// The installer exited.
    Completed {
        /// Exit code reported by the installer.
        exit_code: i32,
    },
}

impl InstallProgress {
    /// Get a human-readable description of the current progress stage.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bmad_headless::InstallProgress;
    ///
    /// let progress = InstallProgress::CheckingPrerequisites;
    /// assert_eq!(progress.description(), "Checking prerequisites");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Self::Started { .. } => "Starting installation",
            Self::CheckingPrerequisites => "Checking prerequisites",
            Self::ExistingInstallation { .. } => "Existing installation detected",
            Self::Launching { .. } => "Launching installer",
            Self::Output { .. } => "Installer output",
            Self::Responded { .. } => "Answered prompt",
            Self::Completed { .. } => "Installer finished",
        }
    }

    /// Check if this progress stage indicates completion.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

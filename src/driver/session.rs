//! The seam between the driver and a running installer.

use crate::{InstallerConfig, InstallerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::io;
use std::path::Path;
use tokio::sync::mpsc;

/// npm package that provides the installer.
pub const INSTALLER_PACKAGE: &str = "bmad-method";

/// A structured command for launching the installer.
///
/// # Example
///
/// ```rust
/// use bmad_headless::{InstallCommand, InstallerConfig};
///
/// let cmd = InstallCommand::for_config(&InstallerConfig::default());
/// assert_eq!(cmd.to_string(), "npx bmad-method install");
///
/// let pinned = InstallerConfig {
///     version: "6.0.0-Beta.5".to_string(),
///     ..Default::default()
/// };
/// let cmd = InstallCommand::for_config(&pinned);
/// assert_eq!(cmd.to_string(), "npx bmad-method@6.0.0-Beta.5 install");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallCommand {
    /// The program to execute.
    pub program: String,

    /// Arguments to pass to the program.
    pub args: Vec<String>,

    /// Environment variables to set for the child (key, value pairs).
    pub env_vars: Vec<(String, String)>,
}

impl InstallCommand {
    /// Build the installer invocation for a config.
    ///
    /// The `latest` sentinel selects the unpinned package; any other version
    /// is embedded as `bmad-method@<version>` so differently pinned runs never
    /// reuse one cached package.
    pub fn for_config(config: &InstallerConfig) -> Self {
        let package = if config.is_latest() {
            INSTALLER_PACKAGE.to_string()
        } else {
            format!("{}@{}", INSTALLER_PACKAGE, config.version.trim())
        };

        Self {
            program: "npx".to_string(),
            args: vec![package, "install".to_string()],
            env_vars: vec![("TERM".to_string(), "xterm-256color".to_string())],
        }
    }
}

impl fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Control over a spawned installer process.
///
/// Implementations write to the child's terminal input and manage its
/// lifetime. `wait` may block and is run off the async executor.
pub trait InstallerProcess: Send {
    /// Write `line` followed by a line terminator to the child's input.
    fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Block until the child exits and return its exit code.
    fn wait(&mut self) -> io::Result<i32>;

    /// Kill the child if it is still running and release its resources.
    fn terminate(&mut self) -> io::Result<()>;
}

/// A launched installer: its output stream and its process handle.
pub struct SpawnedSession {
    /// Decoded terminal output in arrival order. Closes when the child's
    /// terminal reaches end of stream.
    pub output: mpsc::Receiver<String>,

    /// Handle used to answer prompts and collect the exit code.
    pub process: Box<dyn InstallerProcess>,
}

impl fmt::Debug for SpawnedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedSession").finish_non_exhaustive()
    }
}

/// Starts installer processes.
///
/// [`PtyLauncher`](crate::PtyLauncher) is the production implementation;
/// tests substitute scripted sessions.
pub trait Launcher {
    /// Check that the runtime needed to launch is available.
    fn preflight(&self) -> impl Future<Output = Result<(), InstallerError>> + Send;

    /// Spawn `command` with `cwd` as its working directory.
    fn launch(&self, command: &InstallCommand, cwd: &Path)
        -> Result<SpawnedSession, InstallerError>;
}

//! Runtime checks for the wrapped installer.
//!
//! The installer is distributed through npm and launched with `npx`, so a
//! Node.js runtime must be on PATH before anything is spawned. This module
//! provides [`check_runtime`] for that pre-flight check.

use crate::InstallerError;
use regex::Regex;
use semver::Version;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Default timeout for the `node --version` check.
const RUNTIME_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Oldest Node.js major version the installer supports.
pub const MIN_NODE_MAJOR: u64 = 20;

const NODE_INSTALL_URL: &str = "https://nodejs.org";

/// The Node.js runtime found on this machine.
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    /// Resolved path of `npx`.
    pub npx: PathBuf,
    /// Version reported by `node --version`.
    pub node_version: Version,
}

/// Check that `npx` and a recent enough Node.js are available.
///
/// 1. Locates `npx` on PATH
/// 2. Runs `node --version` with a 5 second timeout
/// 3. Requires a major version of at least [`MIN_NODE_MAJOR`]
///
/// Returns [`InstallerError::RuntimeMissing`] naming the prerequisite when
/// any step fails.
///
/// # Example
///
/// ```rust,no_run
/// use bmad_headless::check_runtime;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     match check_runtime().await {
///         Ok(info) => println!("Node.js {} via {:?}", info.node_version, info.npx),
///         Err(e) => {
///             eprintln!("Cannot install: {}", e);
///             eprintln!("To fix: {}", e.fix_suggestion());
///         }
///     }
/// }
/// ```
pub async fn check_runtime() -> Result<RuntimeInfo, InstallerError> {
    let npx = which::which("npx").map_err(|_| missing("npx", None))?;
    debug!(npx = %npx.display(), "found npx");

    let mut cmd = Command::new("node");
    cmd.arg("--version").kill_on_drop(true);

    let output = match timeout(RUNTIME_CHECK_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => output,
        _ => return Err(missing(&node_requirement(), None)),
    };

    // Prefer stdout, fall back to stderr
    let output_str = if !output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::from_utf8_lossy(&output.stderr).to_string()
    };

    let node_version =
        parse_node_version(&output_str).ok_or_else(|| missing(&node_requirement(), None))?;

    if node_version.major < MIN_NODE_MAJOR {
        return Err(missing(
            &node_requirement(),
            Some(node_version.to_string()),
        ));
    }

    debug!(node = %node_version, "runtime ok");
    Ok(RuntimeInfo { npx, node_version })
}

fn node_requirement() -> String {
    format!("Node.js {}+", MIN_NODE_MAJOR)
}

/// Build the error for a missing or outdated prerequisite.
pub(crate) fn missing(name: &str, found: Option<String>) -> InstallerError {
    let fix = match &found {
        Some(found) => format!(
            "Upgrade Node.js from {} to version {}+ ({})",
            found, MIN_NODE_MAJOR, NODE_INSTALL_URL
        ),
        None => format!(
            "Install Node.js {}+ (which provides npx) from {}",
            MIN_NODE_MAJOR, NODE_INSTALL_URL
        ),
    };

    InstallerError::RuntimeMissing {
        name: name.to_string(),
        found,
        install_url: Some(NODE_INSTALL_URL.to_string()),
        fix,
    }
}

/// Parse `node --version` output such as `v20.11.1`.
fn parse_node_version(output: &str) -> Option<Version> {
    let re = Regex::new(r"v?(\d+)\.(\d+)\.(\d+)").expect("Invalid node version regex");
    let caps = re.captures(output)?;
    let whole = caps.get(0)?.as_str().trim_start_matches('v');
    Version::parse(whole).ok()
}

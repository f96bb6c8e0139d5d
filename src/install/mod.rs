//! Headless installation of the BMAD Method.
//!
//! This module runs the installer, answers its prompts, and packages the
//! outcome.
//!
//! # Example
//!
//! ```rust,no_run
//! use bmad_headless::{install, InstallOptions, InstallerConfig};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = InstallerConfig::default();
//!     match install(Path::new("."), &config, InstallOptions::default(), |_| {}).await {
//!         Ok(result) => {
//!             for line in result.audit_lines().unwrap_or_default() {
//!                 println!("{}", line);
//!             }
//!         }
//!         Err(e) => eprintln!("{}\nTo fix: {}", e, e.fix_suggestion()),
//!     }
//! }
//! ```

mod errors;
mod executor;
pub(crate) mod prereq;
mod progress;
mod result;

pub use errors::InstallerError;
pub use executor::{install, Installer};
pub use prereq::{check_runtime, RuntimeInfo, MIN_NODE_MAJOR};
pub use progress::InstallProgress;
pub use result::{InstallMode, InstallerResult, ResponseLogEntry, PROMPT_TEXT_CHARS};

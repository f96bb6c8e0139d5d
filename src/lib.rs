//! # bmad-headless
//!
//! Non-interactive installation of the BMAD Method.
//!
//! The BMAD installer is an interactive terminal program. This crate runs it
//! inside a pseudo-terminal, recognises each question it asks, and answers
//! from an [`InstallerConfig`], so a project can be provisioned from scripts
//! and CI without a human at the keyboard.
//!
//! ## Features
//!
//! - [`PromptTable`] ordered catalog of known installer prompts
//! - [`detect_installed_version`] and [`compare_versions`] for existing installs
//! - [`ProcessDriver`] answering prompts under a single session timeout
//! - [`install()`] orchestrating a run and returning an [`InstallerResult`]
//!   with an audit log of every response
//!
//! ## Example
//!
//! ```rust,no_run
//! use bmad_headless::{install, InstallOptions, InstallerConfig};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = InstallerConfig {
//!         user_name: "Roy".to_string(),
//!         ..Default::default()
//!     };
//!
//!     match install(Path::new("."), &config, InstallOptions::default(), |_| {}).await {
//!         Ok(result) => println!("{} mode, success={}", result.mode, result.success),
//!         Err(e) => eprintln!("{}\nTo fix: {}", e, e.fix_suggestion()),
//!     }
//! }
//! ```

mod config;
mod detection;
mod driver;
mod install;
mod prompts;

pub use config::{is_latest, InstallOptions, InstallerConfig, LATEST};
pub use detection::{
    compare_versions, config_file, detect_installed_version, find_existing_installation,
    manifest_file, marker_dir, ConfigSnapshot, ExistingInstallation, MARKER_DIR,
};
pub use driver::{
    InstallCommand, InstallerProcess, Launcher, ProcessDriver, PtyLauncher, SessionOutcome,
    SpawnedSession, DEFAULT_IDLE_PROMPT, INSTALLER_PACKAGE,
};
pub use install::{
    check_runtime, install, InstallMode, InstallProgress, Installer, InstallerError,
    InstallerResult, ResponseLogEntry, RuntimeInfo, MIN_NODE_MAJOR, PROMPT_TEXT_CHARS,
};
pub use prompts::{ConfigField, PromptMatch, PromptRule, PromptTable, ResponseSource, PROMPT_RULES};

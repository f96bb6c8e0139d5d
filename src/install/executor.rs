//! Headless installation of the BMAD Method into a project directory.
//!
//! This module provides the [`Installer`] orchestrator and the [`install`]
//! convenience function. Both run the installer in a pseudo-terminal, answer
//! its prompts from an [`InstallerConfig`], and report progress through a
//! caller-supplied callback.

use crate::detection::find_existing_installation;
use crate::driver::{
    InstallCommand, Launcher, ProcessDriver, PtyLauncher, SessionOutcome, DEFAULT_IDLE_PROMPT,
};
use crate::install::{InstallMode, InstallProgress, InstallerError, InstallerResult};
use crate::prompts::QUICK_UPDATE_RULE;
use crate::{InstallOptions, InstallerConfig, PromptTable};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Runs headless installations through a [`Launcher`].
///
/// The default launcher spawns the real installer in a PTY. Supplying another
/// launcher through [`Installer::with_launcher`] replaces process creation
/// while keeping the rest of the pipeline.
///
/// # Example
///
/// ```rust,no_run
/// use bmad_headless::{InstallOptions, Installer, InstallerConfig};
/// use std::path::Path;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let config = InstallerConfig {
///         user_name: "Roy".to_string(),
///         ..Default::default()
///     };
///     let installer = Installer::new();
///     let result = installer
///         .install(Path::new("./project"), &config, InstallOptions::default(), |_| {})
///         .await;
///
///     match result {
///         Ok(r) if r.success => println!("Installed ({} mode)", r.mode),
///         Ok(r) => println!("Installer exited with code {}", r.exit_code),
///         Err(e) => println!("Failed: {}. Fix: {}", e, e.fix_suggestion()),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Installer<L = PtyLauncher> {
    launcher: L,
    table: PromptTable,
    idle_prompt: Duration,
}

impl Installer<PtyLauncher> {
    /// Create an installer that launches the real BMAD installer.
    pub fn new() -> Self {
        Self::with_launcher(PtyLauncher)
    }
}

impl Default for Installer<PtyLauncher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Launcher> Installer<L> {
    /// Create an installer that starts processes through `launcher`.
    pub fn with_launcher(launcher: L) -> Self {
        Self {
            launcher,
            table: PromptTable::standard(),
            idle_prompt: DEFAULT_IDLE_PROMPT,
        }
    }

    /// Set how long question-shaped output may sit unanswered before the
    /// session fails with [`InstallerError::UnexpectedPrompt`].
    pub fn idle_prompt_threshold(mut self, idle: Duration) -> Self {
        self.idle_prompt = idle;
        self
    }

    /// Install into `target`, answering prompts from `config`.
    ///
    /// This function:
    /// 1. Validates the target directory
    /// 2. Runs the launcher's pre-flight check
    /// 3. Detects an existing installation
    /// 4. Launches the installer with `target` as its working directory
    /// 5. Answers prompts until the installer exits
    ///
    /// # Returns
    ///
    /// - `Ok(InstallerResult)` once the installer has exited, whatever its
    ///   exit code
    /// - `Err(InstallerError)` when the installer could not be run or driven
    ///   to completion
    ///
    /// Calling this function is consent to install. Concurrent calls must use
    /// different targets.
    pub async fn install<F>(
        &self,
        target: &Path,
        config: &InstallerConfig,
        options: InstallOptions,
        on_progress: F,
    ) -> Result<InstallerResult, InstallerError>
    where
        F: Fn(InstallProgress),
    {
        let started = Instant::now();
        on_progress(InstallProgress::Started {
            target: target.to_path_buf(),
        });

        // Step 1: Validate the target
        check_target(target)?;

        // Step 2: Pre-flight check
        on_progress(InstallProgress::CheckingPrerequisites);
        self.launcher.preflight().await?;

        // Step 3: Existing installation
        let existing = find_existing_installation(target);
        if let Some(found) = &existing {
            info!(
                root = %found.root.display(),
                version = found.version.as_deref().unwrap_or("unknown"),
                "existing installation detected"
            );
            on_progress(InstallProgress::ExistingInstallation {
                version: found.version.clone(),
            });
        }

        // Step 4: Launch
        let command = InstallCommand::for_config(config);
        info!(command = %command, target = %target.display(), "launching installer");
        on_progress(InstallProgress::Launching {
            command: command.to_string(),
        });
        let session = self.launcher.launch(&command, target)?;

        // Step 5: Drive the session
        let SessionOutcome {
            exit_code,
            responses,
        } = ProcessDriver::new(&self.table, config)
            .idle_prompt(self.idle_prompt)
            .run(session, &on_progress)
            .await?;
        on_progress(InstallProgress::Completed { exit_code });

        // Step 6: Package the outcome
        let mode = match &existing {
            None => InstallMode::Install,
            Some(_) if responses.iter().any(|e| e.rule == QUICK_UPDATE_RULE) => {
                InstallMode::QuickUpdate
            }
            Some(_) => InstallMode::Update,
        };

        let success = exit_code == 0;
        let error_message = if success {
            None
        } else {
            warn!(exit_code, "installer exited with failure");
            Some(format!("Installer exited with code {}", exit_code))
        };

        let preserved_config = if options.preserve_existing {
            existing.and_then(|found| found.config)
        } else {
            None
        };

        Ok(InstallerResult {
            success,
            exit_code,
            mode,
            response_log: responses,
            preserved_config,
            error_message,
            duration: started.elapsed(),
        })
    }
}

fn check_target(target: &Path) -> Result<(), InstallerError> {
    if !target.exists() {
        return Err(InstallerError::PathNotFound {
            path: target.to_path_buf(),
            fix: format!("Create the directory first: mkdir -p {}", target.display()),
        });
    }
    if !target.is_dir() {
        return Err(InstallerError::NotADirectory {
            path: target.to_path_buf(),
            fix: "Pass the project directory, not a file inside it".to_string(),
        });
    }
    Ok(())
}

/// Install the BMAD Method into `target` using the real installer.
///
/// Shorthand for [`Installer::new`] followed by [`Installer::install`].
///
/// # Example
///
/// ```rust,no_run
/// use bmad_headless::{install, InstallOptions, InstallProgress, InstallerConfig};
/// use std::path::Path;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let result = install(
///         Path::new("."),
///         &InstallerConfig::default(),
///         InstallOptions::default(),
///         |progress| eprintln!("{}", progress.description()),
///     )
///     .await;
///
///     match result {
///         Ok(r) => println!("exit code {}", r.exit_code),
///         Err(e) => println!("Failed: {}. Fix: {}", e, e.fix_suggestion()),
///     }
/// }
/// ```
pub async fn install<F>(
    target: &Path,
    config: &InstallerConfig,
    options: InstallOptions,
    on_progress: F,
) -> Result<InstallerResult, InstallerError>
where
    F: Fn(InstallProgress),
{
    Installer::new()
        .install(target, config, options, on_progress)
        .await
}

//! Drives an interactive installer session to completion.
//!
//! [`ProcessDriver`] reads the installer's terminal output, answers each
//! recognised prompt from the config, and collects the exit code. The session
//! moves through waiting, responding, and done; a timeout or an unrecognised
//! prompt fails it and the child is terminated.

mod matcher;
mod pty;
mod session;

pub use pty::PtyLauncher;
pub use session::{InstallCommand, InstallerProcess, Launcher, SpawnedSession, INSTALLER_PACKAGE};

use crate::install::ResponseLogEntry;
use crate::{InstallProgress, InstallerConfig, InstallerError, PromptTable};
use matcher::{OutputMatcher, WaitEvent};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Quiet period after which question-shaped output counts as a prompt.
pub const DEFAULT_IDLE_PROMPT: Duration = Duration::from_secs(10);

/// What a session that ran to completion produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Exit code reported by the installer.
    pub exit_code: i32,
    /// Responses in the order they were sent.
    pub responses: Vec<ResponseLogEntry>,
}

/// Answers installer prompts from an [`InstallerConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ProcessDriver<'a> {
    table: &'a PromptTable,
    config: &'a InstallerConfig,
    idle_prompt: Duration,
}

impl<'a> ProcessDriver<'a> {
    /// Create a driver answering `table`'s prompts from `config`.
    pub fn new(table: &'a PromptTable, config: &'a InstallerConfig) -> Self {
        Self {
            table,
            config,
            idle_prompt: DEFAULT_IDLE_PROMPT,
        }
    }

    /// Set how long question-shaped output must sit unanswered before it is
    /// reported as an unexpected prompt.
    pub fn idle_prompt(mut self, idle: Duration) -> Self {
        self.idle_prompt = idle;
        self
    }

    /// Run the session until the installer exits.
    ///
    /// The config timeout bounds the whole session, not each wait. On timeout
    /// or an unexpected prompt the child is terminated before the error is
    /// returned.
    pub async fn run<F>(
        &self,
        session: SpawnedSession,
        on_progress: &F,
    ) -> Result<SessionOutcome, InstallerError>
    where
        F: Fn(InstallProgress),
    {
        let SpawnedSession {
            output,
            mut process,
        } = session;
        let started = Instant::now();
        let deadline = started + self.config.timeout();
        let mut matcher = OutputMatcher::new(output, self.table, self.idle_prompt);
        let mut responses = Vec::new();

        loop {
            debug!(state = "waiting", answered = responses.len());
            let event = matcher
                .next_event(deadline, |chunk| {
                    if self.config.debug {
                        on_progress(InstallProgress::Output {
                            chunk: chunk.to_string(),
                        });
                    }
                })
                .await;

            match event {
                WaitEvent::Prompt {
                    rule,
                    before,
                    matched,
                } => {
                    debug!(state = "responding", rule);
                    let prompt_text = format!("{}{}", before, matched);
                    match self.respond(rule, &prompt_text, process.as_mut()) {
                        Ok(entry) => {
                            on_progress(InstallProgress::Responded {
                                entry: entry.clone(),
                            });
                            responses.push(entry);
                        }
                        Err(e) => {
                            abort(process.as_mut());
                            return Err(e);
                        }
                    }
                }
                WaitEvent::Unrecognized { text } => {
                    debug!(state = "failed", "unrecognized prompt");
                    abort(process.as_mut());
                    return Err(self.unexpected(text));
                }
                WaitEvent::TimedOut { buffered } => {
                    debug!(state = "failed", "session timed out");
                    abort(process.as_mut());
                    return Err(InstallerError::Timeout {
                        timeout: self.config.timeout(),
                        elapsed: started.elapsed(),
                        buffered_output: buffered,
                        fix: "Raise the timeout, or re-run with --debug to see where the installer stalled"
                            .to_string(),
                    });
                }
                WaitEvent::EndOfOutput => break,
            }
        }

        let exit_code = wait_for_exit(process).await?;
        debug!(state = "done", exit_code, answered = responses.len());
        Ok(SessionOutcome {
            exit_code,
            responses,
        })
    }

    fn respond(
        &self,
        index: usize,
        prompt_text: &str,
        process: &mut dyn InstallerProcess,
    ) -> Result<ResponseLogEntry, InstallerError> {
        let Some(rule) = self.table.get(index) else {
            return Err(self.unexpected(prompt_text.to_string()));
        };

        let response = rule.response(self.config);
        process.send_line(&response).map_err(|e| {
            InstallerError::automation_io(format!("failed to answer {} prompt", rule.name), e)
        })?;
        debug!(rule = rule.name, response = %response, "answered prompt");

        Ok(ResponseLogEntry::new(rule.name, prompt_text, &response))
    }

    fn unexpected(&self, prompt_text: String) -> InstallerError {
        InstallerError::UnexpectedPrompt {
            prompt_text,
            expected: self.table.names().into_iter().map(String::from).collect(),
            fix: "The installer asked a question with no configured answer; check for a newer release of this tool or answer it manually"
                .to_string(),
        }
    }
}

fn abort(process: &mut dyn InstallerProcess) {
    if let Err(e) = process.terminate() {
        warn!(error = %e, "failed to terminate installer");
    }
}

async fn wait_for_exit(mut process: Box<dyn InstallerProcess>) -> Result<i32, InstallerError> {
    tokio::task::spawn_blocking(move || process.wait())
        .await
        .map_err(|e| InstallerError::automation(format!("exit wait task failed: {}", e)))?
        .map_err(|e| InstallerError::automation_io("failed to wait for installer", e))
}

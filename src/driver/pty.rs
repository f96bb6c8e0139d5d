//! Pseudo-terminal launcher.
//!
//! The installer only renders its interactive prompts when attached to a
//! terminal, so it is spawned inside a PTY. A reader thread decodes the
//! terminal output and forwards it over a channel; responses are written to
//! the PTY master.

use super::session::{InstallCommand, InstallerProcess, Launcher, SpawnedSession};
use crate::install::prereq::{check_runtime, missing};
use crate::InstallerError;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Terminal size reported to the installer. Wide enough that clack does not
/// wrap prompt lines.
const PTY_SIZE: PtySize = PtySize {
    rows: 40,
    cols: 200,
    pixel_width: 0,
    pixel_height: 0,
};

const OUTPUT_CHANNEL_CAPACITY: usize = 256;
const READ_CHUNK_BYTES: usize = 4096;

/// Launches the installer in a native pseudo-terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PtyLauncher;

impl Launcher for PtyLauncher {
    async fn preflight(&self) -> Result<(), InstallerError> {
        let runtime = check_runtime().await?;
        debug!(node = %runtime.node_version, "runtime preflight passed");
        Ok(())
    }

    fn launch(
        &self,
        command: &InstallCommand,
        cwd: &Path,
    ) -> Result<SpawnedSession, InstallerError> {
        let pair = native_pty_system()
            .openpty(PTY_SIZE)
            .map_err(|e| InstallerError::automation(format!("failed to open pty: {}", e)))?;

        let mut cmd = CommandBuilder::new(&command.program);
        cmd.args(&command.args);
        cmd.cwd(cwd);
        for (key, value) in &command.env_vars {
            cmd.env(key, value);
        }

        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            let message = e.to_string();
            let not_found = e
                .downcast_ref::<io::Error>()
                .is_some_and(|io| io.kind() == io::ErrorKind::NotFound)
                || message.contains("not found in PATH")
                || message.contains("doesn't exist");
            if not_found {
                missing(&command.program, None)
            } else {
                InstallerError::automation(format!("failed to spawn `{}`: {}", command, message))
            }
        })?;
        // the master only sees EOF once every slave handle is closed
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| InstallerError::automation(format!("failed to read pty: {}", e)))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| InstallerError::automation(format!("failed to write pty: {}", e)))?;

        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        thread::Builder::new()
            .name("pty-reader".to_string())
            .spawn(move || read_output(reader, tx))
            .map_err(|e| InstallerError::automation_io("failed to start pty reader", e))?;

        debug!(command = %command, cwd = %cwd.display(), "installer spawned");

        Ok(SpawnedSession {
            output: rx,
            process: Box::new(PtyProcess {
                child,
                writer,
                _master: pair.master,
            }),
        })
    }
}

struct PtyProcess {
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    _master: Box<dyn MasterPty + Send>,
}

impl InstallerProcess for PtyProcess {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        // a carriage return is what the Enter key sends
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\r")?;
        self.writer.flush()
    }

    fn wait(&mut self) -> io::Result<i32> {
        let status = self.child.wait()?;
        Ok(i32::try_from(status.exit_code()).unwrap_or(i32::MAX))
    }

    fn terminate(&mut self) -> io::Result<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.child.kill()?;
        self.child.wait().map(|_| ())
    }
}

/// Forward PTY output until end of stream or until the receiver is gone.
fn read_output(mut reader: Box<dyn Read + Send>, tx: mpsc::Sender<String>) {
    let mut buf = [0u8; READ_CHUNK_BYTES];
    let mut pending = Vec::new();

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let text = take_utf8(&mut pending);
                if !text.is_empty() && tx.blocking_send(text).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // Linux reports EIO once the child side closes
            Err(e) => {
                debug!(error = %e, "pty output ended");
                break;
            }
        }
    }

    if !pending.is_empty() {
        let tail = String::from_utf8_lossy(&pending).into_owned();
        if tx.blocking_send(tail).is_err() {
            warn!("dropped trailing installer output");
        }
    }
}

/// Decode the complete UTF-8 prefix of `pending`, leaving a split trailing
/// sequence for the next read. Invalid bytes are replaced.
fn take_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending) {
        Ok(text) => {
            let text = text.to_string();
            pending.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
            pending.drain(..valid);
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            text
        }
    }
}

//! `bmad-headless`: install the BMAD Method without answering prompts.

use bmad_headless::{
    install, InstallOptions, InstallProgress, InstallerConfig, InstallerError, InstallerResult,
};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Run the BMAD Method installer non-interactively.
#[derive(Debug, Parser)]
#[command(name = "bmad-headless", about)]
struct Cli {
    /// Project directory to install into
    #[arg(default_value = ".")]
    target: PathBuf,

    /// Installer version to run [default: latest]
    #[arg(long = "version", env = "BMAD_VERSION", value_name = "VERSION")]
    installer_version: Option<String>,

    /// Name the installer records for the user [default: Developer]
    #[arg(long, env = "BMAD_USER_NAME")]
    user_name: Option<String>,

    /// Communication language [default: English]
    #[arg(long, env = "BMAD_LANGUAGE")]
    language: Option<String>,

    /// Output directory name [default: _bmad-output]
    #[arg(long, env = "BMAD_OUTPUT_DIR")]
    output_dir: Option<String>,

    /// Session timeout in seconds [default: 120]
    #[arg(long, env = "BMAD_TIMEOUT", value_name = "SECONDS")]
    timeout: Option<NonZeroU64>,

    /// Mirror installer output and log every transition
    #[arg(long)]
    debug: bool,

    /// Do not report the existing configuration in the result
    #[arg(long)]
    no_preserve: bool,

    /// Modules to install, comma separated
    #[arg(long, value_delimiter = ',')]
    modules: Option<Vec<String>>,

    /// Decline agent installation
    #[arg(long)]
    skip_agents: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Write the response log to FILE as JSON lines
    #[arg(long, value_name = "FILE")]
    audit_log: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> InstallerConfig {
        let defaults = InstallerConfig::default();
        InstallerConfig {
            version: self.installer_version.clone().unwrap_or(defaults.version),
            user_name: self.user_name.clone().unwrap_or(defaults.user_name),
            language: self.language.clone().unwrap_or(defaults.language),
            output_dir: self.output_dir.clone().unwrap_or(defaults.output_dir),
            timeout_secs: self.timeout.unwrap_or(defaults.timeout_secs),
            debug: self.debug,
            modules: self.modules.clone(),
            skip_agents: self.skip_agents,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = cli.config();
    let options = InstallOptions {
        preserve_existing: !cli.no_preserve,
    };

    match install(&cli.target, &config, options, report).await {
        Ok(result) => finish(&cli, &result),
        Err(e) => {
            print_error(&e, cli.debug);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn report(progress: InstallProgress) {
    match progress {
        InstallProgress::Output { chunk } => {
            let mut stdout = io::stdout().lock();
            let _ = stdout.write_all(chunk.as_bytes());
            let _ = stdout.flush();
        }
        InstallProgress::Responded { entry } => {
            info!(rule = %entry.rule, response = %entry.response, "answered prompt");
        }
        other if other.is_complete() => info!("{}", other.description()),
        other => debug!("{}", other.description()),
    }
}

fn finish(cli: &Cli, result: &InstallerResult) -> ExitCode {
    if let Some(path) = &cli.audit_log {
        if let Err(e) = write_audit_log(path, result) {
            eprintln!("Error: failed to write audit log {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to serialize result: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        if result.success {
            println!("Installed successfully ({} mode)", result.mode);
        } else {
            println!(
                "Installation failed: {}",
                result.error_message.as_deref().unwrap_or("unknown error")
            );
        }
        println!("Duration: {:.1}s", result.duration.as_secs_f64());
        println!("Responses logged: {}", result.response_log.len());
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        // the wrapped tool's code, when it fits a process exit status
        u8::try_from(result.exit_code)
            .ok()
            .filter(|code| *code != 0)
            .map_or(ExitCode::FAILURE, ExitCode::from)
    }
}

fn write_audit_log(path: &Path, result: &InstallerResult) -> io::Result<()> {
    let lines = result.audit_lines().map_err(io::Error::other)?;
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)
}

fn print_error(error: &InstallerError, debug: bool) {
    eprintln!("Error: {}", error);
    eprintln!("To fix: {}", error.fix_suggestion());
    if debug {
        if let Ok(details) = serde_json::to_string_pretty(&error.details()) {
            eprintln!("{}", details);
        }
    }
}

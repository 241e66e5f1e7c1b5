//! sapdriver CLI
//!
//! Logs on to an SAP system through SAP GUI Scripting and reports the result.
//!
//! Usage:
//!   sapdriver login --config prd.yaml               # launch SAP Logon, log on, close
//!   sapdriver login --config prd.yaml --attach      # reuse a running SAP Logon
//!   sapdriver login --config prd.yaml --keep-open   # leave the session open
//!   sapdriver check-config --config prd.yaml        # validate without touching SAP

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sapdriver::{platforms, AutomationError, Automator, FailureKind, SessionState, StatusLine};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

mod config;
mod logging;

use config::{FileConfig, Overrides};

#[derive(Parser)]
#[command(name = "sapdriver")]
#[command(about = "Unattended SAP GUI logon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// YAML run configuration
    #[clap(long, short = 'c', env = "SAPDRIVER_CONFIG")]
    config: PathBuf,

    /// Connection description as shown in SAP Logon
    #[clap(long, env = "SAPDRIVER_SYSTEM")]
    system: Option<String>,

    #[clap(long, env = "SAPDRIVER_CLIENT")]
    client: Option<String>,

    #[clap(long, env = "SAPDRIVER_USER")]
    username: Option<String>,

    #[clap(long, env = "SAPDRIVER_LANGUAGE")]
    language: Option<String>,
}

impl ConfigArgs {
    fn load(&self) -> Result<FileConfig> {
        let overrides = Overrides {
            system: self.system.clone(),
            client: self.client.clone(),
            username: self.username.clone(),
            language: self.language.clone(),
        };
        Ok(overrides.apply(FileConfig::load(&self.config)?))
    }
}

#[derive(Parser, Debug)]
struct LoginArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Password for the configured user
    #[clap(long, env = "SAPDRIVER_PASSWORD", hide_env_values = true)]
    password: String,

    /// Attach to an already running SAP Logon instead of launching one
    #[clap(long)]
    attach: bool,

    /// Leave the session open after logging on
    #[clap(long)]
    keep_open: bool,

    /// Print the result as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch or attach, log on, confirm pending pop-ups and report
    Login(LoginArgs),
    /// Validate a configuration file and print it
    CheckConfig(ConfigArgs),
}

#[derive(Debug, Serialize)]
struct LoginReport {
    system: String,
    state: SessionState,
    dialogs_dismissed: bool,
    status: Option<StatusLine>,
    closed: bool,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    system: String,
    kind: FailureKind,
    retryable: bool,
    message: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Login(args) => login(args).await,
        Commands::CheckConfig(args) => check_config(args),
    }
}

fn check_config(args: ConfigArgs) -> Result<()> {
    let file = args.load()?;
    file.automator_config()
        .validate()
        .context("Invalid automator settings")?;
    sapdriver::config::validate_credentials(&file.credentials(""))
        .context("Invalid logon settings")?;
    println!("{}", serde_json::to_string_pretty(&file)?);
    Ok(())
}

async fn login(args: LoginArgs) -> Result<()> {
    let file = args.config.load()?;
    file.automator_config()
        .validate()
        .context("Invalid automator settings")?;
    let (_guard, _log_path) = logging::init(&file.log_name)?;

    let system = file.system.clone();
    let json = args.json;

    // SAP GUI scripting is blocking COM bound to one thread; keep every call
    // on a single blocking worker.
    let outcome = tokio::task::spawn_blocking(move || run_login(&file, &args))
        .await
        .context("Login worker panicked")?;

    match outcome {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Logged on to {} ({:?})", report.system, report.state);
                if let Some(status) = report.status.as_ref().filter(|s| !s.text.is_empty()) {
                    println!("Status: {}", status.text);
                }
            }
            Ok(())
        }
        Err(e) => {
            let Some(failure) = e.downcast_ref::<AutomationError>() else {
                return Err(e);
            };
            let report = FailureReport {
                system,
                kind: failure.kind(),
                retryable: failure.is_retryable(),
                message: failure.to_string(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            let hint = match report.kind {
                FailureKind::Connectivity => {
                    "the environment may not be ready, retrying later can help"
                }
                FailureKind::StructuralMismatch => {
                    "the screen does not match the expected layout, do not retry blindly"
                }
            };
            bail!(
                "Login to {} failed: {} ({})",
                report.system,
                report.message,
                hint
            )
        }
    }
}

fn run_login(file: &FileConfig, args: &LoginArgs) -> Result<LoginReport> {
    let host = platforms::create_host().context("SAP GUI scripting is not available")?;
    let mut automator = Automator::new(
        host,
        file.automator_config(),
        file.credentials(&args.password),
    )
    .context("Invalid configuration")?;

    automator.initialize_connection(!args.attach)?;
    let dialogs_dismissed = automator.drain_dialogs();
    let status = match automator.status_line() {
        Ok(status) => Some(status),
        Err(e) => {
            error!("Could not read status bar: {}", e);
            None
        }
    };
    let state = automator.state();

    let closed = !args.keep_open;
    if closed {
        automator.close_connection();
    } else {
        info!("Leaving session open");
    }

    Ok(LoginReport {
        system: file.system.clone(),
        state,
        dialogs_dismissed,
        status,
        closed,
    })
}

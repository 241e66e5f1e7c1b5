use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::Credentials;

pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_SESSION_WAIT: Duration = Duration::from_secs(3);
pub const DEFAULT_LOGIN_SETTLE: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DIALOG_SWEEPS: usize = 50;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Fixed waits of the acquisition sequence. None of them can be interrupted
/// once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Upper bound for the scripting engine to appear after launch.
    pub launch_timeout: Duration,
    /// Pause between engine lookups while waiting for readiness.
    pub poll_interval: Duration,
    /// One-time pause before rechecking a connection that has no session yet.
    pub session_wait: Duration,
    /// Pause between pressing the logon button and reading the status bar.
    pub login_settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            launch_timeout: DEFAULT_LAUNCH_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            session_wait: DEFAULT_SESSION_WAIT,
            login_settle: DEFAULT_LOGIN_SETTLE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutomatorConfig {
    /// Path to the logon pad executable (saplogon.exe).
    pub executable: PathBuf,
    /// Connection description as listed in the logon pad.
    pub system_name: String,
    pub timings: Timings,
    /// Upper bound on modal confirmations per drain.
    pub max_dialog_sweeps: usize,
}

impl AutomatorConfig {
    pub fn new(executable: impl Into<PathBuf>, system_name: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            system_name: system_name.into(),
            timings: Timings::default(),
            max_dialog_sweeps: DEFAULT_MAX_DIALOG_SWEEPS,
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_max_dialog_sweeps(mut self, sweeps: usize) -> Self {
        self.max_dialog_sweeps = sweeps;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executable.as_os_str().is_empty() {
            return Err(ConfigError::Missing("executable"));
        }
        if self.system_name.trim().is_empty() {
            return Err(ConfigError::Missing("system_name"));
        }
        if self.timings.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "poll_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_dialog_sweeps == 0 {
            return Err(ConfigError::Invalid {
                name: "max_dialog_sweeps",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), ConfigError> {
    if credentials.client().trim().is_empty() {
        return Err(ConfigError::Missing("client"));
    }
    if !credentials.client().chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Invalid {
            name: "client",
            reason: format!("'{}' is not a numeric client", credentials.client()),
        });
    }
    if credentials.username().trim().is_empty() {
        return Err(ConfigError::Missing("username"));
    }
    if credentials.language().trim().is_empty() {
        return Err(ConfigError::Missing("language"));
    }
    Ok(())
}

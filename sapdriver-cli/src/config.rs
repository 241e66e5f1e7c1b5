//! YAML run configuration.
//!
//! ```yaml
//! executable: 'C:\Program Files (x86)\SAP\FrontEnd\SAPgui\saplogon.exe'
//! system: "PRD [Production]"
//! client: "300"
//! language: PT
//! username: RPA_USER
//! log_name: nightly_invoices
//! timings:
//!   launch_timeout_secs: 30
//!   poll_interval_ms: 1000
//!   session_wait_ms: 3000
//!   login_settle_ms: 1000
//! max_dialog_sweeps: 50
//! ```
//!
//! The password is never read from this file.

use anyhow::{Context, Result};
use sapdriver::{AutomatorConfig, Credentials, Timings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub executable: PathBuf,
    pub system: String,
    pub client: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub username: String,
    #[serde(default = "default_log_name")]
    pub log_name: String,
    #[serde(default)]
    pub timings: FileTimings,
    #[serde(default = "default_max_dialog_sweeps")]
    pub max_dialog_sweeps: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileTimings {
    pub launch_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub session_wait_ms: u64,
    pub login_settle_ms: u64,
}

impl Default for FileTimings {
    fn default() -> Self {
        let defaults = Timings::default();
        Self {
            launch_timeout_secs: defaults.launch_timeout.as_secs(),
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
            session_wait_ms: defaults.session_wait.as_millis() as u64,
            login_settle_ms: defaults.login_settle.as_millis() as u64,
        }
    }
}

impl From<FileTimings> for Timings {
    fn from(value: FileTimings) -> Self {
        Timings {
            launch_timeout: Duration::from_secs(value.launch_timeout_secs),
            poll_interval: Duration::from_millis(value.poll_interval_ms),
            session_wait: Duration::from_millis(value.session_wait_ms),
            login_settle: Duration::from_millis(value.login_settle_ms),
        }
    }
}

fn default_language() -> String {
    "EN".to_string()
}

fn default_log_name() -> String {
    "sapdriver".to_string()
}

fn default_max_dialog_sweeps() -> usize {
    sapdriver::config::DEFAULT_MAX_DIALOG_SWEEPS
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: FileConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn automator_config(&self) -> AutomatorConfig {
        AutomatorConfig::new(&self.executable, &self.system)
            .with_timings(self.timings.into())
            .with_max_dialog_sweeps(self.max_dialog_sweeps)
    }

    pub fn credentials(&self, password: &str) -> Credentials {
        Credentials::new(&self.client, &self.language, &self.username, password)
    }
}

/// Command line and environment values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub system: Option<String>,
    pub client: Option<String>,
    pub username: Option<String>,
    pub language: Option<String>,
}

impl Overrides {
    pub fn apply(&self, mut config: FileConfig) -> FileConfig {
        if let Some(system) = &self.system {
            config.system = system.clone();
        }
        if let Some(client) = &self.client {
            config.client = client.clone();
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
executable: 'C:\SAP\saplogon.exe'
system: "QAS [Quality]"
client: "200"
username: RPA_USER
"#;

    #[test]
    fn minimal_file_gets_defaults() {
        let config = FileConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.language, "EN");
        assert_eq!(config.log_name, "sapdriver");
        assert_eq!(config.timings, FileTimings::default());
        assert_eq!(config.max_dialog_sweeps, 50);

        let automator = config.automator_config();
        assert_eq!(automator.system_name, "QAS [Quality]");
        assert_eq!(automator.timings, Timings::default());
    }

    #[test]
    fn timings_override_partially() {
        let content = format!("{MINIMAL}timings:\n  session_wait_ms: 5000\n");
        let config = FileConfig::parse(&content).unwrap();
        let timings: Timings = config.timings.into();
        assert_eq!(timings.session_wait, Duration::from_secs(5));
        assert_eq!(timings.launch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn password_key_is_rejected() {
        let content = format!("{MINIMAL}password: hunter2\n");
        assert!(FileConfig::parse(&content).is_err());
    }

    #[test]
    fn overrides_win_over_file() {
        let config = FileConfig::parse(MINIMAL).unwrap();
        let overrides = Overrides {
            client: Some("300".to_string()),
            language: Some("PT".to_string()),
            ..Overrides::default()
        };
        let config = overrides.apply(config);
        assert_eq!(config.client, "300");
        assert_eq!(config.language, "PT");
        assert_eq!(config.username, "RPA_USER");
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.client, "200");

        let err = FileConfig::load(Path::new("does/not/exist.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

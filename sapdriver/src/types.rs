//! Value types shared by the login pipeline

use serde::Serialize;
use std::fmt;
use zeroize::Zeroizing;

/// Logon credentials. Immutable once built; the secret is wiped from memory
/// on drop and is masked in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    client: String,
    language: String,
    username: String,
    secret: Zeroizing<String>,
}

impl Credentials {
    pub fn new(
        client: impl Into<String>,
        language: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            client: client.into(),
            language: language.into(),
            username: username.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Only the login screen writer should ever call this.
    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client", &self.client)
            .field("language", &self.language)
            .field("username", &self.username)
            .field("secret", &"********")
            .finish()
    }
}

/// Classification of the status line after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusOutcome {
    Ok,
    Error,
    Abort,
    Exit,
}

impl StatusOutcome {
    /// Maps the status bar message type (`S`, `W`, `I`, `E`, `A`, `X` or empty).
    /// Anything that is not an error, abort or exit counts as `Ok`.
    pub fn from_message_type(message_type: &str) -> Self {
        match message_type.trim().to_ascii_lowercase().as_str() {
            "e" => StatusOutcome::Error,
            "a" => StatusOutcome::Abort,
            "x" => StatusOutcome::Exit,
            _ => StatusOutcome::Ok,
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, StatusOutcome::Ok)
    }
}

/// Snapshot of the main window status bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub message_type: String,
    pub text: String,
    pub outcome: StatusOutcome,
}

impl StatusLine {
    pub fn new(message_type: impl Into<String>, text: impl Into<String>) -> Self {
        let message_type = message_type.into();
        let outcome = StatusOutcome::from_message_type(&message_type);
        Self {
            message_type,
            text: text.into(),
            outcome,
        }
    }
}

/// Where the automator is in the acquisition sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Uninitialized,
    EngineReady,
    Connected,
    Authenticated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_types_map_case_insensitively() {
        assert_eq!(StatusOutcome::from_message_type("E"), StatusOutcome::Error);
        assert_eq!(StatusOutcome::from_message_type("a"), StatusOutcome::Abort);
        assert_eq!(StatusOutcome::from_message_type("X"), StatusOutcome::Exit);
        assert_eq!(StatusOutcome::from_message_type("S"), StatusOutcome::Ok);
        assert_eq!(StatusOutcome::from_message_type("W"), StatusOutcome::Ok);
        assert_eq!(StatusOutcome::from_message_type(""), StatusOutcome::Ok);
        assert!(StatusOutcome::Abort.is_failure());
        assert!(!StatusOutcome::Ok.is_failure());
    }

    #[test]
    fn debug_masks_secret() {
        let creds = Credentials::new("300", "EN", "RPA_USER", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("RPA_USER"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(creds.secret(), "hunter2");
    }

    #[test]
    fn status_line_serializes_outcome() {
        let line = StatusLine::new("E", "Client 999 does not exist in the system");
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["outcome"], "error");
        assert_eq!(json["message_type"], "E");
    }
}

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::StatusOutcome;

/// A fault raised by the scripting boundary itself (COM call failure,
/// missing object, dead client process).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ScriptingError {
    pub message: String,
    pub hresult: Option<i32>,
}

impl ScriptingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hresult: None,
        }
    }

    pub fn with_hresult(message: impl Into<String>, hresult: i32) -> Self {
        Self {
            message: message.into(),
            hresult: Some(hresult),
        }
    }
}

/// How a failure should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The environment is not ready or refused us. Retrying later can help.
    Connectivity,
    /// The screen does not look the way the automation expects.
    /// Retrying blindly will fail the same way.
    StructuralMismatch,
}

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("executable not found: {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("failed to launch {}: {reason}", path.display())]
    LaunchFailed { path: PathBuf, reason: String },

    #[error("scripting engine unavailable after {waited:?}{}", last_error_suffix(.last_error))]
    EngineUnavailable {
        waited: Duration,
        last_error: Option<String>,
    },

    #[error("connection open failed for '{system}': {reason}")]
    ConnectionOpenFailed { system: String, reason: String },

    #[error("no session produced for connection '{system}'")]
    NoSessionProduced { system: String },

    #[error("no active session")]
    NotConnected,

    #[error("login screen not detected: {reason}")]
    LoginScreenNotDetected { reason: String },

    #[error("login rejected ({outcome:?}): {status}")]
    LoginRejected {
        outcome: StatusOutcome,
        status: String,
    },

    #[error("UI element not found: {id}: {reason}")]
    ElementNotFound { id: String, reason: String },

    #[error("scripting call '{operation}' failed: {source}")]
    Scripting {
        operation: String,
        #[source]
        source: ScriptingError,
    },
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

impl AutomationError {
    pub fn scripting(operation: impl Into<String>, source: ScriptingError) -> Self {
        Self::Scripting {
            operation: operation.into(),
            source,
        }
    }

    pub fn element_not_found(id: impl Into<String>, source: &ScriptingError) -> Self {
        Self::ElementNotFound {
            id: id.into(),
            reason: source.message.clone(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            AutomationError::ElementNotFound { .. } => FailureKind::StructuralMismatch,
            AutomationError::ExecutableNotFound { .. }
            | AutomationError::LaunchFailed { .. }
            | AutomationError::EngineUnavailable { .. }
            | AutomationError::ConnectionOpenFailed { .. }
            | AutomationError::NoSessionProduced { .. }
            | AutomationError::NotConnected
            | AutomationError::LoginScreenNotDetected { .. }
            | AutomationError::LoginRejected { .. }
            | AutomationError::Scripting { .. } => FailureKind::Connectivity,
        }
    }

    /// Structural mismatches point at a different screen version; retrying
    /// them is pointless.
    pub fn is_retryable(&self) -> bool {
        self.kind() == FailureKind::Connectivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_not_found_is_the_only_structural_mismatch() {
        let structural = AutomationError::element_not_found(
            "wnd[0]/usr/txtRSYST-BNAME",
            &ScriptingError::new("The control could not be found by id."),
        );
        assert_eq!(structural.kind(), FailureKind::StructuralMismatch);
        assert!(!structural.is_retryable());

        let rejected = AutomationError::LoginRejected {
            outcome: StatusOutcome::Error,
            status: "Name or password is incorrect".to_string(),
        };
        assert_eq!(rejected.kind(), FailureKind::Connectivity);
        assert!(rejected.is_retryable());

        let not_detected = AutomationError::LoginScreenNotDetected {
            reason: "field missing".to_string(),
        };
        assert_eq!(not_detected.kind(), FailureKind::Connectivity);
    }

    #[test]
    fn scripting_error_keeps_source_text() {
        let err = AutomationError::scripting(
            "OpenConnection",
            ScriptingError::with_hresult("RPC server unavailable", -2147023174),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("OpenConnection"));
        assert!(rendered.contains("RPC server unavailable"));
        assert_eq!(err.kind(), FailureKind::Connectivity);
    }

    #[test]
    fn engine_unavailable_mentions_last_error_when_known() {
        let err = AutomationError::EngineUnavailable {
            waited: Duration::from_secs(30),
            last_error: Some("Operation unavailable".to_string()),
        };
        assert!(err.to_string().contains("last error: Operation unavailable"));

        let err = AutomationError::EngineUnavailable {
            waited: Duration::ZERO,
            last_error: None,
        };
        assert_eq!(err.to_string(), "scripting engine unavailable after 0ns");
    }
}

use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::addresses::{
    CLIENT_FIELD, LANGUAGE_FIELD, LOGON_BUTTON, PASSWORD_FIELD, STATUS_BAR, USERNAME_FIELD,
};
use crate::element::GuiElement;
use crate::errors::AutomationError;
use crate::platforms::Session;
use crate::types::{Credentials, StatusLine};

/// Fill the logon screen, submit, and judge the status bar.
///
/// A missing client field means we are not looking at the logon screen at
/// all; every other missing element means the screen layout differs from
/// what we expect.
#[instrument(level = "debug", skip(session, credentials), fields(client = %credentials.client(), user = %credentials.username()))]
pub fn submit_credentials(
    session: &dyn Session,
    credentials: &Credentials,
    settle: Duration,
) -> Result<StatusLine, AutomationError> {
    let client_field = session.find_by_id(CLIENT_FIELD).map_err(|e| {
        warn!("Logon screen not detected, client field missing: {}", e);
        AutomationError::LoginScreenNotDetected { reason: e.message }
    })?;

    info!(
        "Logging on to client {} as {}",
        credentials.client(),
        credentials.username()
    );
    write_field(&client_field, CLIENT_FIELD, credentials.client())?;
    write_field(
        &locate(session, USERNAME_FIELD)?,
        USERNAME_FIELD,
        credentials.username(),
    )?;
    write_field(
        &locate(session, PASSWORD_FIELD)?,
        PASSWORD_FIELD,
        credentials.secret(),
    )?;
    write_field(
        &locate(session, LANGUAGE_FIELD)?,
        LANGUAGE_FIELD,
        credentials.language(),
    )?;
    locate(session, LOGON_BUTTON)?
        .press()
        .map_err(|e| AutomationError::scripting("press", e))?;

    std::thread::sleep(settle);

    let status = read_status_line(session)?;
    if status.outcome.is_failure() {
        error!(
            outcome = ?status.outcome,
            "Logon rejected, status bar reads: {}", status.text
        );
        return Err(AutomationError::LoginRejected {
            outcome: status.outcome,
            status: status.text,
        });
    }

    info!("Logon accepted");
    Ok(status)
}

/// Read the main window status bar.
pub fn read_status_line(session: &dyn Session) -> Result<StatusLine, AutomationError> {
    let status_bar = locate(session, STATUS_BAR)?;
    let message_type = status_bar
        .message_type()
        .map_err(|e| AutomationError::scripting("MessageType", e))?;
    let text = status_bar
        .text()
        .map_err(|e| AutomationError::scripting("Text", e))?;
    Ok(StatusLine::new(message_type, text))
}

fn locate(session: &dyn Session, id: &str) -> Result<GuiElement, AutomationError> {
    session.find_by_id(id).map_err(|e| {
        error!("Element {} not found on logon screen: {}", id, e);
        AutomationError::element_not_found(id, &e)
    })
}

fn write_field(element: &GuiElement, id: &str, value: &str) -> Result<(), AutomationError> {
    element
        .set_text(value)
        .map_err(|e| AutomationError::scripting(format!("set text of {id}"), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::testing::FakeSession;
    use crate::types::StatusOutcome;

    const SETTLE: Duration = Duration::from_millis(1);

    fn creds() -> Credentials {
        Credentials::new("300", "PT", "RPA_USER", "s3cr3t")
    }

    #[test]
    fn fills_fields_in_order_and_presses_logon() {
        let session = FakeSession::logon_screen();
        let status = submit_credentials(&session, &creds(), SETTLE).unwrap();
        assert_eq!(status.outcome, StatusOutcome::Ok);
        assert_eq!(
            session.writes(),
            vec![
                (CLIENT_FIELD.to_string(), "300".to_string()),
                (USERNAME_FIELD.to_string(), "RPA_USER".to_string()),
                (PASSWORD_FIELD.to_string(), "s3cr3t".to_string()),
                (LANGUAGE_FIELD.to_string(), "PT".to_string()),
            ]
        );
        assert_eq!(session.presses(), vec![LOGON_BUTTON.to_string()]);
    }

    #[test]
    fn error_status_is_rejected_with_verbatim_text() {
        let session = FakeSession::logon_screen()
            .with_status_after_logon("E", "Name or password is incorrect (repeat logon)");
        let err = submit_credentials(&session, &creds(), SETTLE).unwrap_err();
        match &err {
            AutomationError::LoginRejected { outcome, status } => {
                assert_eq!(*outcome, StatusOutcome::Error);
                assert_eq!(status, "Name or password is incorrect (repeat logon)");
            }
            other => panic!("expected LoginRejected, got {other:?}"),
        }
        assert!(err
            .to_string()
            .contains("Name or password is incorrect (repeat logon)"));
        assert_eq!(err.kind(), FailureKind::Connectivity);
    }

    #[test]
    fn abort_and_exit_are_rejections_warnings_are_not() {
        for (kind, expected) in [("A", StatusOutcome::Abort), ("x", StatusOutcome::Exit)] {
            let session = FakeSession::logon_screen().with_status_after_logon(kind, "gone");
            match submit_credentials(&session, &creds(), SETTLE) {
                Err(AutomationError::LoginRejected { outcome, .. }) => assert_eq!(outcome, expected),
                other => panic!("expected rejection for {kind}, got {other:?}"),
            }
        }

        let session =
            FakeSession::logon_screen().with_status_after_logon("W", "Password expires in 3 days");
        let status = submit_credentials(&session, &creds(), SETTLE).unwrap();
        assert_eq!(status.text, "Password expires in 3 days");
    }

    #[test]
    fn missing_client_field_means_wrong_screen_and_writes_nothing() {
        let session = FakeSession::logon_screen().without_element(CLIENT_FIELD);
        let err = submit_credentials(&session, &creds(), SETTLE).unwrap_err();
        assert!(matches!(err, AutomationError::LoginScreenNotDetected { .. }));
        assert!(session.writes().is_empty());
        assert!(session.presses().is_empty());
    }

    #[test]
    fn other_missing_field_is_a_structural_mismatch() {
        let session = FakeSession::logon_screen().without_element(LANGUAGE_FIELD);
        let err = submit_credentials(&session, &creds(), SETTLE).unwrap_err();
        match &err {
            AutomationError::ElementNotFound { id, .. } => assert_eq!(id, LANGUAGE_FIELD),
            other => panic!("expected ElementNotFound, got {other:?}"),
        }
        assert_eq!(err.kind(), FailureKind::StructuralMismatch);
        assert!(!err.is_retryable());
        // client, user and password were written before the lookup failed
        assert_eq!(session.writes().len(), 3);
        assert!(session.presses().is_empty());
    }

    #[test]
    fn write_fault_is_a_scripting_error_not_a_mismatch() {
        let session = FakeSession::logon_screen().with_write_fault(USERNAME_FIELD, "control is read-only");
        let err = submit_credentials(&session, &creds(), SETTLE).unwrap_err();
        assert!(matches!(err, AutomationError::Scripting { .. }));
        assert_eq!(err.kind(), FailureKind::Connectivity);
    }
}

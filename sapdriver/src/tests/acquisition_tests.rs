use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing_test::traced_test;

use crate::addresses::{MAIN_WINDOW, PASSWORD_FIELD};
use crate::testing::{FakeConnection, FakeEngine, FakeHost, FakeSession};
use crate::{
    AutomationError, Automator, AutomatorConfig, Credentials, FailureKind, SessionState, Timings,
};

const SECRET: &str = "Tr0ub4dor&3";

fn config() -> AutomatorConfig {
    AutomatorConfig::new(r"C:\SAP\FrontEnd\SAPgui\saplogon.exe", "PRD [Production]")
        .with_timings(Timings {
            launch_timeout: Duration::from_millis(150),
            poll_interval: Duration::from_millis(10),
            session_wait: Duration::from_millis(20),
            login_settle: Duration::from_millis(1),
        })
}

fn credentials() -> Credentials {
    Credentials::new("300", "PT", "RPA_BOT", SECRET)
}

fn automator_for(connection: Rc<FakeConnection>) -> (Rc<FakeHost>, Automator) {
    let host = Rc::new(FakeHost::ready_with(FakeEngine::with_connection(connection)));
    let automator = Automator::new(host.clone(), config(), credentials()).unwrap();
    (host, automator)
}

#[test]
fn delayed_session_then_logon_then_dialogs_then_close() {
    let session = FakeSession::logon_screen().with_modal_for(2);
    let connection = Rc::new(FakeConnection::with_session_counts(&[0, 1]).with_session(session));
    let (_host, mut automator) = automator_for(connection.clone());

    automator.initialize_connection(true).unwrap();
    assert_eq!(automator.state(), SessionState::Authenticated);
    assert_eq!(connection.count_checks(), 2);

    assert!(automator.drain_dialogs());
    assert!(!automator.drain_dialogs());

    let session = connection.session_double();
    assert_eq!(session.vkeys_sent(), 2);

    automator.close_connection();
    assert_eq!(session.closed(), vec![MAIN_WINDOW.to_string()]);
    assert_eq!(connection.close_calls(), 1);
    assert!(automator.get_session().is_none());
}

#[test]
fn status_line_is_readable_after_logon() {
    let session = FakeSession::logon_screen()
        .with_status_after_logon("W", "Your password will expire in 5 days");
    let connection = Rc::new(FakeConnection::with_session_counts(&[1]).with_session(session));
    let (_host, mut automator) = automator_for(connection);

    automator.initialize_connection(true).unwrap();
    let status = automator.status_line().unwrap();
    assert_eq!(status.message_type, "W");
    assert_eq!(status.text, "Your password will expire in 5 days");
}

#[test]
fn engine_never_ready_collapses_state_after_timeout() {
    let host = Rc::new(FakeHost::never_ready());
    let mut automator = Automator::new(host.clone(), config(), credentials()).unwrap();

    let start = Instant::now();
    let err = automator.initialize_connection(true).unwrap_err();
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert!(matches!(err, AutomationError::EngineUnavailable { .. }));
    assert!(err.is_retryable());
    assert_eq!(automator.state(), SessionState::Uninitialized);
    assert!(host.attach_attempts() > 1);
    assert_eq!(host.engine().open_calls(), 0);
}

#[test]
fn missing_client_field_reports_wrong_screen() {
    let session = FakeSession::logon_screen().without_element(crate::addresses::CLIENT_FIELD);
    let connection = Rc::new(FakeConnection::with_session_counts(&[1]).with_session(session));
    let (_host, mut automator) = automator_for(connection.clone());

    let err = automator.initialize_connection(true).unwrap_err();
    assert!(matches!(err, AutomationError::LoginScreenNotDetected { .. }));
    assert_eq!(err.kind(), FailureKind::Connectivity);
    assert!(connection.session_double().writes().is_empty());
    assert!(automator.get_session().is_none());
}

#[test]
fn rejected_logon_can_be_retried_from_scratch() {
    let session =
        FakeSession::logon_screen().with_status_after_logon("E", "Name or password is incorrect");
    let connection = Rc::new(FakeConnection::with_session_counts(&[1]).with_session(session));
    let (host, mut automator) = automator_for(connection);

    assert!(automator.initialize_connection(true).is_err());
    assert!(automator.initialize_connection(true).is_err());
    assert_eq!(host.launches(), 2);
    assert_eq!(automator.state(), SessionState::Uninitialized);
}

#[test]
#[traced_test]
fn secret_never_reaches_the_log_sink() {
    let session = FakeSession::logon_screen()
        .with_status_after_logon("E", "Name or password is incorrect")
        .with_write_fault(PASSWORD_FIELD, "field is protected");
    let connection = Rc::new(FakeConnection::with_session_counts(&[0, 1]).with_session(session));

    let (_host, mut automator) = automator_for(connection);
    let result = automator.initialize_connection(true).map(|_| ());
    tracing::debug!(?automator, "after initialize");

    assert!(result.is_err());
    assert!(logs_contain("RPA_BOT"));
    assert!(logs_contain("field is protected"));
    assert!(!logs_contain(SECRET));
}

#[test]
#[traced_test]
fn successful_logon_logs_transitions_without_secret() {
    let connection = Rc::new(FakeConnection::with_session_counts(&[1]));
    let (_host, mut automator) = automator_for(connection.clone());
    let result = automator.initialize_connection(true).map(|_| ());

    assert!(result.is_ok());
    assert!(logs_contain("Scripting engine available"));
    assert!(logs_contain("Logon accepted"));
    assert!(!logs_contain(SECRET));
    // the password did reach the password field
    assert!(connection
        .session_double()
        .writes()
        .iter()
        .any(|(id, value)| id == PASSWORD_FIELD && value == SECRET));
}

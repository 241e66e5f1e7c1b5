use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

use crate::errors::AutomationError;
use crate::platforms::{EngineHandle, ScriptingHost};

/// Launch the client and poll for its scripting engine until `timeout`
/// elapses. Lookup failures while polling mean "not ready yet".
#[instrument(level = "debug", skip(host))]
pub fn launch_and_wait(
    host: &dyn ScriptingHost,
    executable: &Path,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<EngineHandle, AutomationError> {
    info!("Launching SAP Logon from {}", executable.display());
    if let Err(e) = host.launch(executable) {
        error!("Failed to launch {}: {}", executable.display(), e);
        return Err(if e.kind() == ErrorKind::NotFound {
            AutomationError::ExecutableNotFound {
                path: executable.to_path_buf(),
            }
        } else {
            AutomationError::LaunchFailed {
                path: executable.to_path_buf(),
                reason: e.to_string(),
            }
        });
    }

    wait_for_engine(host, timeout, poll_interval)
}

/// Poll without launching anything.
pub fn wait_for_engine(
    host: &dyn ScriptingHost,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<EngineHandle, AutomationError> {
    let start_time = Instant::now();
    let mut attempts = 0u32;
    let mut last_error = None;

    while start_time.elapsed() < timeout {
        attempts += 1;
        match host.attach() {
            Ok(engine) => {
                info!(
                    attempts,
                    "Scripting engine available after {:?}",
                    start_time.elapsed()
                );
                return Ok(engine);
            }
            Err(e) => {
                debug!(attempts, "Scripting engine not ready yet: {}", e);
                last_error = Some(e.message);
                std::thread::sleep(poll_interval);
            }
        }
    }

    error!(
        attempts,
        "Scripting engine did not become available within {:?}", timeout
    );
    Err(AutomationError::EngineUnavailable {
        waited: start_time.elapsed(),
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    const POLL: Duration = Duration::from_millis(20);

    #[test]
    fn missing_executable_fails_without_polling() {
        let host = FakeHost::missing_executable();
        let err = launch_and_wait(&host, Path::new("C:/nope/saplogon.exe"), POLL * 10, POLL)
            .unwrap_err();
        assert!(matches!(err, AutomationError::ExecutableNotFound { .. }));
        assert_eq!(host.attach_attempts(), 0);
    }

    #[test]
    fn unstartable_executable_is_a_launch_failure() {
        let host = FakeHost::unstartable("access is denied");
        let err = launch_and_wait(&host, Path::new("saplogon.exe"), POLL * 10, POLL).unwrap_err();
        match err {
            AutomationError::LaunchFailed { reason, .. } => {
                assert!(reason.contains("access is denied"))
            }
            other => panic!("expected LaunchFailed, got {other:?}"),
        }
        assert_eq!(host.attach_attempts(), 0);
    }

    #[test]
    fn engine_found_after_a_few_attempts() {
        let host = FakeHost::ready_after(3);
        let engine = launch_and_wait(&host, Path::new("saplogon.exe"), POLL * 50, POLL);
        assert!(engine.is_ok());
        assert_eq!(host.launches(), 1);
        assert_eq!(host.attach_attempts(), 3);
    }

    #[test]
    fn never_ready_engine_times_out_no_earlier_than_timeout() {
        for timeout in [Duration::from_millis(100), Duration::from_millis(250)] {
            let host = FakeHost::never_ready();
            let start = Instant::now();
            let err = launch_and_wait(&host, Path::new("saplogon.exe"), timeout, POLL).unwrap_err();
            let elapsed = start.elapsed();

            assert!(elapsed >= timeout, "gave up early: {elapsed:?} < {timeout:?}");
            assert!(
                elapsed < timeout + POLL * 5,
                "overshot: {elapsed:?} for timeout {timeout:?}"
            );
            match err {
                AutomationError::EngineUnavailable { last_error, .. } => {
                    assert!(last_error.is_some())
                }
                other => panic!("expected EngineUnavailable, got {other:?}"),
            }
        }
    }
}

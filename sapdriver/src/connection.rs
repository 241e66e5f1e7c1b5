use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::errors::AutomationError;
use crate::platforms::{ConnectionHandle, ScriptingEngine, SessionHandle};

/// Open `system_name` synchronously and bind its first session.
///
/// A connection without sessions gets exactly one more look after
/// `session_wait`; sessions are often created a moment after the connection.
#[instrument(level = "debug", skip(engine))]
pub fn open_connection(
    engine: &dyn ScriptingEngine,
    system_name: &str,
    session_wait: Duration,
) -> Result<(ConnectionHandle, SessionHandle), AutomationError> {
    info!("Opening connection to {}", system_name);
    let connection = match engine.open_connection(system_name, true) {
        Ok(Some(connection)) => connection,
        Ok(None) => {
            error!("OpenConnection returned no object for {}", system_name);
            return Err(AutomationError::ConnectionOpenFailed {
                system: system_name.to_string(),
                reason: "connection object is null".to_string(),
            });
        }
        Err(e) => {
            error!("OpenConnection failed for {}: {}", system_name, e);
            return Err(AutomationError::ConnectionOpenFailed {
                system: system_name.to_string(),
                reason: e.message,
            });
        }
    };

    let session = match first_session(&*connection)? {
        Some(session) => {
            info!("Session acquired for {}", system_name);
            session
        }
        None => {
            warn!(
                "No session yet for {}, waiting {:?} before rechecking",
                system_name, session_wait
            );
            std::thread::sleep(session_wait);
            match first_session(&*connection)? {
                Some(session) => {
                    info!("Session acquired for {} after waiting", system_name);
                    session
                }
                None => {
                    error!("Connection {} produced no session", system_name);
                    return Err(AutomationError::NoSessionProduced {
                        system: system_name.to_string(),
                    });
                }
            }
        }
    };

    Ok((connection, session))
}

fn first_session(
    connection: &dyn crate::platforms::Connection,
) -> Result<Option<SessionHandle>, AutomationError> {
    let count = connection
        .session_count()
        .map_err(|e| AutomationError::scripting("Sessions.Count", e))?;
    if count == 0 {
        return Ok(None);
    }
    connection
        .session(0)
        .map(Some)
        .map_err(|e| AutomationError::scripting("Children(0)", e))
}

use std::rc::Rc;
use tracing::{error, info, instrument, warn};

use crate::addresses::MAIN_WINDOW;
use crate::config::{validate_credentials, AutomatorConfig, ConfigError};
use crate::connection::open_connection;
use crate::dialogs::drain_dialogs;
use crate::errors::AutomationError;
use crate::login::{read_status_line, submit_credentials};
use crate::platforms::{ConnectionHandle, EngineHandle, ScriptingHost, Session, SessionHandle};
use crate::readiness::launch_and_wait;
use crate::types::{Credentials, SessionState, StatusLine};

/// Drives one SAP GUI client from launch to a logged-on session.
///
/// The automator owns the engine, connection and session handles. Sessions
/// are only lent out by reference, so none can outlive
/// [`close_connection`](Automator::close_connection).
#[derive(Debug)]
pub struct Automator {
    host: Rc<dyn ScriptingHost>,
    config: AutomatorConfig,
    credentials: Credentials,
    state: SessionState,
    engine: Option<EngineHandle>,
    connection: Option<ConnectionHandle>,
    session: Option<SessionHandle>,
}

impl Automator {
    pub fn new(
        host: Rc<dyn ScriptingHost>,
        config: AutomatorConfig,
        credentials: Credentials,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_credentials(&credentials)?;
        info!(system = %config.system_name, "Automator created");
        Ok(Self {
            host,
            config,
            credentials,
            state: SessionState::Uninitialized,
            engine: None,
            connection: None,
            session: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &AutomatorConfig {
        &self.config
    }

    /// Launch (optionally), connect and log on.
    ///
    /// With `open_new_logon == false` the client is assumed to be running
    /// already. On any failure every handle is dropped and the state goes
    /// back to `Uninitialized` before the error is returned.
    #[instrument(skip(self), fields(system = %self.config.system_name))]
    pub fn initialize_connection(
        &mut self,
        open_new_logon: bool,
    ) -> Result<&dyn Session, AutomationError> {
        if self.state == SessionState::Authenticated {
            info!("Already logged on, closing the current connection first");
            self.close_connection();
        }

        if let Err(e) = self.acquire(open_new_logon) {
            error!(kind = ?e.kind(), "Failed to initialize SAP connection: {}", e);
            self.reset();
            return Err(e);
        }

        info!("SAP connection initialized");
        self.session
            .as_deref()
            .ok_or(AutomationError::NotConnected)
    }

    fn acquire(&mut self, open_new_logon: bool) -> Result<(), AutomationError> {
        let timings = self.config.timings;

        if open_new_logon {
            let engine = launch_and_wait(
                &*self.host,
                &self.config.executable,
                timings.launch_timeout,
                timings.poll_interval,
            )?;
            self.engine = Some(engine);
        } else if self.engine.is_none() {
            let engine = self.host.attach().map_err(|e| {
                warn!("No running SAP Logon to attach to: {}", e);
                AutomationError::EngineUnavailable {
                    waited: std::time::Duration::ZERO,
                    last_error: Some(e.message),
                }
            })?;
            self.engine = Some(engine);
        }
        self.state = SessionState::EngineReady;

        let engine = self.engine.clone().ok_or(AutomationError::NotConnected)?;
        let (connection, session) =
            open_connection(&*engine, &self.config.system_name, timings.session_wait)?;
        self.connection = Some(connection);
        self.session = Some(session);
        self.state = SessionState::Connected;

        let session = self.session.clone().ok_or(AutomationError::NotConnected)?;
        submit_credentials(&*session, &self.credentials, timings.login_settle)?;
        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// The logged-on session, if any.
    pub fn get_session(&self) -> Option<&dyn Session> {
        if self.session.is_none() {
            warn!("No SAP session: not initialized yet or the last attempt failed");
        }
        self.session.as_deref()
    }

    /// Confirm pending modal dialogs on the current session.
    pub fn drain_dialogs(&self) -> bool {
        match self.session.as_deref() {
            Some(session) => drain_dialogs(session, self.config.max_dialog_sweeps),
            None => {
                warn!("Cannot check for dialogs without a session");
                false
            }
        }
    }

    /// Current content of the main status bar.
    pub fn status_line(&self) -> Result<StatusLine, AutomationError> {
        let session = self.session.as_deref().ok_or(AutomationError::NotConnected)?;
        read_status_line(session)
    }

    /// Close the session window and the connection. Never fails; faults are
    /// logged. Session and connection handles are released in every case.
    #[instrument(skip(self), fields(system = %self.config.system_name))]
    pub fn close_connection(&mut self) {
        if let Some(session) = self.session.take() {
            info!("Closing SAP session window");
            match session.find_by_id(MAIN_WINDOW) {
                Ok(window) => {
                    if let Err(e) = window.close() {
                        error!("Failed to close session window: {}", e);
                    }
                }
                Err(e) => error!("Session window not reachable: {}", e),
            }
        }

        if let Some(connection) = self.connection.take() {
            info!("Closing SAP connection");
            if let Err(e) = connection.close() {
                error!("Failed to close connection: {}", e);
            }
        }

        self.state = if self.engine.is_some() {
            SessionState::EngineReady
        } else {
            SessionState::Uninitialized
        };
        info!("SAP connection closed");
    }

    fn reset(&mut self) {
        self.session = None;
        self.connection = None;
        self.engine = None;
        self.state = SessionState::Uninitialized;
    }
}

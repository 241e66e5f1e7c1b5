//! In-memory scripting doubles.
//!
//! They behave like a logon pad with one connection and one session, and
//! record every call so tests can assert on counts and order.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::rc::Rc;

use crate::addresses::{LOGON_BUTTON, MODAL_WINDOW, STATUS_BAR};
use crate::element::{GuiElement, GuiElementImpl};
use crate::errors::ScriptingError;
use crate::platforms::{
    Connection, ConnectionHandle, EngineHandle, ScriptingEngine, ScriptingHost, Session,
    SessionHandle,
};

#[derive(Debug, Clone)]
enum LaunchBehavior {
    Start,
    NotFound,
    Fail(String),
}

#[derive(Debug)]
pub struct FakeHost {
    launch: LaunchBehavior,
    /// Attach attempt (1-based) from which the engine is reachable.
    ready_after: Option<usize>,
    engine: Rc<FakeEngine>,
    launches: Cell<usize>,
    attach_attempts: Cell<usize>,
}

impl FakeHost {
    fn build(launch: LaunchBehavior, ready_after: Option<usize>, engine: FakeEngine) -> Self {
        Self {
            launch,
            ready_after,
            engine: Rc::new(engine),
            launches: Cell::new(0),
            attach_attempts: Cell::new(0),
        }
    }

    pub fn ready_with(engine: FakeEngine) -> Self {
        Self::build(LaunchBehavior::Start, Some(1), engine)
    }

    pub fn ready_after(attempts: usize) -> Self {
        Self::build(LaunchBehavior::Start, Some(attempts), FakeEngine::default())
    }

    pub fn never_ready() -> Self {
        Self::build(LaunchBehavior::Start, None, FakeEngine::default())
    }

    pub fn missing_executable() -> Self {
        Self::build(LaunchBehavior::NotFound, Some(1), FakeEngine::default())
    }

    pub fn unstartable(reason: &str) -> Self {
        Self::build(
            LaunchBehavior::Fail(reason.to_string()),
            Some(1),
            FakeEngine::default(),
        )
    }

    pub fn launches(&self) -> usize {
        self.launches.get()
    }

    pub fn attach_attempts(&self) -> usize {
        self.attach_attempts.get()
    }

    pub fn engine(&self) -> &FakeEngine {
        &self.engine
    }
}

impl ScriptingHost for FakeHost {
    fn launch(&self, executable: &Path) -> io::Result<()> {
        self.launches.set(self.launches.get() + 1);
        match &self.launch {
            LaunchBehavior::Start => Ok(()),
            LaunchBehavior::NotFound => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", executable.display()),
            )),
            LaunchBehavior::Fail(reason) => Err(io::Error::other(reason.clone())),
        }
    }

    fn attach(&self) -> Result<EngineHandle, ScriptingError> {
        let attempt = self.attach_attempts.get() + 1;
        self.attach_attempts.set(attempt);
        match self.ready_after {
            Some(n) if attempt >= n => {
                let engine: EngineHandle = self.engine.clone();
                Ok(engine)
            }
            _ => Err(ScriptingError::with_hresult(
                "Operation unavailable",
                0x800401E3u32 as i32,
            )),
        }
    }
}

#[derive(Debug, Clone)]
enum OpenBehavior {
    Return,
    Null,
    Fail(String),
}

#[derive(Debug)]
pub struct FakeEngine {
    open: OpenBehavior,
    connection: Rc<FakeConnection>,
    open_calls: Cell<usize>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::with_connection(Rc::new(FakeConnection::with_session_counts(&[1])))
    }
}

impl FakeEngine {
    pub fn with_connection(connection: Rc<FakeConnection>) -> Self {
        Self {
            open: OpenBehavior::Return,
            connection,
            open_calls: Cell::new(0),
        }
    }

    pub fn null_connection() -> Self {
        Self {
            open: OpenBehavior::Null,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            open: OpenBehavior::Fail(message.to_string()),
            ..Self::default()
        }
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.get()
    }

    /// Session count checks made against the connection this engine hands out.
    pub fn session_count_checks(&self) -> usize {
        self.connection.count_checks()
    }
}

impl ScriptingEngine for FakeEngine {
    fn open_connection(
        &self,
        _description: &str,
        _synchronous: bool,
    ) -> Result<Option<ConnectionHandle>, ScriptingError> {
        self.open_calls.set(self.open_calls.get() + 1);
        match &self.open {
            OpenBehavior::Return => {
                let connection: ConnectionHandle = self.connection.clone();
                Ok(Some(connection))
            }
            OpenBehavior::Null => Ok(None),
            OpenBehavior::Fail(message) => Err(ScriptingError::new(message.clone())),
        }
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    /// Answers to successive `session_count` calls; the last one repeats.
    counts: Vec<usize>,
    session: FakeSession,
    close_fault: Option<String>,
    count_checks: Cell<usize>,
    bound: RefCell<Vec<usize>>,
    close_calls: Cell<usize>,
}

impl FakeConnection {
    pub fn with_session_counts(counts: &[usize]) -> Self {
        Self {
            counts: counts.to_vec(),
            session: FakeSession::logon_screen(),
            close_fault: None,
            count_checks: Cell::new(0),
            bound: RefCell::new(Vec::new()),
            close_calls: Cell::new(0),
        }
    }

    pub fn with_session(mut self, session: FakeSession) -> Self {
        self.session = session;
        self
    }

    pub fn with_close_fault(mut self, message: &str) -> Self {
        self.close_fault = Some(message.to_string());
        self
    }

    pub fn session_double(&self) -> FakeSession {
        self.session.clone()
    }

    pub fn count_checks(&self) -> usize {
        self.count_checks.get()
    }

    pub fn bound_indices(&self) -> Vec<usize> {
        self.bound.borrow().clone()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.get()
    }
}

impl Connection for FakeConnection {
    fn session_count(&self) -> Result<usize, ScriptingError> {
        let check = self.count_checks.get();
        self.count_checks.set(check + 1);
        Ok(self
            .counts
            .get(check)
            .or(self.counts.last())
            .copied()
            .unwrap_or(0))
    }

    fn session(&self, index: usize) -> Result<SessionHandle, ScriptingError> {
        self.bound.borrow_mut().push(index);
        let session: SessionHandle = Rc::new(self.session.clone());
        Ok(session)
    }

    fn close(&self) -> Result<(), ScriptingError> {
        self.close_calls.set(self.close_calls.get() + 1);
        match &self.close_fault {
            Some(message) => Err(ScriptingError::new(message.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct Screen {
    missing: RefCell<HashSet<String>>,
    write_faults: RefCell<HashMap<String, String>>,
    values: RefCell<HashMap<String, String>>,
    writes: RefCell<Vec<(String, String)>>,
    presses: RefCell<Vec<String>>,
    /// (message type, text) currently shown in the status bar
    status: RefCell<(String, String)>,
    status_after_logon: RefCell<(String, String)>,
    modal_remaining: Cell<usize>,
    modal_checks: Cell<usize>,
    modal_fault_after: RefCell<Option<(usize, String)>>,
    vkeys: Cell<usize>,
    close_fault: RefCell<Option<String>>,
    closed: RefCell<Vec<String>>,
}

/// A session showing the logon screen. Clones share the same screen.
#[derive(Debug, Clone)]
pub struct FakeSession {
    screen: Rc<Screen>,
}

impl FakeSession {
    pub fn logon_screen() -> Self {
        let screen = Screen::default();
        *screen.status_after_logon.borrow_mut() = ("S".to_string(), String::new());
        Self {
            screen: Rc::new(screen),
        }
    }

    pub fn without_element(self, id: &str) -> Self {
        self.screen.missing.borrow_mut().insert(id.to_string());
        self
    }

    pub fn with_write_fault(self, id: &str, message: &str) -> Self {
        self.screen
            .write_faults
            .borrow_mut()
            .insert(id.to_string(), message.to_string());
        self
    }

    pub fn with_status(self, message_type: &str, text: &str) -> Self {
        *self.screen.status.borrow_mut() = (message_type.to_string(), text.to_string());
        self
    }

    pub fn with_status_after_logon(self, message_type: &str, text: &str) -> Self {
        *self.screen.status_after_logon.borrow_mut() =
            (message_type.to_string(), text.to_string());
        self
    }

    /// The modal is reported present for the next `checks` lookups.
    pub fn with_modal_for(self, checks: usize) -> Self {
        self.screen.modal_remaining.set(checks);
        self
    }

    /// Modal lookups fail once more than `checks` lookups have been made.
    pub fn with_modal_lookup_fault_after(self, checks: usize, message: &str) -> Self {
        *self.screen.modal_fault_after.borrow_mut() = Some((checks, message.to_string()));
        self
    }

    pub fn with_close_fault(self, message: &str) -> Self {
        *self.screen.close_fault.borrow_mut() = Some(message.to_string());
        self
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.screen.writes.borrow().clone()
    }

    pub fn presses(&self) -> Vec<String> {
        self.screen.presses.borrow().clone()
    }

    pub fn vkeys_sent(&self) -> usize {
        self.screen.vkeys.get()
    }

    pub fn closed(&self) -> Vec<String> {
        self.screen.closed.borrow().clone()
    }

    fn element(&self, id: &str) -> GuiElement {
        GuiElement::new(Box::new(FakeElement {
            screen: self.screen.clone(),
            id: id.to_string(),
        }))
    }

    fn check_modal(&self) -> Result<Option<GuiElement>, ScriptingError> {
        let check = self.screen.modal_checks.get() + 1;
        self.screen.modal_checks.set(check);
        if let Some((after, message)) = self.screen.modal_fault_after.borrow().as_ref() {
            if check > *after {
                return Err(ScriptingError::new(message.clone()));
            }
        }
        let remaining = self.screen.modal_remaining.get();
        if remaining == 0 {
            return Ok(None);
        }
        self.screen.modal_remaining.set(remaining - 1);
        Ok(Some(self.element(MODAL_WINDOW)))
    }
}

impl Session for FakeSession {
    fn find_by_id(&self, id: &str) -> Result<GuiElement, ScriptingError> {
        if self.screen.missing.borrow().contains(id) {
            return Err(ScriptingError::with_hresult(
                format!("The control could not be found by id: {id}"),
                0x80004005u32 as i32,
            ));
        }
        Ok(self.element(id))
    }

    fn try_find_by_id(&self, id: &str) -> Result<Option<GuiElement>, ScriptingError> {
        if id == MODAL_WINDOW {
            return self.check_modal();
        }
        if self.screen.missing.borrow().contains(id) {
            return Ok(None);
        }
        Ok(Some(self.element(id)))
    }
}

#[derive(Debug)]
struct FakeElement {
    screen: Rc<Screen>,
    id: String,
}

impl GuiElementImpl for FakeElement {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn text(&self) -> Result<String, ScriptingError> {
        if self.id == STATUS_BAR {
            return Ok(self.screen.status.borrow().1.clone());
        }
        Ok(self
            .screen
            .values
            .borrow()
            .get(&self.id)
            .cloned()
            .unwrap_or_default())
    }

    fn set_text(&self, value: &str) -> Result<(), ScriptingError> {
        if let Some(message) = self.screen.write_faults.borrow().get(&self.id) {
            return Err(ScriptingError::new(message.clone()));
        }
        self.screen
            .writes
            .borrow_mut()
            .push((self.id.clone(), value.to_string()));
        self.screen
            .values
            .borrow_mut()
            .insert(self.id.clone(), value.to_string());
        Ok(())
    }

    fn press(&self) -> Result<(), ScriptingError> {
        self.screen.presses.borrow_mut().push(self.id.clone());
        if self.id == LOGON_BUTTON {
            let next = self.screen.status_after_logon.borrow().clone();
            *self.screen.status.borrow_mut() = next;
        }
        Ok(())
    }

    fn send_vkey(&self, _key: u32) -> Result<(), ScriptingError> {
        self.screen.vkeys.set(self.screen.vkeys.get() + 1);
        Ok(())
    }

    fn close(&self) -> Result<(), ScriptingError> {
        if let Some(message) = self.screen.close_fault.borrow().as_ref() {
            return Err(ScriptingError::new(message.clone()));
        }
        self.screen.closed.borrow_mut().push(self.id.clone());
        Ok(())
    }

    fn message_type(&self) -> Result<String, ScriptingError> {
        if self.id == STATUS_BAR {
            return Ok(self.screen.status.borrow().0.clone());
        }
        Ok(String::new())
    }
}

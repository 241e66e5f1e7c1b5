use std::fmt::Debug;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::rc::Rc;

use crate::element::GuiElement;
use crate::errors::ScriptingError;

pub type EngineHandle = Rc<dyn ScriptingEngine>;
pub type ConnectionHandle = Rc<dyn Connection>;
pub type SessionHandle = Rc<dyn Session>;

/// Process boundary plus engine lookup. One host drives one client instance.
pub trait ScriptingHost: Debug {
    /// Start the client executable. No arguments are passed and the child is
    /// neither awaited nor owned.
    fn launch(&self, executable: &Path) -> io::Result<()> {
        Command::new(executable)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }

    /// Single attempt to get hold of the scripting engine.
    fn attach(&self) -> Result<EngineHandle, ScriptingError>;
}

/// The application object of the scripting API
pub trait ScriptingEngine: Debug {
    /// Open the connection listed under `description` in the logon pad.
    /// `Ok(None)` means the call returned a null object.
    fn open_connection(
        &self,
        description: &str,
        synchronous: bool,
    ) -> Result<Option<ConnectionHandle>, ScriptingError>;
}

pub trait Connection: Debug {
    /// Number of sessions currently materialized under this connection
    fn session_count(&self) -> Result<usize, ScriptingError>;

    fn session(&self, index: usize) -> Result<SessionHandle, ScriptingError>;

    fn close(&self) -> Result<(), ScriptingError>;
}

pub trait Session: Debug {
    /// Resolve an element by id. Missing elements are an error.
    fn find_by_id(&self, id: &str) -> Result<GuiElement, ScriptingError>;

    /// Resolve an element by id, returning `None` when it is not present.
    /// Errors only when the lookup itself fails.
    fn try_find_by_id(&self, id: &str) -> Result<Option<GuiElement>, ScriptingError>;
}

#[cfg(target_os = "windows")]
pub mod windows;

/// Create the scripting host for the current platform
pub fn create_host() -> Result<Rc<dyn ScriptingHost>, ScriptingError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Rc::new(windows::WindowsScriptingHost::new()?))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(ScriptingError::new(
            "SAP GUI scripting is only available on Windows",
        ))
    }
}

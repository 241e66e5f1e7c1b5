//! SAP GUI Scripting over COM.
//!
//! The logon pad registers its scripting object in the running object table
//! as `SAPGUI`. It is reached through the `SapROTWr.SapROTWrapper` helper
//! that ships with SAP GUI, then everything else is late-bound `IDispatch`.

mod dispatch;

use std::rc::Rc;
use tracing::debug;
use windows::core::{BSTR, HRESULT, HSTRING, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    CLSIDFromProgID, CoCreateInstance, CoInitializeEx, IDispatch, CLSCTX_ALL,
    COINIT_APARTMENTTHREADED,
};

use self::dispatch::Dispatch;
use crate::addresses::SCRIPTING_OBJECT;
use crate::element::{GuiElement, GuiElementImpl};
use crate::errors::ScriptingError;
use crate::platforms::{
    Connection, ConnectionHandle, EngineHandle, ScriptingEngine, ScriptingHost, Session,
    SessionHandle,
};

const ROT_WRAPPER_PROG_ID: &str = "SapROTWr.SapROTWrapper";
const RPC_E_CHANGED_MODE: HRESULT = HRESULT(0x80010106u32 as i32);

fn com_error(context: &str, e: windows::core::Error) -> ScriptingError {
    ScriptingError::with_hresult(format!("{context}: {e}"), e.code().0)
}

#[derive(Debug)]
pub struct WindowsScriptingHost {
    _private: (),
}

impl WindowsScriptingHost {
    /// Initializes COM for the calling thread. All scripting calls must stay
    /// on this thread.
    pub fn new() -> Result<Self, ScriptingError> {
        unsafe {
            let hr = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
            if hr.is_err() && hr != RPC_E_CHANGED_MODE {
                return Err(ScriptingError::with_hresult(
                    format!("Failed to initialize COM: {hr}"),
                    hr.0,
                ));
            }
            if hr == RPC_E_CHANGED_MODE {
                debug!("COM already initialized in this thread with another model");
            }
        }
        Ok(Self { _private: () })
    }
}

impl ScriptingHost for WindowsScriptingHost {
    fn attach(&self) -> Result<EngineHandle, ScriptingError> {
        let wrapper: IDispatch = unsafe {
            let prog_id = HSTRING::from(ROT_WRAPPER_PROG_ID);
            let clsid = CLSIDFromProgID(PCWSTR(prog_id.as_ptr()))
                .map_err(|e| com_error(ROT_WRAPPER_PROG_ID, e))?;
            CoCreateInstance(&clsid, None, CLSCTX_ALL)
                .map_err(|e| com_error(ROT_WRAPPER_PROG_ID, e))?
        };
        let wrapper = Dispatch::new(wrapper);

        let entry = wrapper.call(
            "GetROTEntry",
            vec![VARIANT::from(BSTR::from(SCRIPTING_OBJECT))],
        )?;
        let gui_auto = Dispatch::from_variant(&entry).ok_or_else(|| {
            ScriptingError::new(format!("{SCRIPTING_OBJECT} is not registered yet"))
        })?;
        let application = gui_auto.get_object("GetScriptingEngine")?;

        let engine: EngineHandle = Rc::new(WindowsEngine { application });
        Ok(engine)
    }
}

#[derive(Debug)]
struct WindowsEngine {
    application: Dispatch,
}

impl ScriptingEngine for WindowsEngine {
    fn open_connection(
        &self,
        description: &str,
        synchronous: bool,
    ) -> Result<Option<ConnectionHandle>, ScriptingError> {
        let result = self.application.call(
            "OpenConnection",
            vec![
                VARIANT::from(BSTR::from(description)),
                VARIANT::from(synchronous),
            ],
        )?;
        Ok(Dispatch::from_variant(&result).map(|connection| {
            let handle: ConnectionHandle = Rc::new(WindowsConnection { connection });
            handle
        }))
    }
}

#[derive(Debug)]
struct WindowsConnection {
    connection: Dispatch,
}

impl Connection for WindowsConnection {
    fn session_count(&self) -> Result<usize, ScriptingError> {
        let count = self.connection.get_object("Sessions")?.get_i32("Count")?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn session(&self, index: usize) -> Result<SessionHandle, ScriptingError> {
        let index = i32::try_from(index)
            .map_err(|_| ScriptingError::new(format!("session index {index} out of range")))?;
        let result = self
            .connection
            .call("Children", vec![VARIANT::from(index)])?;
        let session = Dispatch::from_variant(&result)
            .ok_or_else(|| ScriptingError::new(format!("no session at index {index}")))?;
        let handle: SessionHandle = Rc::new(WindowsSession { session });
        Ok(handle)
    }

    fn close(&self) -> Result<(), ScriptingError> {
        self.connection.call("CloseConnection", Vec::new()).map(drop)
    }
}

#[derive(Debug)]
struct WindowsSession {
    session: Dispatch,
}

impl WindowsSession {
    fn find(&self, id: &str, raise: bool) -> Result<Option<GuiElement>, ScriptingError> {
        let result = self.session.call(
            "findById",
            vec![VARIANT::from(BSTR::from(id)), VARIANT::from(raise)],
        )?;
        Ok(Dispatch::from_variant(&result).map(|element| {
            GuiElement::new(Box::new(WindowsGuiElement {
                id: id.to_string(),
                element,
            }))
        }))
    }
}

impl Session for WindowsSession {
    fn find_by_id(&self, id: &str) -> Result<GuiElement, ScriptingError> {
        self.find(id, true)?
            .ok_or_else(|| ScriptingError::new(format!("findById returned nothing for {id}")))
    }

    fn try_find_by_id(&self, id: &str) -> Result<Option<GuiElement>, ScriptingError> {
        self.find(id, false)
    }
}

#[derive(Debug)]
struct WindowsGuiElement {
    id: String,
    element: Dispatch,
}

impl GuiElementImpl for WindowsGuiElement {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn text(&self) -> Result<String, ScriptingError> {
        self.element.get_string("Text")
    }

    fn set_text(&self, value: &str) -> Result<(), ScriptingError> {
        self.element.put_string("Text", value)
    }

    fn press(&self) -> Result<(), ScriptingError> {
        self.element.call("press", Vec::new()).map(drop)
    }

    fn send_vkey(&self, key: u32) -> Result<(), ScriptingError> {
        let key = i32::try_from(key)
            .map_err(|_| ScriptingError::new(format!("virtual key {key} out of range")))?;
        self.element
            .call("sendVKey", vec![VARIANT::from(key)])
            .map(drop)
    }

    fn close(&self) -> Result<(), ScriptingError> {
        self.element.call("close", Vec::new()).map(drop)
    }

    fn message_type(&self) -> Result<String, ScriptingError> {
        self.element.get_string("MessageType")
    }
}

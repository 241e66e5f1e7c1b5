use std::fmt::Debug;
use tracing::instrument;

use crate::errors::ScriptingError;

/// Platform side of a GUI element. Adapters implement this; callers work
/// with [`GuiElement`].
pub trait GuiElementImpl: Debug {
    /// Scripting id the element was resolved from.
    fn id(&self) -> String;
    fn text(&self) -> Result<String, ScriptingError>;
    fn set_text(&self, value: &str) -> Result<(), ScriptingError>;
    fn press(&self) -> Result<(), ScriptingError>;
    fn send_vkey(&self, key: u32) -> Result<(), ScriptingError>;
    fn close(&self) -> Result<(), ScriptingError>;
    /// Message type of a status bar (`S`, `W`, `I`, `E`, `A`, `X`, or empty).
    fn message_type(&self) -> Result<String, ScriptingError>;
}

/// A resolved UI element of a session
#[derive(Debug)]
pub struct GuiElement {
    inner: Box<dyn GuiElementImpl>,
}

impl GuiElement {
    /// Create a new element from a platform-specific implementation
    pub fn new(impl_: Box<dyn GuiElementImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub fn id(&self) -> String {
        self.inner.id()
    }

    pub fn text(&self) -> Result<String, ScriptingError> {
        self.inner.text()
    }

    /// Write a field value. The value is never recorded in spans since
    /// password fields go through here too.
    #[instrument(level = "debug", skip(self, value), fields(id = %self.inner.id()))]
    pub fn set_text(&self, value: &str) -> Result<(), ScriptingError> {
        self.inner.set_text(value)
    }

    #[instrument(level = "debug", skip(self), fields(id = %self.inner.id()))]
    pub fn press(&self) -> Result<(), ScriptingError> {
        self.inner.press()
    }

    #[instrument(level = "debug", skip(self), fields(id = %self.inner.id()))]
    pub fn send_vkey(&self, key: u32) -> Result<(), ScriptingError> {
        self.inner.send_vkey(key)
    }

    #[instrument(level = "debug", skip(self), fields(id = %self.inner.id()))]
    pub fn close(&self) -> Result<(), ScriptingError> {
        self.inner.close()
    }

    pub fn message_type(&self) -> Result<String, ScriptingError> {
        self.inner.message_type()
    }
}

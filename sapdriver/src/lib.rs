//! Unattended SAP GUI logon through the SAP GUI Scripting API
//!
//! The crate launches SAP Logon, waits for its scripting engine, opens a
//! named connection, fills the logon screen and hands back the resulting
//! session. Pop-up windows that block further scripting can be confirmed
//! with [`drain_dialogs`].
//!
//! ```no_run
//! use sapdriver::{platforms, Automator, AutomatorConfig, Credentials};
//!
//! let host = platforms::create_host()?;
//! let config = AutomatorConfig::new(r"C:\Program Files\SAP\FrontEnd\SAPgui\saplogon.exe", "PRD");
//! let credentials = Credentials::new("300", "EN", "RPA_USER", "secret");
//! let mut automator = Automator::new(host, config, credentials)?;
//!
//! automator.initialize_connection(true)?;
//! automator.drain_dialogs();
//! automator.close_connection();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Logging goes through `tracing`; install a subscriber to see it. The
//! password never appears in any event or span.

pub mod addresses;
pub mod automator;
pub mod config;
pub mod connection;
pub mod dialogs;
pub mod element;
pub mod errors;
pub mod login;
pub mod platforms;
pub mod readiness;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
#[cfg(test)]
mod tests;
pub mod types;

pub use automator::Automator;
pub use config::{AutomatorConfig, ConfigError, Timings};
pub use dialogs::drain_dialogs;
pub use element::{GuiElement, GuiElementImpl};
pub use errors::{AutomationError, FailureKind, ScriptingError};
pub use platforms::{Connection, ScriptingEngine, ScriptingHost, Session};
pub use types::{Credentials, SessionState, StatusLine, StatusOutcome};

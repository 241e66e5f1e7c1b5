//! Fixed element ids on the logon pad screens.
//!
//! Ids are scripting paths, not runtime search expressions: `wnd[N]` is the
//! N-th window of the session, `usr` the user area, and the last segment is
//! the control type prefix followed by the field name.

pub const MAIN_WINDOW: &str = "wnd[0]";
pub const MODAL_WINDOW: &str = "wnd[1]";

pub const CLIENT_FIELD: &str = "wnd[0]/usr/txtRSYST-MANDT";
pub const USERNAME_FIELD: &str = "wnd[0]/usr/txtRSYST-BNAME";
pub const PASSWORD_FIELD: &str = "wnd[0]/usr/pwdRSYST-BCODE";
pub const LANGUAGE_FIELD: &str = "wnd[0]/usr/txtRSYST-LANGU";
pub const LOGON_BUTTON: &str = "wnd[0]/tbar[0]/btn[0]";

pub const STATUS_BAR: &str = "wnd[0]/sbar";

/// Virtual key sent to confirm a modal (Enter).
pub const VKEY_ENTER: u32 = 0;

/// Registration name of the scripting object in the running object table.
pub const SCRIPTING_OBJECT: &str = "SAPGUI";

//! Late-bound calls on `IDispatch` objects of the scripting API.

use std::ptr;
use windows::core::{BSTR, GUID, HSTRING, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    IDispatch, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET, DISPATCH_PROPERTYPUT,
    DISPPARAMS, EXCEPINFO,
};
use windows::Win32::System::Ole::DISPID_PROPERTYPUT;

use crate::errors::ScriptingError;

const LOCALE_USER_DEFAULT: u32 = 0x0400;

#[derive(Clone)]
pub(crate) struct Dispatch(IDispatch);

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Dispatch")
    }
}

impl Dispatch {
    pub(crate) fn new(inner: IDispatch) -> Self {
        Self(inner)
    }

    /// Convert a call result into an object, `None` for empty or null.
    pub(crate) fn from_variant(value: &VARIANT) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        IDispatch::try_from(value).ok().map(Self)
    }

    fn dispid(&self, name: &str) -> Result<i32, ScriptingError> {
        let wide = HSTRING::from(name);
        let names = [PCWSTR(wide.as_ptr())];
        let mut id = 0i32;
        unsafe {
            self.0.GetIDsOfNames(
                &GUID::zeroed(),
                names.as_ptr(),
                1,
                LOCALE_USER_DEFAULT,
                &mut id,
            )
        }
        .map_err(|e| {
            ScriptingError::with_hresult(format!("unknown member '{name}': {e}"), e.code().0)
        })?;
        Ok(id)
    }

    fn invoke(
        &self,
        name: &str,
        flags: DISPATCH_FLAGS,
        args: Vec<VARIANT>,
    ) -> Result<VARIANT, ScriptingError> {
        let id = self.dispid(name)?;
        // IDispatch expects arguments right to left
        let mut args: Vec<VARIANT> = args.into_iter().rev().collect();
        let mut named = DISPID_PROPERTYPUT;
        let is_put = flags == DISPATCH_PROPERTYPUT;
        let params = DISPPARAMS {
            rgvarg: if args.is_empty() {
                ptr::null_mut()
            } else {
                args.as_mut_ptr()
            },
            rgdispidNamedArgs: if is_put {
                &mut named as *mut i32
            } else {
                ptr::null_mut()
            },
            cArgs: args.len() as u32,
            cNamedArgs: u32::from(is_put),
        };

        let mut result = VARIANT::default();
        let mut exception = EXCEPINFO::default();
        let mut arg_error = 0u32;
        unsafe {
            self.0.Invoke(
                id,
                &GUID::zeroed(),
                LOCALE_USER_DEFAULT,
                flags,
                &params,
                &mut result,
                &mut exception,
                &mut arg_error,
            )
        }
        .map_err(|e| {
            let description = exception.bstrDescription.to_string();
            let message = if description.is_empty() {
                format!("{name}: {e}")
            } else {
                format!("{name}: {description}")
            };
            ScriptingError::with_hresult(message, e.code().0)
        })?;
        Ok(result)
    }

    pub(crate) fn get(&self, name: &str) -> Result<VARIANT, ScriptingError> {
        self.invoke(name, DISPATCH_PROPERTYGET, Vec::new())
    }

    pub(crate) fn get_object(&self, name: &str) -> Result<Dispatch, ScriptingError> {
        let value = self.get(name)?;
        Self::from_variant(&value)
            .ok_or_else(|| ScriptingError::new(format!("{name} returned no object")))
    }

    pub(crate) fn get_string(&self, name: &str) -> Result<String, ScriptingError> {
        let value = self.get(name)?;
        if value.is_empty() {
            return Ok(String::new());
        }
        BSTR::try_from(&value)
            .map(|s| s.to_string())
            .map_err(|e| ScriptingError::with_hresult(format!("{name}: {e}"), e.code().0))
    }

    pub(crate) fn get_i32(&self, name: &str) -> Result<i32, ScriptingError> {
        let value = self.get(name)?;
        i32::try_from(&value)
            .map_err(|e| ScriptingError::with_hresult(format!("{name}: {e}"), e.code().0))
    }

    pub(crate) fn put_string(&self, name: &str, value: &str) -> Result<(), ScriptingError> {
        self.invoke(
            name,
            DISPATCH_PROPERTYPUT,
            vec![VARIANT::from(BSTR::from(value))],
        )
        .map(drop)
    }

    pub(crate) fn call(&self, name: &str, args: Vec<VARIANT>) -> Result<VARIANT, ScriptingError> {
        self.invoke(name, DISPATCH_METHOD | DISPATCH_PROPERTYGET, args)
    }
}

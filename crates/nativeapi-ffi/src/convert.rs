//! Result-to-boundary conversions shared by the exported functions.

use std::os::raw::c_char;

use nativeapi_core::{marshal, Error, ResourceId, Result};
use tracing::{debug, warn};

pub(crate) fn report<T>(operation: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err @ (Error::NotFound { .. } | Error::NoCurrentResource { .. })) => {
            debug!(operation, "{err}");
            None
        }
        Err(err) => {
            warn!(operation, "{err}");
            None
        }
    }
}

pub(crate) fn id_or_zero(operation: &'static str, result: Result<ResourceId>) -> i64 {
    report(operation, result).map_or(0, ResourceId::get)
}

pub(crate) fn succeeded(operation: &'static str, result: Result<()>) -> bool {
    report(operation, result).is_some()
}

pub(crate) fn string_or_null(operation: &'static str, result: Result<String>) -> *mut c_char {
    report(operation, result)
        .and_then(|value| report(operation, marshal::string(&value)))
        .unwrap_or(std::ptr::null_mut())
}

/// # Safety
/// `ptr` must be null or a NUL-terminated string valid for `'a`.
pub(crate) unsafe fn borrowed<'a>(operation: &'static str, ptr: *const c_char) -> Option<&'a str> {
    let value = marshal::borrow_str(ptr);
    if value.is_none() {
        debug!(operation, "null or non UTF-8 string argument");
    }
    value
}

/// # Safety
/// `out` must be null or valid for a write of `T`.
pub(crate) unsafe fn write_out<T>(out: *mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if !out.is_null() => {
            out.write(value);
            true
        }
        _ => false,
    }
}

//! Release functions for every buffer handed to the caller.

use std::os::raw::c_char;

use nativeapi_core::abi::{NativeDisplay, NativeDisplayList, NativeIdList};
use nativeapi_core::marshal;

/// # Safety
/// `ptr` must be null or a string returned by this library, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn nativeapi_free_string(ptr: *mut c_char) {
    marshal::free_string(ptr);
}

/// # Safety
/// `list` must come from a `*_get_all` function of this library and not have
/// been freed.
#[no_mangle]
pub unsafe extern "C" fn nativeapi_free_id_list(list: NativeIdList) {
    marshal::free_id_list(list);
}

/// Free the strings of one display record and null them. Safe to call twice
/// on the same record.
///
/// # Safety
/// `display` must be null or point to a record produced by this library.
#[no_mangle]
pub unsafe extern "C" fn native_display_free(display: *mut NativeDisplay) {
    if let Some(display) = display.as_mut() {
        marshal::free_display(display);
    }
}

/// # Safety
/// `list` must come from `display_manager_get_all` and not have been freed.
#[no_mangle]
pub unsafe extern "C" fn native_display_list_free(list: NativeDisplayList) {
    marshal::free_display_list(list);
}

use std::os::raw::c_char;

use nativeapi_core::abi::{NativeIdList, TrayCallback};
use nativeapi_core::{marshal, ResourceId};

use crate::convert::{borrowed, id_or_zero, string_or_null, succeeded};
use crate::{with_api, with_installed};

#[no_mangle]
pub extern "C" fn tray_manager_create() -> i64 {
    with_api(0, |api| id_or_zero("tray_manager_create", api.trays().create()))
}

#[no_mangle]
pub extern "C" fn tray_manager_destroy(tray_id: i64) -> bool {
    with_api(false, |api| {
        succeeded(
            "tray_manager_destroy",
            api.trays().destroy(ResourceId::from(tray_id)),
        )
    })
}

/// Release the result with `nativeapi_free_id_list`.
#[no_mangle]
pub extern "C" fn tray_manager_get_all() -> NativeIdList {
    let ids = with_api(Vec::new(), |api| api.trays().get_all());
    marshal::id_list(&ids)
}

#[no_mangle]
pub extern "C" fn tray_manager_start_listening() -> bool {
    with_api(false, |api| {
        succeeded("tray_manager_start_listening", api.trays().start_listening())
    })
}

/// A notification already being delivered on another thread may still reach
/// the old callback after this returns.
#[no_mangle]
pub extern "C" fn tray_manager_stop_listening() {
    with_installed((), |api| api.trays().stop_listening());
}

#[no_mangle]
pub extern "C" fn tray_manager_on_clicked(callback: Option<TrayCallback>) {
    with_api((), |api| api.trays().on_clicked(callback));
}

#[no_mangle]
pub extern "C" fn tray_manager_on_right_clicked(callback: Option<TrayCallback>) {
    with_api((), |api| api.trays().on_right_clicked(callback));
}

#[no_mangle]
pub extern "C" fn tray_manager_on_double_clicked(callback: Option<TrayCallback>) {
    with_api((), |api| api.trays().on_double_clicked(callback));
}

/// `icon` is a path to an image file.
///
/// # Safety
/// `icon` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tray_set_icon(tray_id: i64, icon: *const c_char) -> bool {
    let Some(icon) = borrowed("tray_set_icon", icon) else {
        return false;
    };
    with_api(false, |api| {
        succeeded(
            "tray_set_icon",
            api.trays()
                .with_tray(ResourceId::from(tray_id), |tray| tray.set_icon(icon)),
        )
    })
}

/// # Safety
/// `title` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tray_set_title(tray_id: i64, title: *const c_char) -> bool {
    let Some(title) = borrowed("tray_set_title", title) else {
        return false;
    };
    with_api(false, |api| {
        succeeded(
            "tray_set_title",
            api.trays()
                .with_tray(ResourceId::from(tray_id), |tray| tray.set_title(title)),
        )
    })
}

/// Release the result with `nativeapi_free_string`.
#[no_mangle]
pub extern "C" fn tray_get_title(tray_id: i64) -> *mut c_char {
    with_api(std::ptr::null_mut(), |api| {
        string_or_null(
            "tray_get_title",
            api.trays()
                .with_tray(ResourceId::from(tray_id), |tray| tray.title()),
        )
    })
}

/// # Safety
/// `tooltip` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tray_set_tooltip(tray_id: i64, tooltip: *const c_char) -> bool {
    let Some(tooltip) = borrowed("tray_set_tooltip", tooltip) else {
        return false;
    };
    with_api(false, |api| {
        succeeded(
            "tray_set_tooltip",
            api.trays()
                .with_tray(ResourceId::from(tray_id), |tray| tray.set_tooltip(tooltip)),
        )
    })
}

/// Release the result with `nativeapi_free_string`.
#[no_mangle]
pub extern "C" fn tray_get_tooltip(tray_id: i64) -> *mut c_char {
    with_api(std::ptr::null_mut(), |api| {
        string_or_null(
            "tray_get_tooltip",
            api.trays()
                .with_tray(ResourceId::from(tray_id), |tray| tray.tooltip()),
        )
    })
}

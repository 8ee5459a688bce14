use nativeapi_core::abi::{DisplayCallback, NativeDisplay, NativeDisplayList, NativePoint};
use nativeapi_core::marshal;

use crate::convert::{report, succeeded, write_out};
use crate::{with_api, with_installed};

/// Every attached display. Release the result with `native_display_list_free`.
#[no_mangle]
pub extern "C" fn display_manager_get_all() -> NativeDisplayList {
    let displays = with_api(Vec::new(), |api| {
        report("display_manager_get_all", api.displays().get_all()).unwrap_or_default()
    });
    marshal::display_list(&displays)
}

/// Writes the primary display into `out`; release its strings with
/// `native_display_free`.
///
/// # Safety
/// `out` must be null or valid for writing one `NativeDisplay`.
#[no_mangle]
pub unsafe extern "C" fn display_manager_get_primary(out: *mut NativeDisplay) -> bool {
    if out.is_null() {
        return false;
    }
    let record = with_api(None, |api| {
        report("display_manager_get_primary", api.displays().get_primary())
            .and_then(|display| report("display_manager_get_primary", marshal::display(&display)))
    });
    write_out(out, record)
}

/// # Safety
/// `out` must be null or valid for writing one `NativePoint`.
#[no_mangle]
pub unsafe extern "C" fn display_manager_get_cursor_position(out: *mut NativePoint) -> bool {
    let position = with_api(None, |api| {
        report(
            "display_manager_get_cursor_position",
            api.displays().get_cursor_position(),
        )
    });
    write_out(out, position.map(NativePoint::from))
}

#[no_mangle]
pub extern "C" fn display_manager_start_listening() -> bool {
    with_api(false, |api| {
        succeeded(
            "display_manager_start_listening",
            api.displays().start_listening(),
        )
    })
}

/// A notification already being delivered on another thread may still reach
/// the old callback after this returns.
#[no_mangle]
pub extern "C" fn display_manager_stop_listening() {
    with_installed((), |api| api.displays().stop_listening());
}

#[no_mangle]
pub extern "C" fn display_manager_on_display_added(callback: Option<DisplayCallback>) {
    with_api((), |api| api.displays().on_display_added(callback));
}

#[no_mangle]
pub extern "C" fn display_manager_on_display_removed(callback: Option<DisplayCallback>) {
    with_api((), |api| api.displays().on_display_removed(callback));
}

use std::os::raw::c_char;

use nativeapi_core::abi::{
    NativeIdList, NativePoint, NativeSize, NativeWindowOptions, WindowCallback,
    WindowMovedCallback, WindowResizedCallback,
};
use nativeapi_core::{marshal, ResourceId};
use nativeapi_platform::{Point, WindowOptions};

use crate::convert::{borrowed, id_or_zero, report, string_or_null, succeeded, write_out};
use crate::{with_api, with_installed};

fn create(options: &WindowOptions) -> i64 {
    with_api(0, |api| {
        id_or_zero("window_manager_create", api.windows().create(options))
    })
}

/// Create a window with default options. Blocks while the OS creates it.
#[no_mangle]
pub extern "C" fn window_manager_create() -> i64 {
    create(&WindowOptions::default())
}

/// # Safety
/// `options` must be null or point to a valid record whose `title` is null
/// or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn window_manager_create_with_options(options: *const NativeWindowOptions) -> i64 {
    let Some(options) = options.as_ref() else {
        return create(&WindowOptions::default());
    };
    let title = if options.title.is_null() {
        String::new()
    } else {
        match borrowed("window_manager_create_with_options", options.title) {
            Some(title) => title.to_string(),
            None => return 0,
        }
    };
    create(&WindowOptions {
        title,
        size: options.size.into(),
        position: options.has_position.then(|| options.position.into()),
        visible: options.visible,
    })
}

#[no_mangle]
pub extern "C" fn window_manager_destroy(window_id: i64) -> bool {
    with_api(false, |api| {
        succeeded(
            "window_manager_destroy",
            api.windows().destroy(ResourceId::from(window_id)),
        )
    })
}

/// Release the result with `nativeapi_free_id_list`.
#[no_mangle]
pub extern "C" fn window_manager_get_all() -> NativeIdList {
    let ids = with_api(Vec::new(), |api| api.windows().get_all());
    marshal::id_list(&ids)
}

/// The foreground window, or 0 when it is not one of ours.
#[no_mangle]
pub extern "C" fn window_manager_get_current() -> i64 {
    with_api(0, |api| {
        id_or_zero("window_manager_get_current", api.windows().get_current())
    })
}

#[no_mangle]
pub extern "C" fn window_manager_start_listening() -> bool {
    with_api(false, |api| {
        succeeded("window_manager_start_listening", api.windows().start_listening())
    })
}

/// Stop notifications and drop every window callback.
///
/// A notification already being delivered on another thread may still reach
/// the old callback after this returns.
#[no_mangle]
pub extern "C" fn window_manager_stop_listening() {
    with_installed((), |api| api.windows().stop_listening());
}

#[no_mangle]
pub extern "C" fn window_manager_on_focused(callback: Option<WindowCallback>) {
    with_api((), |api| api.windows().on_focused(callback));
}

#[no_mangle]
pub extern "C" fn window_manager_on_blurred(callback: Option<WindowCallback>) {
    with_api((), |api| api.windows().on_blurred(callback));
}

#[no_mangle]
pub extern "C" fn window_manager_on_resized(callback: Option<WindowResizedCallback>) {
    with_api((), |api| api.windows().on_resized(callback));
}

#[no_mangle]
pub extern "C" fn window_manager_on_moved(callback: Option<WindowMovedCallback>) {
    with_api((), |api| api.windows().on_moved(callback));
}

#[no_mangle]
pub extern "C" fn window_manager_on_closed(callback: Option<WindowCallback>) {
    with_api((), |api| api.windows().on_closed(callback));
}

#[no_mangle]
pub extern "C" fn window_exists(window_id: i64) -> bool {
    with_api(false, |api| api.windows().contains(ResourceId::from(window_id)))
}

/// Release the result with `nativeapi_free_string`.
#[no_mangle]
pub extern "C" fn window_get_title(window_id: i64) -> *mut c_char {
    with_api(std::ptr::null_mut(), |api| {
        string_or_null(
            "window_get_title",
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.title()),
        )
    })
}

/// # Safety
/// `title` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn window_set_title(window_id: i64, title: *const c_char) -> bool {
    let Some(title) = borrowed("window_set_title", title) else {
        return false;
    };
    with_api(false, |api| {
        succeeded(
            "window_set_title",
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.set_title(title)),
        )
    })
}

/// # Safety
/// `out` must be null or valid for writing one `NativeSize`.
#[no_mangle]
pub unsafe extern "C" fn window_get_size(window_id: i64, out: *mut NativeSize) -> bool {
    let size = with_api(None, |api| {
        report(
            "window_get_size",
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.size()),
        )
    });
    write_out(out, size.map(NativeSize::from))
}

#[no_mangle]
pub extern "C" fn window_set_size(window_id: i64, size: NativeSize) -> bool {
    with_api(false, |api| {
        succeeded(
            "window_set_size",
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.set_size(size.into())),
        )
    })
}

/// # Safety
/// `out` must be null or valid for writing one `NativePoint`.
#[no_mangle]
pub unsafe extern "C" fn window_get_position(window_id: i64, out: *mut NativePoint) -> bool {
    let position = with_api(None, |api| {
        report(
            "window_get_position",
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.position()),
        )
    });
    write_out(out, position.map(NativePoint::from))
}

#[no_mangle]
pub extern "C" fn window_set_position(window_id: i64, position: NativePoint) -> bool {
    let position = Point::from(position);
    with_api(false, |api| {
        succeeded(
            "window_set_position",
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.set_position(position)),
        )
    })
}

#[no_mangle]
pub extern "C" fn window_is_visible(window_id: i64) -> bool {
    with_api(false, |api| {
        report(
            "window_is_visible",
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.is_visible()),
        )
        .unwrap_or(false)
    })
}

fn set_visible(operation: &'static str, window_id: i64, visible: bool) -> bool {
    with_api(false, |api| {
        succeeded(
            operation,
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.set_visible(visible)),
        )
    })
}

#[no_mangle]
pub extern "C" fn window_show(window_id: i64) -> bool {
    set_visible("window_show", window_id, true)
}

#[no_mangle]
pub extern "C" fn window_hide(window_id: i64) -> bool {
    set_visible("window_hide", window_id, false)
}

#[no_mangle]
pub extern "C" fn window_focus(window_id: i64) -> bool {
    with_api(false, |api| {
        succeeded(
            "window_focus",
            api.windows()
                .with_window(ResourceId::from(window_id), |window| window.focus()),
        )
    })
}

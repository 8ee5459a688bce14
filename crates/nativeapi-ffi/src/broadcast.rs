use std::os::raw::c_char;

use nativeapi_core::abi::BroadcastReceivedCallback;

use crate::convert::{borrowed, succeeded};
use crate::{with_api, with_installed};

/// # Safety
/// `topic` and `message` must each be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn broadcast_center_send_broadcast(
    topic: *const c_char,
    message: *const c_char,
) -> bool {
    let (Some(topic), Some(message)) = (
        borrowed("broadcast_center_send_broadcast", topic),
        borrowed("broadcast_center_send_broadcast", message),
    ) else {
        return false;
    };
    with_api(false, |api| {
        succeeded(
            "broadcast_center_send_broadcast",
            api.broadcast().send(topic, message),
        )
    })
}

/// # Safety
/// `topic` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn broadcast_center_register_receiver(topic: *const c_char) -> bool {
    let Some(topic) = borrowed("broadcast_center_register_receiver", topic) else {
        return false;
    };
    with_api(false, |api| {
        succeeded(
            "broadcast_center_register_receiver",
            api.broadcast().register_receiver(topic),
        )
    })
}

/// Returns false if `topic` was not registered.
///
/// # Safety
/// `topic` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn broadcast_center_unregister_receiver(topic: *const c_char) -> bool {
    let Some(topic) = borrowed("broadcast_center_unregister_receiver", topic) else {
        return false;
    };
    with_installed(false, |api| api.broadcast().unregister_receiver(topic))
}

#[no_mangle]
pub extern "C" fn broadcast_center_start_listening() -> bool {
    with_api(false, |api| {
        succeeded(
            "broadcast_center_start_listening",
            api.broadcast().start_listening(),
        )
    })
}

/// A notification already being delivered on another thread may still reach
/// the old callback after this returns.
#[no_mangle]
pub extern "C" fn broadcast_center_stop_listening() {
    with_installed((), |api| api.broadcast().stop_listening());
}

/// The callback owns both strings; release each with `nativeapi_free_string`.
#[no_mangle]
pub extern "C" fn broadcast_center_on_broadcast_received(callback: Option<BroadcastReceivedCallback>) {
    with_api((), |api| api.broadcast().on_broadcast_received(callback));
}

use nativeapi_core::abi::{KeyCallback, ModifierKeysCallback};

use crate::convert::succeeded;
use crate::{with_api, with_installed};

#[no_mangle]
pub extern "C" fn keyboard_monitor_start() -> bool {
    with_api(false, |api| {
        succeeded("keyboard_monitor_start", api.keyboard().start())
    })
}

/// Also clears every keyboard callback and resets the modifier state.
/// A notification already being delivered on another thread may still reach
/// the old callback after this returns.
#[no_mangle]
pub extern "C" fn keyboard_monitor_stop() {
    with_installed((), |api| api.keyboard().stop());
}

/// The callback owns the key name; release it with `nativeapi_free_string`.
#[no_mangle]
pub extern "C" fn keyboard_monitor_on_key_pressed(callback: Option<KeyCallback>) {
    with_api((), |api| api.keyboard().on_key_pressed(callback));
}

#[no_mangle]
pub extern "C" fn keyboard_monitor_on_key_released(callback: Option<KeyCallback>) {
    with_api((), |api| api.keyboard().on_key_released(callback));
}

#[no_mangle]
pub extern "C" fn keyboard_monitor_on_modifier_keys_changed(callback: Option<ModifierKeysCallback>) {
    with_api((), |api| api.keyboard().on_modifier_keys_changed(callback));
}

/// Bit set of held modifiers: shift 1, ctrl 2, alt 4, meta 8, fn 16.
#[no_mangle]
pub extern "C" fn keyboard_monitor_get_modifier_keys() -> u32 {
    with_api(0, |api| api.keyboard().modifier_keys().bits())
}

use crate::convert::succeeded;
use crate::with_api;

#[no_mangle]
pub extern "C" fn accessibility_manager_enable() -> bool {
    with_api(false, |api| {
        succeeded("accessibility_manager_enable", api.accessibility().enable())
    })
}

#[no_mangle]
pub extern "C" fn accessibility_manager_is_enabled() -> bool {
    with_api(false, |api| api.accessibility().is_enabled())
}

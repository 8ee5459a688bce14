//! Drives the exported functions the way a foreign caller would. The context
//! is process-wide, so tests take `SERIAL` for their whole run.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use nativeapi::accessibility::*;
use nativeapi::broadcast::*;
use nativeapi::display::*;
use nativeapi::keyboard::*;
use nativeapi::lifecycle::*;
use nativeapi::memory::*;
use nativeapi::tray::*;
use nativeapi::window::*;
use nativeapi_core::abi::{NativeDisplay, NativePoint, NativeSize, NativeWindowOptions};
use nativeapi_core::{NativeApiConfig, ResourceId};
use nativeapi_platform::headless::HeadlessPlatform;
use nativeapi_platform::{ModifierKeys, NativeTray};

static SERIAL: Mutex<()> = Mutex::new(());

struct Session {
    platform: HeadlessPlatform,
    _guard: MutexGuard<'static, ()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        nativeapi::uninstall();
    }
}

fn session() -> Session {
    let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    let platform = HeadlessPlatform::new();
    nativeapi::install(platform.providers(), NativeApiConfig::default()).unwrap();
    Session {
        platform,
        _guard: guard,
    }
}

fn take_string(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let value = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
    unsafe { nativeapi_free_string(ptr) };
    Some(value)
}

fn window_ids() -> Vec<i64> {
    let list = window_manager_get_all();
    let ids = unsafe { std::slice::from_raw_parts(list.ids, list.count as usize) }.to_vec();
    unsafe { nativeapi_free_id_list(list) };
    ids
}

#[test]
fn create_get_and_title_scenario() {
    let _session = session();

    let first = window_manager_create();
    let second = window_manager_create();
    assert!(first > 0);
    assert_eq!(second, first + 1);
    assert_eq!(window_ids(), vec![first, second]);
    assert!(!window_exists(second + 1));
    assert_eq!(take_string(window_get_title(second + 1)), None);
    assert_eq!(take_string(window_get_title(first)).as_deref(), Some(""));

    let title = CString::new("Main").unwrap();
    assert!(unsafe { window_set_title(first, title.as_ptr()) });
    assert_eq!(take_string(window_get_title(first)).as_deref(), Some("Main"));
    assert_eq!(take_string(window_get_title(second)).as_deref(), Some(""));

    assert!(window_manager_destroy(first));
    assert!(!window_manager_destroy(first));
    assert_eq!(window_ids(), vec![second]);
}

#[test]
fn ids_stay_invalid_across_a_context_restart() {
    let _session = session();
    let old = window_manager_create();
    let title = CString::new("Old").unwrap();
    assert!(unsafe { window_set_title(old, title.as_ptr()) });

    nativeapi_shutdown();
    let platform = HeadlessPlatform::new();
    nativeapi::install(platform.providers(), NativeApiConfig::default()).unwrap();

    let new = window_manager_create();
    assert_ne!(old, new);
    assert!(!window_exists(old));
    assert_eq!(take_string(window_get_title(old)), None);
    assert_eq!(window_ids(), vec![new]);
}

#[test]
fn uninstall_closes_live_windows_and_trays() {
    let session = session();
    let window = window_manager_create();
    let tray = tray_manager_create();
    let api = nativeapi::installed().unwrap();
    let native_window = session
        .platform
        .windows
        .window(api.windows().get(ResourceId::from(window)).unwrap().native_handle())
        .unwrap();
    let native_tray = session
        .platform
        .trays
        .tray(api.trays().get(ResourceId::from(tray)).unwrap().native_handle())
        .unwrap();
    drop(api);

    assert!(nativeapi::uninstall());

    assert!(native_window.is_closed());
    assert!(native_tray.title().is_err());
    assert_eq!(session.platform.windows.open_count(), 0);
}

#[test]
fn stopping_without_a_context_does_not_create_one() {
    let _session = session();
    nativeapi_shutdown();

    window_manager_stop_listening();
    tray_manager_stop_listening();
    display_manager_stop_listening();
    keyboard_monitor_stop();
    broadcast_center_stop_listening();
    let topic = CString::new("sync").unwrap();
    assert!(!unsafe { broadcast_center_unregister_receiver(topic.as_ptr()) });

    assert!(!nativeapi::is_installed());
}

#[test]
fn null_and_unknown_inputs_fail_softly() {
    let _session = session();
    let id = window_manager_create();

    let mut size = NativeSize::default();
    assert!(!unsafe { window_get_size(99, &mut size) });
    assert!(!unsafe { window_get_size(id, std::ptr::null_mut()) });
    assert!(!unsafe { window_set_title(id, std::ptr::null()) });
    assert!(!unsafe { tray_set_tooltip(0, std::ptr::null()) });
    assert!(!window_focus(0));
    assert_eq!(window_manager_get_current(), 0);
    unsafe {
        nativeapi_free_string(std::ptr::null_mut());
        native_display_free(std::ptr::null_mut());
    }
}

#[test]
fn options_and_geometry_round_trip() {
    let _session = session();
    let title = CString::new("Settings").unwrap();
    let options = NativeWindowOptions {
        title: title.as_ptr(),
        size: NativeSize {
            width: 640.0,
            height: 480.0,
        },
        position: NativePoint { x: 5.0, y: 6.0 },
        has_position: true,
        visible: false,
    };
    let id = unsafe { window_manager_create_with_options(&options) };
    assert_ne!(id, 0);
    assert!(!window_is_visible(id));
    assert!(window_show(id));
    assert!(window_is_visible(id));

    let mut position = NativePoint::default();
    assert!(unsafe { window_get_position(id, &mut position) });
    assert_eq!(position, NativePoint { x: 5.0, y: 6.0 });

    assert!(window_set_size(
        id,
        NativeSize {
            width: 300.0,
            height: 200.0
        }
    ));
    let mut size = NativeSize::default();
    assert!(unsafe { window_get_size(id, &mut size) });
    assert_eq!(size.width, 300.0);

    assert!(window_focus(id));
    assert_eq!(window_manager_get_current(), id);
}

#[test]
fn tray_strings_are_fresh_copies() {
    let _session = session();
    let id = tray_manager_create();
    let tooltip = CString::new("Syncing").unwrap();
    assert!(unsafe { tray_set_tooltip(id, tooltip.as_ptr()) });

    let first = tray_get_tooltip(id);
    let second = tray_get_tooltip(id);
    assert_ne!(first, second);
    assert_eq!(take_string(first).as_deref(), Some("Syncing"));
    assert_eq!(take_string(second).as_deref(), Some("Syncing"));

    assert!(tray_manager_destroy(id));
    assert_eq!(take_string(tray_get_title(id)), None);
}

#[test]
fn displays_are_marshalled_into_owned_records() {
    let _session = session();

    let list = display_manager_get_all();
    assert_eq!(list.count, 1);
    let first = unsafe { &*list.displays };
    assert_eq!(unsafe { CStr::from_ptr(first.id) }.to_str().unwrap(), "headless-0");
    assert_eq!(first.visible_size_height, 1040.0);
    unsafe { native_display_list_free(list) };

    let mut primary = NativeDisplay::empty();
    assert!(unsafe { display_manager_get_primary(&mut primary) });
    assert_eq!(primary.width, 1920.0);
    unsafe {
        native_display_free(&mut primary);
        native_display_free(&mut primary);
    }
    assert!(primary.name.is_null());
}

#[test]
fn unavailable_display_provider_yields_empty_list() {
    let session = session();
    session.platform.displays.set_unavailable(true);
    let list = display_manager_get_all();
    assert_eq!(list.count, 0);
    assert!(!list.displays.is_null());
    unsafe { native_display_list_free(list) };
    let mut cursor = NativePoint::default();
    assert!(!unsafe { display_manager_get_cursor_position(&mut cursor) });
}

static LAST_MODIFIERS: AtomicU32 = AtomicU32::new(u32::MAX);

extern "C" fn record_modifiers(bits: u32) {
    LAST_MODIFIERS.store(bits, Ordering::SeqCst);
}

#[test]
fn keyboard_modifiers_cross_the_boundary_as_bits() {
    let session = session();
    keyboard_monitor_on_modifier_keys_changed(Some(record_modifiers));
    assert!(keyboard_monitor_start());

    session
        .platform
        .keyboard
        .simulate_modifiers_changed(ModifierKeys::SHIFT | ModifierKeys::CTRL);
    assert_eq!(LAST_MODIFIERS.load(Ordering::SeqCst), 3);
    assert_eq!(keyboard_monitor_get_modifier_keys(), 3);

    keyboard_monitor_stop();
    assert_eq!(keyboard_monitor_get_modifier_keys(), 0);
}

static PRESSED: Mutex<Vec<usize>> = Mutex::new(Vec::new());

extern "C" fn keep_pressed(key: *mut c_char) {
    PRESSED.lock().unwrap().push(key as usize);
}

#[test]
fn consecutive_keys_cross_as_separate_buffers() {
    let session = session();
    keyboard_monitor_on_key_pressed(Some(keep_pressed));
    assert!(keyboard_monitor_start());

    session.platform.keyboard.simulate_key_pressed("a");
    session.platform.keyboard.simulate_key_pressed("b");
    keyboard_monitor_stop();

    let buffers = std::mem::take(&mut *PRESSED.lock().unwrap());
    assert_eq!(buffers.len(), 2);
    assert_ne!(buffers[0], buffers[1]);
    let keys: Vec<Option<String>> = buffers
        .into_iter()
        .map(|buffer| take_string(buffer as *mut c_char))
        .collect();
    assert_eq!(keys, vec![Some("a".to_string()), Some("b".to_string())]);
}

static BROADCASTS: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());

extern "C" fn record_broadcast(topic: *mut c_char, message: *mut c_char) {
    let pair = (
        take_string(topic).unwrap_or_default(),
        take_string(message).unwrap_or_default(),
    );
    BROADCASTS.lock().unwrap().push(pair);
}

#[test]
fn broadcasts_reach_registered_topics_only() {
    let _session = session();
    let topic = CString::new("sync").unwrap();
    let other = CString::new("other").unwrap();
    let message = CString::new("done").unwrap();

    broadcast_center_on_broadcast_received(Some(record_broadcast));
    assert!(unsafe { broadcast_center_register_receiver(topic.as_ptr()) });
    assert!(unsafe { broadcast_center_send_broadcast(other.as_ptr(), message.as_ptr()) });
    assert!(unsafe { broadcast_center_send_broadcast(topic.as_ptr(), message.as_ptr()) });
    assert!(unsafe { broadcast_center_unregister_receiver(topic.as_ptr()) });
    assert!(!unsafe { broadcast_center_unregister_receiver(topic.as_ptr()) });

    assert_eq!(
        *BROADCASTS.lock().unwrap(),
        vec![("sync".to_string(), "done".to_string())]
    );
}

#[test]
fn accessibility_flag_is_forwarded() {
    let _session = session();
    assert!(!accessibility_manager_is_enabled());
    assert!(accessibility_manager_enable());
    assert!(accessibility_manager_is_enabled());
}

#[test]
fn shutdown_invalidates_ids_and_init_rejects_bad_config() {
    let _session = session();
    let id = window_manager_create();
    nativeapi_shutdown();
    assert!(!nativeapi::is_installed());

    let missing = CString::new("/nonexistent/nativeapi.toml").unwrap();
    assert!(!unsafe { nativeapi_init(missing.as_ptr()) });
    assert!(!nativeapi::is_installed());

    // Without a context the next call builds one from scratch.
    if cfg!(not(windows)) {
        assert!(!window_exists(id));
        assert!(nativeapi::is_installed());
    }
}

use std::ffi::c_void;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use nativeapi_platform::{
    EventHandler, EventSource, KeyboardEvent, KeyboardProvider, Listeners, ModifierKeys, Result,
    SubscriptionId,
};
use once_cell::sync::Lazy;
use tracing::{debug, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::*;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Low-level keyboard hook shared by every subscriber. Installed with the
/// first subscription and removed with the last.
struct KeyboardHook {
    listeners: Listeners<KeyboardEvent>,
    hook_value: Mutex<Option<isize>>,
    modifiers: AtomicU32,
}

static HOOK: Lazy<KeyboardHook> = Lazy::new(|| KeyboardHook {
    listeners: Listeners::new(),
    hook_value: Mutex::new(None),
    modifiers: AtomicU32::new(0),
});

fn modifier_for(vk: VIRTUAL_KEY) -> ModifierKeys {
    if [VK_SHIFT, VK_LSHIFT, VK_RSHIFT].contains(&vk) {
        ModifierKeys::SHIFT
    } else if [VK_CONTROL, VK_LCONTROL, VK_RCONTROL].contains(&vk) {
        ModifierKeys::CTRL
    } else if [VK_MENU, VK_LMENU, VK_RMENU].contains(&vk) {
        ModifierKeys::ALT
    } else if [VK_LWIN, VK_RWIN].contains(&vk) {
        ModifierKeys::META
    } else {
        ModifierKeys::NONE
    }
}

unsafe fn key_name(info: &KBDLLHOOKSTRUCT) -> String {
    let mut lparam = (info.scanCode << 16) as i32;
    if info.flags.0 & LLKHF_EXTENDED.0 != 0 {
        lparam |= 1 << 24;
    }
    let mut buffer = [0u16; 64];
    let len = GetKeyNameTextW(lparam, &mut buffer);
    if len > 0 {
        String::from_utf16_lossy(&buffer[..len as usize])
    } else {
        format!("VK_{:#04x}", info.vkCode)
    }
}

unsafe fn report_key(info: &KBDLLHOOKSTRUCT, pressed: bool) {
    let modifier = modifier_for(VIRTUAL_KEY(info.vkCode as u16));
    let name = key_name(info);
    HOOK.listeners.emit(&if pressed {
        KeyboardEvent::KeyPressed(name)
    } else {
        KeyboardEvent::KeyReleased(name)
    });
    if modifier.is_empty() {
        return;
    }
    let bits = modifier.bits();
    let previous = if pressed {
        HOOK.modifiers.fetch_or(bits, Ordering::SeqCst)
    } else {
        HOOK.modifiers.fetch_and(!bits, Ordering::SeqCst)
    };
    let current = HOOK.modifiers.load(Ordering::SeqCst);
    if previous != current {
        HOOK.listeners
            .emit(&KeyboardEvent::ModifiersChanged(ModifierKeys::from_bits_truncate(current)));
    }
}

unsafe extern "system" fn handle_keyboard_hook(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 && lparam.0 != 0 {
        let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
        match wparam.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => report_key(info, true),
            WM_KEYUP | WM_SYSKEYUP => report_key(info, false),
            _ => {}
        }
    }
    CallNextHookEx(None, code, wparam, lparam)
}

pub struct WinKeyboard {
    hinstance_value: isize,
}

impl WinKeyboard {
    pub fn new(hinstance: HINSTANCE) -> Self {
        Self {
            hinstance_value: hinstance.0 as isize,
        }
    }
}

impl EventSource<KeyboardEvent> for WinKeyboard {
    fn subscribe(&self, handler: EventHandler<KeyboardEvent>) -> Result<SubscriptionId> {
        let mut hook_value = HOOK.hook_value.lock().unwrap_or_else(PoisonError::into_inner);
        if hook_value.is_none() {
            let hinstance = HINSTANCE(self.hinstance_value as *mut c_void);
            let hook = unsafe {
                SetWindowsHookExW(WH_KEYBOARD_LL, Some(handle_keyboard_hook), hinstance, 0)?
            };
            *hook_value = Some(hook.0 as isize);
            HOOK.modifiers.store(0, Ordering::SeqCst);
            debug!("keyboard hook installed");
        }
        Ok(HOOK.listeners.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        HOOK.listeners.remove(subscription);
        if !HOOK.listeners.is_empty() {
            return;
        }
        let mut hook_value = HOOK.hook_value.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = hook_value.take() {
            if let Err(err) = unsafe { UnhookWindowsHookEx(HHOOK(value as *mut c_void)) } {
                warn!("UnhookWindowsHookEx failed: {err}");
            }
            debug!("keyboard hook removed");
        }
    }
}

impl KeyboardProvider for WinKeyboard {}

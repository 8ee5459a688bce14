//! Windows providers for nativeapi.
//!
//! Windows, tray icons and the keyboard hook are bound to the thread that
//! created them, and notifications arrive through that thread's message loop.
//! The embedding application is expected to pump messages on the thread that
//! calls into the C surface. On other targets this crate is empty.

#[cfg(windows)]
mod display;
#[cfg(windows)]
mod keyboard;
#[cfg(windows)]
mod tray;
#[cfg(windows)]
mod window;

#[cfg(windows)]
pub use platform::providers;

#[cfg(windows)]
mod platform {
    use std::sync::Arc;

    use nativeapi_platform::headless::HeadlessAccessibility;
    use nativeapi_platform::{LocalBroadcastCenter, Providers, Result};
    use tracing::info;
    use windows::Win32::Foundation::HINSTANCE;
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;

    use crate::display::WinDisplays;
    use crate::keyboard::WinKeyboard;
    use crate::tray::WinTrays;
    use crate::window::WinWindows;

    /// Build the provider set for the current process.
    pub fn providers() -> Result<Providers> {
        let hinstance = unsafe { HINSTANCE(GetModuleHandleW(None)?.0) };
        let providers = Providers {
            windows: Arc::new(WinWindows::new(hinstance)),
            trays: Arc::new(WinTrays::new()),
            displays: Arc::new(WinDisplays::new(hinstance)),
            keyboard: Arc::new(WinKeyboard::new(hinstance)),
            broadcast: Arc::new(LocalBroadcastCenter::new()),
            accessibility: Arc::new(HeadlessAccessibility::default()),
        };
        info!("windows providers ready");
        Ok(providers)
    }

    pub(crate) fn box_err<E: std::error::Error + Send + Sync + 'static>(
        e: E,
    ) -> Box<dyn std::error::Error + Send + Sync> {
        Box::new(e)
    }
}

#[cfg(windows)]
pub(crate) use platform::box_err;

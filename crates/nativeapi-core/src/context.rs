use nativeapi_platform::Providers;
use tracing::info;

use crate::accessibility::AccessibilityManager;
use crate::broadcast::BroadcastCenter;
use crate::config::NativeApiConfig;
use crate::display::DisplayManager;
use crate::error::Result;
use crate::keyboard::KeyboardMonitor;
use crate::tray::TrayManager;
use crate::window::WindowManager;

/// Every manager, built once from one set of providers.
pub struct NativeApi {
    config: NativeApiConfig,
    windows: WindowManager,
    trays: TrayManager,
    displays: DisplayManager,
    keyboard: KeyboardMonitor,
    broadcast: BroadcastCenter,
    accessibility: AccessibilityManager,
}

impl NativeApi {
    pub fn new(providers: Providers, config: NativeApiConfig) -> Result<Self> {
        let events = &config.events;
        let windows = WindowManager::new(providers.windows, events)?;
        let trays = TrayManager::new(providers.trays, events);
        let displays = DisplayManager::new(providers.displays, events);
        let keyboard = KeyboardMonitor::new(providers.keyboard, events);
        let broadcast = BroadcastCenter::new(providers.broadcast, events);
        let accessibility = AccessibilityManager::new(providers.accessibility);
        info!(log_deliveries = events.log_deliveries, "native api context created");
        Ok(Self {
            config,
            windows,
            trays,
            displays,
            keyboard,
            broadcast,
            accessibility,
        })
    }

    pub fn config(&self) -> &NativeApiConfig {
        &self.config
    }

    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    pub fn trays(&self) -> &TrayManager {
        &self.trays
    }

    pub fn displays(&self) -> &DisplayManager {
        &self.displays
    }

    pub fn keyboard(&self) -> &KeyboardMonitor {
        &self.keyboard
    }

    pub fn broadcast(&self) -> &BroadcastCenter {
        &self.broadcast
    }

    pub fn accessibility(&self) -> &AccessibilityManager {
        &self.accessibility
    }

    /// Stop every notification bridge, drop every registered callback, then
    /// close every window and tray icon still registered.
    pub fn shutdown(&self) {
        self.windows.stop_listening();
        self.trays.stop_listening();
        self.displays.stop_listening();
        self.keyboard.stop();
        self.broadcast.stop_listening();
        let windows = self.windows.destroy_all();
        let trays = self.trays.destroy_all();
        info!(windows, trays, "native api context shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nativeapi_platform::headless::HeadlessPlatform;
    use nativeapi_platform::{NativeTray, WindowOptions};

    #[test]
    fn shutdown_unsubscribes_every_bridge() {
        let platform = HeadlessPlatform::new();
        let api = NativeApi::new(platform.providers(), NativeApiConfig::default()).unwrap();
        api.windows().start_listening().unwrap();
        api.keyboard().start().unwrap();
        api.broadcast().register_receiver("sync").unwrap();

        api.shutdown();

        assert!(!api.windows().is_listening());
        assert!(!api.keyboard().is_monitoring());
        assert!(!api.broadcast().is_listening());
        assert_eq!(platform.keyboard.subscriber_count(), 0);
        assert_eq!(platform.broadcast.subscriber_count(), 0);
        // Lifecycle subscription outlives shutdown.
        assert_eq!(platform.windows.subscriber_count(), 1);
    }

    #[test]
    fn shutdown_closes_registered_resources() {
        let platform = HeadlessPlatform::new();
        let api = NativeApi::new(platform.providers(), NativeApiConfig::default()).unwrap();
        let window = api.windows().create(&WindowOptions::default()).unwrap();
        let tray = api.trays().create().unwrap();
        let native_window = platform
            .windows
            .window(api.windows().get(window).unwrap().native_handle())
            .unwrap();
        let native_tray = platform
            .trays
            .tray(api.trays().get(tray).unwrap().native_handle())
            .unwrap();

        api.shutdown();

        assert!(native_window.is_closed());
        assert!(native_tray.title().is_err());
        assert!(api.windows().get_all().is_empty());
        assert!(api.trays().get_all().is_empty());
        assert_eq!(platform.windows.open_count(), 0);
    }
}

//! Native resource provider traits so `nativeapi-core` stays OS-agnostic.
//!
//! Each resource kind (windows, trays, displays, keyboard, broadcast topics,
//! accessibility) is reached through one provider trait. Providers that emit
//! notifications also implement [`EventSource`] for their event type.

use std::sync::Arc;

pub mod broadcast;
pub mod event;
pub mod headless;
pub mod types;

pub use broadcast::LocalBroadcastCenter;
pub use event::{
    BroadcastEvent, DisplayEvent, EventHandler, EventSource, KeyboardEvent, Listeners,
    SubscriptionId, TrayEvent, WindowEvent,
};
pub use types::{Display, ModifierKeys, Point, Size, WindowOptions};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One live OS window. Every accessor goes to the OS; nothing is cached.
pub trait NativeWindow: Send + Sync {
    /// OS handle used to match notifications back to this window.
    fn native_handle(&self) -> u64;
    fn title(&self) -> Result<String>;
    fn set_title(&self, title: &str) -> Result<()>;
    fn size(&self) -> Result<Size>;
    fn set_size(&self, size: Size) -> Result<()>;
    fn position(&self) -> Result<Point>;
    fn set_position(&self, position: Point) -> Result<()>;
    fn is_visible(&self) -> Result<bool>;
    fn set_visible(&self, visible: bool) -> Result<()>;
    fn focus(&self) -> Result<()>;
    fn close(&self) -> Result<()>;
}

/// Creates windows and reports window notifications.
pub trait WindowProvider: EventSource<WindowEvent> {
    /// May block on the underlying OS call.
    fn create_window(&self, options: &WindowOptions) -> Result<Arc<dyn NativeWindow>>;
    /// Native handle of the foreground window, if any.
    fn foreground_window(&self) -> Option<u64>;
}

/// One live tray icon.
pub trait NativeTray: Send + Sync {
    fn native_handle(&self) -> u64;
    fn set_icon(&self, path: &str) -> Result<()>;
    fn title(&self) -> Result<String>;
    fn set_title(&self, title: &str) -> Result<()>;
    fn tooltip(&self) -> Result<String>;
    fn set_tooltip(&self, tooltip: &str) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Creates tray icons and reports clicks on them.
pub trait TrayProvider: EventSource<TrayEvent> {
    fn create_tray(&self) -> Result<Arc<dyn NativeTray>>;
}

/// Display enumeration and hot-plug notifications.
pub trait DisplayProvider: EventSource<DisplayEvent> {
    fn displays(&self) -> Result<Vec<Display>>;
    fn primary_display(&self) -> Result<Display>;
    fn cursor_position(&self) -> Result<Point>;
}

/// Source of global key and modifier notifications.
pub trait KeyboardProvider: EventSource<KeyboardEvent> {}

/// Topic based message fan-out.
pub trait BroadcastProvider: EventSource<BroadcastEvent> {
    fn send(&self, topic: &str, message: &str) -> Result<()>;
}

pub trait AccessibilityProvider: Send + Sync {
    fn enable(&self) -> Result<()>;
    fn is_enabled(&self) -> bool;
}

/// The full set of providers a `NativeApi` context is built from.
#[derive(Clone)]
pub struct Providers {
    pub windows: Arc<dyn WindowProvider>,
    pub trays: Arc<dyn TrayProvider>,
    pub displays: Arc<dyn DisplayProvider>,
    pub keyboard: Arc<dyn KeyboardProvider>,
    pub broadcast: Arc<dyn BroadcastProvider>,
    pub accessibility: Arc<dyn AccessibilityProvider>,
}

//! In-memory provider with no OS behind it.
//!
//! Used on platforms without a native integration and as the test double for
//! everything above this crate. The `simulate_*` methods stand in for the OS
//! notification thread and emit on the calling thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

use crate::broadcast::LocalBroadcastCenter;
use crate::event::{
    DisplayEvent, EventHandler, EventSource, KeyboardEvent, Listeners, SubscriptionId, TrayEvent,
    WindowEvent,
};
use crate::types::{Display, ModifierKeys, Point, Size, WindowOptions};
use crate::{
    AccessibilityProvider, DisplayProvider, KeyboardProvider, NativeTray, NativeWindow, Providers,
    Result, TrayProvider, WindowProvider,
};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bundle of headless providers sharing nothing but their construction.
#[derive(Clone)]
pub struct HeadlessPlatform {
    pub windows: Arc<HeadlessWindows>,
    pub trays: Arc<HeadlessTrays>,
    pub displays: Arc<HeadlessDisplays>,
    pub keyboard: Arc<HeadlessKeyboard>,
    pub broadcast: Arc<LocalBroadcastCenter>,
    pub accessibility: Arc<HeadlessAccessibility>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(HeadlessWindows::default()),
            trays: Arc::new(HeadlessTrays::default()),
            displays: Arc::new(HeadlessDisplays::default()),
            keyboard: Arc::new(HeadlessKeyboard::default()),
            broadcast: Arc::new(LocalBroadcastCenter::new()),
            accessibility: Arc::new(HeadlessAccessibility::default()),
        }
    }

    pub fn providers(&self) -> Providers {
        Providers {
            windows: self.windows.clone(),
            trays: self.trays.clone(),
            displays: self.displays.clone(),
            keyboard: self.keyboard.clone(),
            broadcast: self.broadcast.clone(),
            accessibility: self.accessibility.clone(),
        }
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------- windows ----------------

#[derive(Default)]
struct WindowShared {
    listeners: Listeners<WindowEvent>,
    foreground: Mutex<Option<u64>>,
    open: Mutex<HashMap<u64, Weak<HeadlessWindow>>>,
}

impl WindowShared {
    fn activate(&self, handle: u64) {
        let previous = lock(&self.foreground).replace(handle);
        match previous {
            Some(previous) if previous == handle => return,
            Some(previous) => self.listeners.emit(&WindowEvent::Blurred { handle: previous }),
            None => {}
        }
        self.listeners.emit(&WindowEvent::Focused { handle });
    }
}

struct WindowState {
    title: String,
    size: Size,
    position: Point,
    visible: bool,
    closed: bool,
}

pub struct HeadlessWindow {
    handle: u64,
    state: Mutex<WindowState>,
    shared: Arc<WindowShared>,
}

impl HeadlessWindow {
    fn with_open_state<T>(&self, f: impl FnOnce(&mut WindowState) -> T) -> Result<T> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(format!("window {} is closed", self.handle).into());
        }
        Ok(f(&mut state))
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}

impl NativeWindow for HeadlessWindow {
    fn native_handle(&self) -> u64 {
        self.handle
    }

    fn title(&self) -> Result<String> {
        self.with_open_state(|state| state.title.clone())
    }

    fn set_title(&self, title: &str) -> Result<()> {
        self.with_open_state(|state| state.title = title.to_string())
    }

    fn size(&self) -> Result<Size> {
        self.with_open_state(|state| state.size)
    }

    fn set_size(&self, size: Size) -> Result<()> {
        if size.width < 0.0 || size.height < 0.0 {
            return Err("window size must not be negative".into());
        }
        self.with_open_state(|state| state.size = size)?;
        self.shared.listeners.emit(&WindowEvent::Resized {
            handle: self.handle,
            size,
        });
        Ok(())
    }

    fn position(&self) -> Result<Point> {
        self.with_open_state(|state| state.position)
    }

    fn set_position(&self, position: Point) -> Result<()> {
        self.with_open_state(|state| state.position = position)?;
        self.shared.listeners.emit(&WindowEvent::Moved {
            handle: self.handle,
            position,
        });
        Ok(())
    }

    fn is_visible(&self) -> Result<bool> {
        self.with_open_state(|state| state.visible)
    }

    fn set_visible(&self, visible: bool) -> Result<()> {
        self.with_open_state(|state| state.visible = visible)
    }

    fn focus(&self) -> Result<()> {
        self.with_open_state(|_| ())?;
        self.shared.activate(self.handle);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.with_open_state(|state| state.closed = true)?;
        lock(&self.shared.open).remove(&self.handle);
        {
            let mut foreground = lock(&self.shared.foreground);
            if *foreground == Some(self.handle) {
                *foreground = None;
            }
        }
        self.shared
            .listeners
            .emit(&WindowEvent::Closed { handle: self.handle });
        Ok(())
    }
}

#[derive(Default)]
pub struct HeadlessWindows {
    next_handle: AtomicU64,
    shared: Arc<WindowShared>,
    fail_next_create: AtomicBool,
}

impl HeadlessWindows {
    /// The next `create_window` call fails as if the OS refused it.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// The open window behind `handle`. Closed windows are forgotten.
    pub fn window(&self, handle: u64) -> Option<Arc<HeadlessWindow>> {
        lock(&self.shared.open).get(&handle).and_then(Weak::upgrade)
    }

    pub fn open_count(&self) -> usize {
        lock(&self.shared.open).len()
    }

    /// The user brought `handle` to the foreground.
    pub fn simulate_activate(&self, handle: u64) {
        self.shared.activate(handle);
    }

    /// The user closed the window from outside the application.
    pub fn simulate_close(&self, handle: u64) -> Result<()> {
        let window = self
            .window(handle)
            .ok_or_else(|| format!("unknown window handle {handle}"))?;
        window.close()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.listeners.len()
    }
}

impl EventSource<WindowEvent> for HeadlessWindows {
    fn subscribe(&self, handler: EventHandler<WindowEvent>) -> Result<SubscriptionId> {
        Ok(self.shared.listeners.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.shared.listeners.remove(subscription);
    }
}

impl WindowProvider for HeadlessWindows {
    fn create_window(&self, options: &WindowOptions) -> Result<Arc<dyn NativeWindow>> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err("headless window creation refused".into());
        }
        let handle = 0x1000 + self.next_handle.fetch_add(1, Ordering::Relaxed);
        let window = Arc::new(HeadlessWindow {
            handle,
            state: Mutex::new(WindowState {
                title: options.title.clone(),
                size: options.size,
                position: options.position.unwrap_or_default(),
                visible: options.visible,
                closed: false,
            }),
            shared: Arc::clone(&self.shared),
        });
        lock(&self.shared.open).insert(handle, Arc::downgrade(&window));
        debug!(handle, "headless window created");
        Ok(window)
    }

    fn foreground_window(&self) -> Option<u64> {
        *lock(&self.shared.foreground)
    }
}

// ---------------- trays ----------------

struct TrayState {
    icon: Option<String>,
    title: String,
    tooltip: String,
    removed: bool,
}

pub struct HeadlessTray {
    handle: u64,
    state: Mutex<TrayState>,
}

impl HeadlessTray {
    fn with_live_state<T>(&self, f: impl FnOnce(&mut TrayState) -> T) -> Result<T> {
        let mut state = lock(&self.state);
        if state.removed {
            return Err(format!("tray {} was removed", self.handle).into());
        }
        Ok(f(&mut state))
    }

    pub fn icon(&self) -> Option<String> {
        lock(&self.state).icon.clone()
    }
}

impl NativeTray for HeadlessTray {
    fn native_handle(&self) -> u64 {
        self.handle
    }

    fn set_icon(&self, path: &str) -> Result<()> {
        self.with_live_state(|state| state.icon = Some(path.to_string()))
    }

    fn title(&self) -> Result<String> {
        self.with_live_state(|state| state.title.clone())
    }

    fn set_title(&self, title: &str) -> Result<()> {
        self.with_live_state(|state| state.title = title.to_string())
    }

    fn tooltip(&self) -> Result<String> {
        self.with_live_state(|state| state.tooltip.clone())
    }

    fn set_tooltip(&self, tooltip: &str) -> Result<()> {
        self.with_live_state(|state| state.tooltip = tooltip.to_string())
    }

    fn remove(&self) -> Result<()> {
        self.with_live_state(|state| state.removed = true)
    }
}

#[derive(Default)]
pub struct HeadlessTrays {
    next_handle: AtomicU64,
    trays: Mutex<HashMap<u64, Arc<HeadlessTray>>>,
    listeners: Listeners<TrayEvent>,
    fail_next_create: AtomicBool,
}

impl HeadlessTrays {
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    pub fn tray(&self, handle: u64) -> Option<Arc<HeadlessTray>> {
        lock(&self.trays).get(&handle).cloned()
    }

    pub fn simulate_click(&self, handle: u64) {
        self.listeners.emit(&TrayEvent::Clicked { handle });
    }

    pub fn simulate_right_click(&self, handle: u64) {
        self.listeners.emit(&TrayEvent::RightClicked { handle });
    }

    pub fn simulate_double_click(&self, handle: u64) {
        self.listeners.emit(&TrayEvent::DoubleClicked { handle });
    }
}

impl EventSource<TrayEvent> for HeadlessTrays {
    fn subscribe(&self, handler: EventHandler<TrayEvent>) -> Result<SubscriptionId> {
        Ok(self.listeners.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.listeners.remove(subscription);
    }
}

impl TrayProvider for HeadlessTrays {
    fn create_tray(&self) -> Result<Arc<dyn NativeTray>> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err("headless tray creation refused".into());
        }
        let handle = 0x2000 + self.next_handle.fetch_add(1, Ordering::Relaxed);
        let tray = Arc::new(HeadlessTray {
            handle,
            state: Mutex::new(TrayState {
                icon: None,
                title: String::new(),
                tooltip: String::new(),
                removed: false,
            }),
        });
        lock(&self.trays).insert(handle, Arc::clone(&tray));
        Ok(tray)
    }
}

// ---------------- displays ----------------

pub struct HeadlessDisplays {
    displays: Mutex<Vec<Display>>,
    cursor: Mutex<Point>,
    listeners: Listeners<DisplayEvent>,
    unavailable: AtomicBool,
}

impl HeadlessDisplays {
    pub fn default_display() -> Display {
        Display {
            id: "headless-0".to_string(),
            name: "Headless Display".to_string(),
            width: 1920.0,
            height: 1080.0,
            visible_position: Point::new(0.0, 0.0),
            visible_size: Size::new(1920.0, 1040.0),
            scale_factor: 1.0,
        }
    }

    /// Plug a display in and notify subscribers.
    pub fn simulate_attach(&self, display: Display) {
        lock(&self.displays).push(display.clone());
        self.listeners.emit(&DisplayEvent::Added(display));
    }

    /// Unplug the display with `id`; returns false if it was not attached.
    pub fn simulate_detach(&self, id: &str) -> bool {
        let removed = {
            let mut displays = lock(&self.displays);
            let index = displays.iter().position(|display| display.id == id);
            index.map(|index| displays.remove(index))
        };
        match removed {
            Some(display) => {
                self.listeners.emit(&DisplayEvent::Removed(display));
                true
            }
            None => false,
        }
    }

    pub fn set_cursor_position(&self, position: Point) {
        *lock(&self.cursor) = position;
    }

    /// While set, every query fails as if the OS call errored.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err("display information unavailable".into());
        }
        Ok(())
    }
}

impl Default for HeadlessDisplays {
    fn default() -> Self {
        Self {
            displays: Mutex::new(vec![Self::default_display()]),
            cursor: Mutex::new(Point::default()),
            listeners: Listeners::new(),
            unavailable: AtomicBool::new(false),
        }
    }
}

impl EventSource<DisplayEvent> for HeadlessDisplays {
    fn subscribe(&self, handler: EventHandler<DisplayEvent>) -> Result<SubscriptionId> {
        Ok(self.listeners.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.listeners.remove(subscription);
    }
}

impl DisplayProvider for HeadlessDisplays {
    fn displays(&self) -> Result<Vec<Display>> {
        self.check_available()?;
        Ok(lock(&self.displays).clone())
    }

    fn primary_display(&self) -> Result<Display> {
        self.check_available()?;
        lock(&self.displays)
            .first()
            .cloned()
            .ok_or_else(|| "no display attached".into())
    }

    fn cursor_position(&self) -> Result<Point> {
        self.check_available()?;
        Ok(*lock(&self.cursor))
    }
}

// ---------------- keyboard ----------------

#[derive(Default)]
pub struct HeadlessKeyboard {
    listeners: Listeners<KeyboardEvent>,
}

impl HeadlessKeyboard {
    pub fn simulate_key_pressed(&self, key: &str) {
        self.listeners
            .emit(&KeyboardEvent::KeyPressed(key.to_string()));
    }

    pub fn simulate_key_released(&self, key: &str) {
        self.listeners
            .emit(&KeyboardEvent::KeyReleased(key.to_string()));
    }

    pub fn simulate_modifiers_changed(&self, modifiers: ModifierKeys) {
        self.listeners
            .emit(&KeyboardEvent::ModifiersChanged(modifiers));
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl EventSource<KeyboardEvent> for HeadlessKeyboard {
    fn subscribe(&self, handler: EventHandler<KeyboardEvent>) -> Result<SubscriptionId> {
        Ok(self.listeners.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.listeners.remove(subscription);
    }
}

impl KeyboardProvider for HeadlessKeyboard {}

// ---------------- accessibility ----------------

#[derive(Default)]
pub struct HeadlessAccessibility {
    enabled: AtomicBool,
}

impl AccessibilityProvider for HeadlessAccessibility {
    fn enable(&self) -> Result<()> {
        self.enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_properties_follow_options() {
        let windows = HeadlessWindows::default();
        let options = WindowOptions {
            title: "Editor".into(),
            size: Size::new(640.0, 480.0),
            position: Some(Point::new(10.0, 20.0)),
            visible: false,
        };
        let window = windows.create_window(&options).unwrap();
        assert_eq!(window.title().unwrap(), "Editor");
        assert_eq!(window.size().unwrap(), Size::new(640.0, 480.0));
        assert_eq!(window.position().unwrap(), Point::new(10.0, 20.0));
        assert!(!window.is_visible().unwrap());
    }

    #[test]
    fn closed_window_rejects_property_access() {
        let windows = HeadlessWindows::default();
        let window = windows.create_window(&WindowOptions::default()).unwrap();
        window.close().unwrap();
        assert!(window.title().is_err());
        assert!(window.close().is_err());
    }

    #[test]
    fn closed_windows_are_dropped_from_the_provider() {
        let windows = HeadlessWindows::default();
        let kept = windows.create_window(&WindowOptions::default()).unwrap();
        let closed = windows.create_window(&WindowOptions::default()).unwrap();
        closed.close().unwrap();
        assert_eq!(windows.open_count(), 1);
        assert!(windows.window(closed.native_handle()).is_none());
        assert!(windows.window(kept.native_handle()).is_some());
    }

    #[test]
    fn focus_moves_foreground_and_emits_blur() {
        let windows = HeadlessWindows::default();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        windows
            .subscribe(Arc::new(move |event: &WindowEvent| {
                sink.lock().unwrap().push(event.clone());
            }))
            .unwrap();

        let first = windows.create_window(&WindowOptions::default()).unwrap();
        let second = windows.create_window(&WindowOptions::default()).unwrap();
        first.focus().unwrap();
        second.focus().unwrap();

        assert_eq!(windows.foreground_window(), Some(second.native_handle()));
        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                WindowEvent::Focused { handle: first.native_handle() },
                WindowEvent::Blurred { handle: first.native_handle() },
                WindowEvent::Focused { handle: second.native_handle() },
            ]
        );
    }

    #[test]
    fn fail_next_create_refuses_exactly_once() {
        let trays = HeadlessTrays::default();
        trays.fail_next_create();
        assert!(trays.create_tray().is_err());
        assert!(trays.create_tray().is_ok());
    }

    #[test]
    fn detach_reports_removed_display() {
        let displays = HeadlessDisplays::default();
        let mut second = HeadlessDisplays::default_display();
        second.id = "headless-1".into();
        displays.simulate_attach(second);
        assert_eq!(displays.displays().unwrap().len(), 2);
        assert!(displays.simulate_detach("headless-1"));
        assert!(!displays.simulate_detach("headless-1"));
        assert_eq!(displays.primary_display().unwrap().id, "headless-0");
    }

    #[test]
    fn unavailable_displays_fail_queries() {
        let displays = HeadlessDisplays::default();
        displays.set_unavailable(true);
        assert!(displays.displays().is_err());
        assert!(displays.cursor_position().is_err());
        displays.set_unavailable(false);
        assert!(displays.cursor_position().is_ok());
    }
}

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use nativeapi_platform::{
    EventHandler, EventSource, Listeners, NativeTray, Result, SubscriptionId, TrayEvent,
    TrayProvider,
};
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;
use tray_icon::{Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent, TrayIconId};

use crate::box_err;

const TRAY_ID_PREFIX: &str = "nativeapi-tray-";

static TRAY_LISTENERS: Lazy<Listeners<TrayEvent>> = Lazy::new(Listeners::new);
static EVENT_HANDLER: OnceCell<()> = OnceCell::new();

thread_local! {
    // `TrayIcon` is neither Send nor Sync; icons stay on the thread that made them.
    static ICONS: RefCell<HashMap<u64, TrayIcon>> = RefCell::new(HashMap::new());
}

fn tray_id(handle: u64) -> TrayIconId {
    TrayIconId::new(format!("{TRAY_ID_PREFIX}{handle}"))
}

fn handle_from_id(id: &TrayIconId) -> Option<u64> {
    id.as_ref().strip_prefix(TRAY_ID_PREFIX)?.parse().ok()
}

fn install_event_handler() {
    EVENT_HANDLER.get_or_init(|| {
        TrayIconEvent::set_event_handler(Some(|event: TrayIconEvent| {
            let Some(handle) = handle_from_id(event.id()) else {
                return;
            };
            let tray_event = match event {
                TrayIconEvent::Click {
                    button: MouseButton::Left,
                    button_state: MouseButtonState::Up,
                    ..
                } => TrayEvent::Clicked { handle },
                TrayIconEvent::Click {
                    button: MouseButton::Right,
                    button_state: MouseButtonState::Up,
                    ..
                } => TrayEvent::RightClicked { handle },
                TrayIconEvent::DoubleClick {
                    button: MouseButton::Left,
                    ..
                } => TrayEvent::DoubleClicked { handle },
                _ => return,
            };
            TRAY_LISTENERS.emit(&tray_event);
        }));
    });
}

fn with_icon<T>(handle: u64, f: impl FnOnce(&TrayIcon) -> Result<T>) -> Result<T> {
    ICONS.with(|icons| match icons.borrow().get(&handle) {
        Some(icon) => f(icon),
        None => Err(format!("tray {handle} is removed or owned by another thread").into()),
    })
}

fn load_icon(path: &str) -> Result<Icon> {
    let image = image::open(path).map_err(box_err)?.into_rgba8();
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height).map_err(box_err)
}

#[derive(Default)]
struct TrayText {
    title: String,
    tooltip: String,
}

pub struct WinTray {
    handle: u64,
    text: Mutex<TrayText>,
}

impl NativeTray for WinTray {
    fn native_handle(&self) -> u64 {
        self.handle
    }

    fn set_icon(&self, path: &str) -> Result<()> {
        let icon = load_icon(path)?;
        with_icon(self.handle, |tray| tray.set_icon(Some(icon)).map_err(box_err))
    }

    fn title(&self) -> Result<String> {
        with_icon(self.handle, |_| Ok(()))?;
        Ok(self.text.lock().unwrap_or_else(PoisonError::into_inner).title.clone())
    }

    fn set_title(&self, title: &str) -> Result<()> {
        // The taskbar has no title slot; it is kept for `title()`.
        with_icon(self.handle, |tray| {
            tray.set_title(Some(title));
            Ok(())
        })?;
        self.text.lock().unwrap_or_else(PoisonError::into_inner).title = title.to_string();
        Ok(())
    }

    fn tooltip(&self) -> Result<String> {
        with_icon(self.handle, |_| Ok(()))?;
        Ok(self.text.lock().unwrap_or_else(PoisonError::into_inner).tooltip.clone())
    }

    fn set_tooltip(&self, tooltip: &str) -> Result<()> {
        with_icon(self.handle, |tray| tray.set_tooltip(Some(tooltip)).map_err(box_err))?;
        self.text.lock().unwrap_or_else(PoisonError::into_inner).tooltip = tooltip.to_string();
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let icon = ICONS.with(|icons| icons.borrow_mut().remove(&self.handle));
        match icon {
            Some(icon) => {
                drop(icon);
                debug!(handle = self.handle, "tray icon removed");
                Ok(())
            }
            None => Err(format!("tray {} is removed or owned by another thread", self.handle).into()),
        }
    }
}

#[derive(Default)]
pub struct WinTrays {
    next_handle: AtomicU64,
}

impl WinTrays {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource<TrayEvent> for WinTrays {
    fn subscribe(&self, handler: EventHandler<TrayEvent>) -> Result<SubscriptionId> {
        install_event_handler();
        Ok(TRAY_LISTENERS.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        TRAY_LISTENERS.remove(subscription);
    }
}

impl TrayProvider for WinTrays {
    fn create_tray(&self) -> Result<Arc<dyn NativeTray>> {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        let icon = TrayIconBuilder::new()
            .with_id(tray_id(handle))
            .build()
            .map_err(box_err)?;
        ICONS.with(|icons| icons.borrow_mut().insert(handle, icon));
        debug!(handle, "tray icon created");
        Ok(Arc::new(WinTray {
            handle,
            text: Mutex::new(TrayText::default()),
        }))
    }
}

use std::ffi::c_void;
use std::mem::size_of;
use std::sync::{Mutex, PoisonError};

use nativeapi_platform::{
    Display, DisplayEvent, DisplayProvider, EventHandler, EventSource, Listeners, Point, Result,
    Size, SubscriptionId,
};
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};
use windows::core::{Error, PCWSTR};
use windows::Win32::Foundation::{BOOL, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, HBRUSH, HDC, HMONITOR, MONITORINFO, MONITORINFOEXW,
};
use windows::Win32::UI::HiDpi::{GetDpiForMonitor, MDT_EFFECTIVE_DPI};
use windows::Win32::UI::WindowsAndMessaging::*;

pub const LISTENER_CLASS_NAME: PCWSTR = windows::core::w!("NativeApiDisplayListenerClass");

const MONITORINFOF_PRIMARY: u32 = 1;

/// Hidden top-level window receiving `WM_DISPLAYCHANGE`, plus the layout seen
/// at the last change.
struct DisplayWatch {
    listeners: Listeners<DisplayEvent>,
    known: Mutex<Vec<Display>>,
    hwnd_value: Mutex<Option<isize>>,
}

static WATCH: Lazy<DisplayWatch> = Lazy::new(|| DisplayWatch {
    listeners: Listeners::new(),
    known: Mutex::new(Vec::new()),
    hwnd_value: Mutex::new(None),
});

struct Monitor {
    display: Display,
    primary: bool,
}

fn enumerate_monitors() -> Result<Vec<Monitor>> {
    unsafe extern "system" fn enum_proc(
        hmonitor: HMONITOR,
        _hdc: HDC,
        _lprc: *mut RECT,
        lparam: LPARAM,
    ) -> BOOL {
        let data_ptr = lparam.0 as *mut Vec<Monitor>;
        if data_ptr.is_null() {
            return BOOL(0);
        }
        let data = &mut *data_ptr;
        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = size_of::<MONITORINFOEXW>() as u32;
        if !GetMonitorInfoW(hmonitor, &mut info as *mut MONITORINFOEXW as *mut MONITORINFO).as_bool() {
            return BOOL(1);
        }
        let device_len = info
            .szDevice
            .iter()
            .position(|unit| *unit == 0)
            .unwrap_or(info.szDevice.len());
        let device = String::from_utf16_lossy(&info.szDevice[..device_len]);
        let bounds = info.monitorInfo.rcMonitor;
        let work = info.monitorInfo.rcWork;
        let mut dpi_x = 96u32;
        let mut dpi_y = 96u32;
        if let Err(err) = GetDpiForMonitor(hmonitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y) {
            warn!("GetDpiForMonitor failed for monitor {:?}: {err}", hmonitor.0);
            dpi_x = 96;
        }
        data.push(Monitor {
            display: Display {
                id: device.clone(),
                name: device,
                width: f64::from(bounds.right - bounds.left),
                height: f64::from(bounds.bottom - bounds.top),
                visible_position: Point::new(f64::from(work.left), f64::from(work.top)),
                visible_size: Size::new(
                    f64::from(work.right - work.left),
                    f64::from(work.bottom - work.top),
                ),
                scale_factor: f64::from(dpi_x) / 96.0,
            },
            primary: info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY != 0,
        });
        BOOL(1)
    }

    let mut monitors: Vec<Monitor> = Vec::new();
    let lparam = LPARAM(&mut monitors as *mut _ as isize);
    unsafe {
        let result = EnumDisplayMonitors(None, None, Some(enum_proc), lparam);
        if result == BOOL(0) {
            return Err(Error::from_win32().into());
        }
    }
    Ok(monitors)
}

fn current_displays() -> Result<Vec<Display>> {
    Ok(enumerate_monitors()?
        .into_iter()
        .map(|monitor| monitor.display)
        .collect())
}

/// Compare the new layout with the last one and report the difference.
fn handle_display_change(reason: &str) {
    let current = match current_displays() {
        Ok(current) => current,
        Err(err) => {
            warn!("failed to enumerate displays after {reason}: {err}");
            return;
        }
    };
    let previous = std::mem::replace(
        &mut *WATCH.known.lock().unwrap_or_else(PoisonError::into_inner),
        current.clone(),
    );
    let removed: Vec<&Display> = previous
        .iter()
        .filter(|old| !current.iter().any(|new| new.id == old.id))
        .collect();
    let added: Vec<&Display> = current
        .iter()
        .filter(|new| !previous.iter().any(|old| old.id == new.id))
        .collect();
    info!(
        "display layout after {reason}: {} displays, {} added, {} removed",
        current.len(),
        added.len(),
        removed.len()
    );
    for display in removed {
        WATCH.listeners.emit(&DisplayEvent::Removed(display.clone()));
    }
    for display in added {
        WATCH.listeners.emit(&DisplayEvent::Added(display.clone()));
    }
}

pub unsafe extern "system" fn handle_listener_message(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_DISPLAYCHANGE => handle_display_change("display change"),
        WM_DEVICECHANGE if wparam.0 as u32 == DBT_DEVNODES_CHANGED => {
            handle_display_change("device nodes changed")
        }
        _ => {}
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

unsafe fn create_listener_window(hinstance: HINSTANCE) -> Result<HWND> {
    let window_class = WNDCLASSW {
        lpfnWndProc: Some(handle_listener_message),
        hInstance: hinstance,
        hbrBackground: HBRUSH(std::ptr::null_mut()),
        lpszClassName: LISTENER_CLASS_NAME,
        ..Default::default()
    };
    let _atom = RegisterClassW(&window_class);
    // Message-only windows miss broadcasts, so this one is a hidden popup.
    let hwnd = CreateWindowExW(
        WINDOW_EX_STYLE(WS_EX_TOOLWINDOW.0 | WS_EX_NOACTIVATE.0),
        LISTENER_CLASS_NAME,
        windows::core::w!("NativeApi Display Listener"),
        WS_POPUP,
        0,
        0,
        0,
        0,
        None,
        None,
        hinstance,
        None,
    )?;
    Ok(hwnd)
}

pub struct WinDisplays {
    hinstance_value: isize,
}

impl WinDisplays {
    pub fn new(hinstance: HINSTANCE) -> Self {
        Self {
            hinstance_value: hinstance.0 as isize,
        }
    }

    fn ensure_listener(&self) -> Result<()> {
        let mut hwnd_value = WATCH.hwnd_value.lock().unwrap_or_else(PoisonError::into_inner);
        if hwnd_value.is_some() {
            return Ok(());
        }
        let hinstance = HINSTANCE(self.hinstance_value as *mut c_void);
        let hwnd = unsafe { create_listener_window(hinstance)? };
        *hwnd_value = Some(hwnd.0 as isize);
        *WATCH.known.lock().unwrap_or_else(PoisonError::into_inner) = current_displays()?;
        debug!("display listener window created");
        Ok(())
    }
}

impl EventSource<DisplayEvent> for WinDisplays {
    fn subscribe(&self, handler: EventHandler<DisplayEvent>) -> Result<SubscriptionId> {
        self.ensure_listener()?;
        Ok(WATCH.listeners.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        WATCH.listeners.remove(subscription);
    }
}

impl DisplayProvider for WinDisplays {
    fn displays(&self) -> Result<Vec<Display>> {
        current_displays()
    }

    fn primary_display(&self) -> Result<Display> {
        enumerate_monitors()?
            .into_iter()
            .find(|monitor| monitor.primary)
            .map(|monitor| monitor.display)
            .ok_or_else(|| "no primary display".into())
    }

    fn cursor_position(&self) -> Result<Point> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point)? };
        Ok(Point::new(f64::from(point.x), f64::from(point.y)))
    }
}

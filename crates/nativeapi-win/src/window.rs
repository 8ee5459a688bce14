use std::ffi::c_void;
use std::sync::Arc;

use nativeapi_platform::{
    EventHandler, EventSource, Listeners, NativeWindow, Point, Result, Size, SubscriptionId,
    WindowEvent, WindowOptions, WindowProvider,
};
use once_cell::sync::{Lazy, OnceCell};
use tracing::{debug, warn};
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::HBRUSH;
use windows::Win32::UI::WindowsAndMessaging::*;

pub const WINDOW_CLASS_NAME: PCWSTR = windows::core::w!("NativeApiWindowClass");

// The window procedure has no context pointer, so every window reports here.
static WINDOW_LISTENERS: Lazy<Listeners<WindowEvent>> = Lazy::new(Listeners::new);
static WINDOW_CLASS: OnceCell<isize> = OnceCell::new();

unsafe fn register_window_class(hinstance: HINSTANCE) -> PCWSTR {
    let window_class = WNDCLASSW {
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(handle_window_message),
        hInstance: hinstance,
        hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
        hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
        hbrBackground: HBRUSH(std::ptr::null_mut()),
        lpszClassName: WINDOW_CLASS_NAME,
        ..Default::default()
    };
    if RegisterClassW(&window_class) == 0 {
        warn!("RegisterClassW failed: {}", windows::core::Error::from_win32());
    }
    WINDOW_CLASS_NAME
}

fn handle_of(hwnd: HWND) -> u64 {
    hwnd.0 as usize as u64
}

unsafe fn window_rect(hwnd: HWND) -> Result<RECT> {
    let mut rect = RECT::default();
    GetWindowRect(hwnd, &mut rect)?;
    Ok(rect)
}

pub struct WinWindow {
    hwnd_value: isize,
}

impl WinWindow {
    fn hwnd(&self) -> HWND {
        HWND(self.hwnd_value as *mut c_void)
    }
}

impl NativeWindow for WinWindow {
    fn native_handle(&self) -> u64 {
        handle_of(self.hwnd())
    }

    fn title(&self) -> Result<String> {
        unsafe {
            let len = GetWindowTextLengthW(self.hwnd());
            let mut buffer = vec![0u16; len.max(0) as usize + 1];
            let copied = GetWindowTextW(self.hwnd(), &mut buffer);
            Ok(String::from_utf16_lossy(&buffer[..copied.max(0) as usize]))
        }
    }

    fn set_title(&self, title: &str) -> Result<()> {
        unsafe { SetWindowTextW(self.hwnd(), &HSTRING::from(title))? };
        Ok(())
    }

    fn size(&self) -> Result<Size> {
        let rect = unsafe { window_rect(self.hwnd())? };
        Ok(Size::new(
            f64::from(rect.right - rect.left),
            f64::from(rect.bottom - rect.top),
        ))
    }

    fn set_size(&self, size: Size) -> Result<()> {
        unsafe {
            SetWindowPos(
                self.hwnd(),
                HWND(std::ptr::null_mut()),
                0,
                0,
                size.width.round() as i32,
                size.height.round() as i32,
                SWP_NOMOVE | SWP_NOZORDER | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }

    fn position(&self) -> Result<Point> {
        let rect = unsafe { window_rect(self.hwnd())? };
        Ok(Point::new(f64::from(rect.left), f64::from(rect.top)))
    }

    fn set_position(&self, position: Point) -> Result<()> {
        unsafe {
            SetWindowPos(
                self.hwnd(),
                HWND(std::ptr::null_mut()),
                position.x.round() as i32,
                position.y.round() as i32,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }

    fn is_visible(&self) -> Result<bool> {
        Ok(unsafe { IsWindowVisible(self.hwnd()) }.as_bool())
    }

    fn set_visible(&self, visible: bool) -> Result<()> {
        let command = if visible { SW_SHOW } else { SW_HIDE };
        // Returns the previous visibility, not an error.
        let _ = unsafe { ShowWindow(self.hwnd(), command) };
        Ok(())
    }

    fn focus(&self) -> Result<()> {
        if unsafe { SetForegroundWindow(self.hwnd()) }.as_bool() {
            Ok(())
        } else {
            Err(format!(
                "window {:#x} could not be brought to the foreground",
                self.native_handle()
            )
            .into())
        }
    }

    fn close(&self) -> Result<()> {
        unsafe { DestroyWindow(self.hwnd())? };
        Ok(())
    }
}

pub struct WinWindows {
    hinstance_value: isize,
    class_name_ptr: isize,
}

impl WinWindows {
    pub fn new(hinstance: HINSTANCE) -> Self {
        let class_name_ptr =
            *WINDOW_CLASS.get_or_init(|| unsafe { register_window_class(hinstance).0 as isize });
        Self {
            hinstance_value: hinstance.0 as isize,
            class_name_ptr,
        }
    }
}

impl EventSource<WindowEvent> for WinWindows {
    fn subscribe(&self, handler: EventHandler<WindowEvent>) -> Result<SubscriptionId> {
        Ok(WINDOW_LISTENERS.add(handler))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        WINDOW_LISTENERS.remove(subscription);
    }
}

impl WindowProvider for WinWindows {
    fn create_window(&self, options: &WindowOptions) -> Result<Arc<dyn NativeWindow>> {
        let hinstance = HINSTANCE(self.hinstance_value as *mut c_void);
        let (x, y) = match options.position {
            Some(position) => (position.x.round() as i32, position.y.round() as i32),
            None => (CW_USEDEFAULT, CW_USEDEFAULT),
        };
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                PCWSTR(self.class_name_ptr as *const u16),
                &HSTRING::from(options.title.as_str()),
                WS_OVERLAPPEDWINDOW,
                x,
                y,
                options.size.width.round() as i32,
                options.size.height.round() as i32,
                None,
                None,
                hinstance,
                None,
            )?
        };
        if options.visible {
            let _ = unsafe { ShowWindow(hwnd, SW_SHOW) };
        }
        debug!(handle = handle_of(hwnd), "window created");
        Ok(Arc::new(WinWindow {
            hwnd_value: hwnd.0 as isize,
        }))
    }

    fn foreground_window(&self) -> Option<u64> {
        let hwnd = unsafe { GetForegroundWindow() };
        (!hwnd.0.is_null()).then(|| handle_of(hwnd))
    }
}

unsafe fn report_geometry(hwnd: HWND, msg: u32) {
    let rect = match window_rect(hwnd) {
        Ok(rect) => rect,
        Err(err) => {
            warn!("GetWindowRect failed for {:#x}: {err}", handle_of(hwnd));
            return;
        }
    };
    let handle = handle_of(hwnd);
    let event = if msg == WM_SIZE {
        WindowEvent::Resized {
            handle,
            size: Size::new(
                f64::from(rect.right - rect.left),
                f64::from(rect.bottom - rect.top),
            ),
        }
    } else {
        WindowEvent::Moved {
            handle,
            position: Point::new(f64::from(rect.left), f64::from(rect.top)),
        }
    };
    WINDOW_LISTENERS.emit(&event);
}

pub unsafe extern "system" fn handle_window_message(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let handle = handle_of(hwnd);
    match msg {
        WM_SETFOCUS => WINDOW_LISTENERS.emit(&WindowEvent::Focused { handle }),
        WM_KILLFOCUS => WINDOW_LISTENERS.emit(&WindowEvent::Blurred { handle }),
        WM_SIZE | WM_MOVE => report_geometry(hwnd, msg),
        WM_DESTROY => WINDOW_LISTENERS.emit(&WindowEvent::Closed { handle }),
        _ => {}
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}

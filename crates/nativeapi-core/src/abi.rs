//! Fixed-layout records and callback signatures of the C boundary.
//!
//! Records carrying `*mut c_char` own their strings; release them with the
//! matching free function exported next to the getter that produced them.

use std::os::raw::c_char;

use nativeapi_platform::{Point, Size};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NativePoint {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for NativePoint {
    fn from(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

impl From<NativePoint> for Point {
    fn from(point: NativePoint) -> Self {
        Point::new(point.x, point.y)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NativeSize {
    pub width: f64,
    pub height: f64,
}

impl From<Size> for NativeSize {
    fn from(size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

impl From<NativeSize> for Size {
    fn from(size: NativeSize) -> Self {
        Size::new(size.width, size.height)
    }
}

#[repr(C)]
#[derive(Debug)]
pub struct NativeDisplay {
    pub id: *mut c_char,
    pub name: *mut c_char,
    pub width: f64,
    pub height: f64,
    pub visible_position_x: f64,
    pub visible_position_y: f64,
    pub visible_size_width: f64,
    pub visible_size_height: f64,
    pub scale_factor: f64,
}

impl NativeDisplay {
    pub const fn empty() -> Self {
        Self {
            id: std::ptr::null_mut(),
            name: std::ptr::null_mut(),
            width: 0.0,
            height: 0.0,
            visible_position_x: 0.0,
            visible_position_y: 0.0,
            visible_size_width: 0.0,
            visible_size_height: 0.0,
            scale_factor: 0.0,
        }
    }
}

/// Creation options passed by the caller. `title` is borrowed for the
/// duration of the call and may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NativeWindowOptions {
    pub title: *const c_char,
    pub size: NativeSize,
    pub position: NativePoint,
    pub has_position: bool,
    pub visible: bool,
}

/// `count` always equals the number of records behind `displays`.
#[repr(C)]
#[derive(Debug)]
pub struct NativeDisplayList {
    pub displays: *mut NativeDisplay,
    pub count: i64,
}

/// `count` always equals the number of ids behind `ids`; `ids` is non-null
/// even when `count` is zero.
#[repr(C)]
#[derive(Debug)]
pub struct NativeIdList {
    pub ids: *mut i64,
    pub count: i64,
}

pub type WindowCallback = extern "C" fn(window_id: i64);
pub type WindowResizedCallback = extern "C" fn(window_id: i64, size: NativeSize);
pub type WindowMovedCallback = extern "C" fn(window_id: i64, position: NativePoint);
pub type TrayCallback = extern "C" fn(tray_id: i64);
/// The callee owns the strings inside `display`.
pub type DisplayCallback = extern "C" fn(display: NativeDisplay);
/// The callee owns `key`.
pub type KeyCallback = extern "C" fn(key: *mut c_char);
pub type ModifierKeysCallback = extern "C" fn(modifier_keys: u32);
/// The callee owns `topic` and `message`.
pub type BroadcastReceivedCallback = extern "C" fn(topic: *mut c_char, message: *mut c_char);

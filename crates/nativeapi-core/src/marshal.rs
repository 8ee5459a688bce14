//! Conversion of internal data into independently owned boundary values and
//! back. Every allocation made here is fresh per call and is released by
//! exactly one matching `free_*` function.

use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::os::raw::c_char;

use nativeapi_platform::Display;

use crate::abi::{NativeDisplay, NativeDisplayList, NativeIdList};
use crate::error::{Error, Result};
use crate::id::ResourceId;

/// Copy `value` into a new NUL-terminated buffer owned by the caller.
pub fn string(value: &str) -> Result<*mut c_char> {
    CString::new(value)
        .map(CString::into_raw)
        .map_err(|err| Error::MarshalSkipped {
            reason: format!("string has an interior NUL at byte {}", err.nul_position()),
        })
}

/// # Safety
/// `ptr` must be null or come from [`string`] and not have been freed.
pub unsafe fn free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Borrow a caller-provided string. Null and non UTF-8 input yield `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated buffer that outlives `'a`.
pub unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

// Zero-length arrays still get a one-element allocation so the pointer is
// never dangling. `with_capacity` allocates exactly the requested capacity.
fn leak_array<T>(items: Vec<T>) -> (*mut T, i64) {
    let count = items.len();
    let mut buffer = Vec::with_capacity(count.max(1));
    buffer.extend(items);
    let mut buffer = ManuallyDrop::new(buffer);
    (buffer.as_mut_ptr(), count as i64)
}

unsafe fn reclaim_array<T>(ptr: *mut T, count: i64) -> Vec<T> {
    let count = usize::try_from(count).unwrap_or(0);
    Vec::from_raw_parts(ptr, count, count.max(1))
}

pub fn id_list(ids: &[ResourceId]) -> NativeIdList {
    let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
    let (ids, count) = leak_array(raw);
    NativeIdList { ids, count }
}

/// # Safety
/// `list` must come from [`id_list`] and not have been freed.
pub unsafe fn free_id_list(list: NativeIdList) {
    if !list.ids.is_null() {
        drop(reclaim_array(list.ids, list.count));
    }
}

pub fn display(display: &Display) -> Result<NativeDisplay> {
    let id = string(&display.id)?;
    let name = match string(&display.name) {
        Ok(name) => name,
        Err(err) => {
            // SAFETY: `id` was produced by `string` above and is not shared.
            unsafe { free_string(id) };
            return Err(err);
        }
    };
    Ok(NativeDisplay {
        id,
        name,
        width: display.width,
        height: display.height,
        visible_position_x: display.visible_position.x,
        visible_position_y: display.visible_position.y,
        visible_size_width: display.visible_size.width,
        visible_size_height: display.visible_size.height,
        scale_factor: display.scale_factor,
    })
}

/// Release the strings of `display` and null them out; a second call is a
/// no-op.
///
/// # Safety
/// The string fields must be null or come from [`display`].
pub unsafe fn free_display(display: &mut NativeDisplay) {
    free_string(std::mem::replace(&mut display.id, std::ptr::null_mut()));
    free_string(std::mem::replace(&mut display.name, std::ptr::null_mut()));
}

/// Displays that cannot be marshalled are left out, so `count` always matches
/// the records actually present.
pub fn display_list(displays: &[Display]) -> NativeDisplayList {
    let records: Vec<NativeDisplay> = displays
        .iter()
        .filter_map(|item| match display(item) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(display = %item.id, "skipping display: {err}");
                None
            }
        })
        .collect();
    let (displays, count) = leak_array(records);
    NativeDisplayList { displays, count }
}

/// # Safety
/// `list` must come from [`display_list`] and not have been freed.
pub unsafe fn free_display_list(list: NativeDisplayList) {
    if list.displays.is_null() {
        return;
    }
    for mut record in reclaim_array(list.displays, list.count) {
        free_display(&mut record);
    }
}

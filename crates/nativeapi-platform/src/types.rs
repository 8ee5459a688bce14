use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A physical display as reported by the OS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Display {
    /// OS-supplied identifier, stable while the display stays attached.
    pub id: String,
    pub name: String,
    pub width: f64,
    pub height: f64,
    /// Work area origin (excludes taskbar / menu bar).
    pub visible_position: Point,
    pub visible_size: Size,
    pub scale_factor: f64,
}

/// Parameters for creating a window. Missing fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowOptions {
    pub title: String,
    pub size: Size,
    pub position: Option<Point>,
    pub visible: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            size: Size::new(800.0, 600.0),
            position: None,
            visible: true,
        }
    }
}

bitflags::bitflags! {
    /// Bitmask of held modifier keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(from = "u32", into = "u32")]
    pub struct ModifierKeys: u32 {
        const SHIFT = 1;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
        const FN = 1 << 4;
    }
}

impl ModifierKeys {
    pub const NONE: Self = Self::empty();
}

impl Default for ModifierKeys {
    fn default() -> Self {
        Self::NONE
    }
}

/// Unknown bits are discarded.
impl From<u32> for ModifierKeys {
    fn from(bits: u32) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl From<ModifierKeys> for u32 {
    fn from(keys: ModifierKeys) -> Self {
        keys.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_keys_combine_with_or() {
        let mut keys = ModifierKeys::SHIFT | ModifierKeys::CTRL;
        assert!(keys.contains(ModifierKeys::SHIFT));
        assert!(keys.contains(ModifierKeys::CTRL));
        assert!(!keys.contains(ModifierKeys::ALT));
        keys |= ModifierKeys::FN;
        assert_eq!(keys.bits(), 0b1_0011);
    }

    #[test]
    fn modifier_keys_drop_unknown_bits() {
        let keys = ModifierKeys::from_bits_truncate(0xFFFF_FF00 | 0b100);
        assert_eq!(keys, ModifierKeys::ALT);
    }

    #[test]
    fn modifier_keys_debug_lists_held_flags() {
        assert!(ModifierKeys::default().is_empty());
        assert_eq!(
            format!("{:?}", ModifierKeys::META | ModifierKeys::SHIFT),
            "ModifierKeys(SHIFT | META)"
        );
    }

    #[test]
    fn window_options_default_to_untitled_visible_window() {
        let options = WindowOptions::default();
        assert_eq!(options.title, "");
        assert_eq!(options.size, Size::new(800.0, 600.0));
        assert_eq!(options.position, None);
        assert!(options.visible);
    }
}

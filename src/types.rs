/*
 * Platform-agnostic value types shared by the router, the controls and the
 * native backends: identities, geometry, colors, virtual key codes and the
 * configuration structs used to construct windows and child controls.
 */
use std::sync::atomic::{AtomicU32, Ordering};

/// Logical identity of a control. Allocated monotonically from 1, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub(crate) u32);

impl ControlId {
    /// Reserved "no control" value.
    pub const NONE: ControlId = ControlId(0);

    pub const fn new(raw: u32) -> Self {
        ControlId(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn next() -> Self {
        static NEXT_CONTROL_ID: AtomicU32 = AtomicU32::new(1);
        ControlId(NEXT_CONTROL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque handle issued by the windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle(pub usize);

impl NativeHandle {
    pub const NULL: NativeHandle = NativeHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// The closed set of control kinds. Kind-specific message handling lives in
/// `controls::*_handler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Window,
    Button,
    Label,
    Panel,
}

impl ControlKind {
    pub fn is_top_level(self) -> bool {
        matches!(self, ControlKind::Window)
    }

    /// Whether Tab navigation stops on controls of this kind.
    pub fn is_tab_stop(self) -> bool {
        matches!(self, ControlKind::Button)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Size { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn from_location_size(location: Point, size: Size) -> Self {
        Rect {
            left: location.x,
            top: location.y,
            right: location.x + size.width,
            bottom: location.y + size.height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

/// Margin or padding, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spacing {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Spacing {
    pub const fn all(value: i32) -> Self {
        Spacing {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Default face color of buttons and panels.
    pub const CONTROL: Color = Color::rgb(225, 225, 225);
    /// Default window background.
    pub const WINDOW: Color = Color::rgb(240, 240, 240);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }
}

/// Win32-compatible virtual key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualKey(pub u32);

impl VirtualKey {
    pub const TAB: VirtualKey = VirtualKey(0x09);
    pub const RETURN: VirtualKey = VirtualKey(0x0D);
    pub const SHIFT: VirtualKey = VirtualKey(0x10);
    pub const ESCAPE: VirtualKey = VirtualKey(0x1B);
    pub const SPACE: VirtualKey = VirtualKey(0x20);

    /// Letter and digit keys share their uppercase ASCII code.
    pub fn from_char(c: char) -> Self {
        VirtualKey(c.to_ascii_uppercase() as u32)
    }

    pub fn index(self) -> Option<usize> {
        let index = self.0 as usize;
        (index < 256).then_some(index)
    }
}

/// Construction parameters of a top-level window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
    /// Key whose release toggles raw input mode in the frame loop; `None` disables it.
    pub raw_toggle_key: Option<VirtualKey>,
    /// Start with the cursor hidden and the mouse in raw mode.
    pub start_in_raw_mode: bool,
    /// Deliver repeated key-down messages to the keyboard buffer.
    pub keyboard_autorepeat: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "Window".to_string(),
            width: 800,
            height: 600,
            raw_toggle_key: Some(VirtualKey::ESCAPE),
            start_in_raw_mode: false,
            keyboard_autorepeat: false,
        }
    }
}

/// Construction parameters of a child control.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlConfig {
    pub text: String,
    pub location: Point,
    pub size: Size,
}

impl ControlConfig {
    pub fn new(text: impl Into<String>, width: i32, height: i32, x: i32, y: i32) -> Self {
        ControlConfig {
            text: text.into(),
            location: Point::new(x, y),
            size: Size::new(width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_ids_are_monotonic_and_skip_none() {
        let first = ControlId::next();
        let second = ControlId::next();
        assert_ne!(first, ControlId::NONE);
        assert!(second > first);
    }

    #[test]
    fn virtual_key_from_char_uses_uppercase_code() {
        assert_eq!(VirtualKey::from_char('w'), VirtualKey(0x57));
        assert_eq!(VirtualKey::from_char('W').index(), Some(0x57));
        assert_eq!(VirtualKey(300).index(), None);
    }

    #[test]
    fn rect_contains_is_half_open() {
        let rect = Rect::from_location_size(Point::new(10, 10), Size::new(5, 5));
        assert!(rect.contains(Point::new(10, 10)));
        assert!(!rect.contains(Point::new(15, 12)));
    }
}

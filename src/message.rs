/*
 * Platform-neutral form of the native messages the router consumes. The Win32
 * glue decodes `(msg, wparam, lparam)` into a `Message`; the headless backend
 * produces them directly. Handlers answer with a `MessageResult`, which the
 * native side maps back onto its "handled" / "default processing" convention.
 */
use crate::control::Control;
use crate::types::{ControlId, Point, VirtualKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone)]
pub enum Message {
    /// First message for a new handle; carries the control passed through the
    /// native creation parameters.
    Create { control: Control },
    Destroy,
    Close,
    Activate { active: bool },
    Paint,
    EraseBackground,
    KeyDown { key: VirtualKey, repeat: bool },
    KeyUp { key: VirtualKey },
    Char { character: char },
    MouseMove { position: Point },
    MouseEnter,
    MouseLeave,
    MouseDown { button: MouseButton, position: Point },
    MouseUp { button: MouseButton, position: Point },
    DoubleClick { button: MouseButton, position: Point },
    MouseWheel { delta: i32, position: Point },
    RawMouse { dx: i32, dy: i32 },
    FocusEnter,
    FocusLeave,
    Command { id: u16, notification: u16 },
    /// Tab navigation request sent by a child to its enclosing window.
    NextControl { from: ControlId, reverse: bool },
}

impl Message {
    pub fn name(&self) -> &'static str {
        match self {
            Message::Create { .. } => "Create",
            Message::Destroy => "Destroy",
            Message::Close => "Close",
            Message::Activate { .. } => "Activate",
            Message::Paint => "Paint",
            Message::EraseBackground => "EraseBackground",
            Message::KeyDown { .. } => "KeyDown",
            Message::KeyUp { .. } => "KeyUp",
            Message::Char { .. } => "Char",
            Message::MouseMove { .. } => "MouseMove",
            Message::MouseEnter => "MouseEnter",
            Message::MouseLeave => "MouseLeave",
            Message::MouseDown { .. } => "MouseDown",
            Message::MouseUp { .. } => "MouseUp",
            Message::DoubleClick { .. } => "DoubleClick",
            Message::MouseWheel { .. } => "MouseWheel",
            Message::RawMouse { .. } => "RawMouse",
            Message::FocusEnter => "FocusEnter",
            Message::FocusLeave => "FocusLeave",
            Message::Command { .. } => "Command",
            Message::NextControl { .. } => "NextControl",
        }
    }
}

/// Outcome of handling one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageResult {
    /// The handler consumed the message; the value is returned to the OS.
    Handled(isize),
    /// Pass the message on to the native default procedure.
    Default,
}

impl MessageResult {
    pub fn is_handled(self) -> bool {
        matches!(self, MessageResult::Handled(_))
    }
}

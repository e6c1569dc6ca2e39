/*
 * The seam between the control layer and the windowing system. Everything the
 * router, the controls and the application loop ask of the OS goes through
 * `NativeBackend`, which keeps the routing logic portable: `Win32Backend` talks
 * to user32/gdi32, `HeadlessBackend` emulates the same synchronous message
 * semantics in-process.
 *
 * Contract shared by all backends:
 * - `create_window` delivers `Message::Create` to `router::handle_message_setup`
 *   before it returns, and binds the handle to `router::handle_message_forward`
 *   once the setup entry has registered it.
 * - `destroy_window` delivers `Message::Destroy` to the handle and then to each of
 *   its native descendants.
 * - `set_focus` delivers `FocusLeave` to the old focus and `FocusEnter` to the new.
 */
use crate::control::Control;
use crate::error::Result as PlatformResult;
use crate::message::{Message, MessageResult};
use crate::types::{Color, ControlKind, NativeHandle, Point, Rect, Size, VirtualKey};

/// Everything a backend needs to create the native counterpart of a control.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub control: Control,
    pub kind: ControlKind,
    pub parent: Option<NativeHandle>,
    pub text: String,
    pub location: Point,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub color: Color,
    pub width: i32,
}

/// A resolved description of one paint pass. Backends acquire their drawing
/// resources for it and release them before `paint` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintRequest {
    pub background: Color,
    pub foreground: Color,
    pub text: Option<String>,
    pub outer_border: Option<Border>,
    pub inner_border: Option<Border>,
    /// Dotted focus rectangle drawn inside the borders.
    pub focus_dots: Option<Color>,
}

impl PaintRequest {
    pub fn fill(background: Color) -> Self {
        PaintRequest {
            background,
            foreground: Color::BLACK,
            text: None,
            outer_border: None,
            inner_border: None,
            focus_dots: None,
        }
    }
}

pub trait NativeBackend {
    fn create_window(&self, request: &CreateRequest) -> PlatformResult<NativeHandle>;

    /// Destroys the native window. An already-destroyed handle is not an error.
    fn destroy_window(&self, handle: NativeHandle) -> PlatformResult<()>;

    /// Delivers `message` synchronously and returns the handler's result.
    fn send_message(&self, handle: NativeHandle, message: Message) -> MessageResult;

    /// Queues `message` for the next `pump_messages`.
    fn post_message(&self, handle: NativeHandle, message: Message);

    fn show_window(&self, handle: NativeHandle, visible: bool);

    fn enable_window(&self, handle: NativeHandle, enabled: bool);

    /// Requests a repaint of the whole client area.
    fn invalidate(&self, handle: NativeHandle);

    fn set_text(&self, handle: NativeHandle, text: &str) -> PlatformResult<()>;

    fn set_bounds(&self, handle: NativeHandle, bounds: Rect) -> PlatformResult<()>;

    fn set_focus(&self, handle: NativeHandle);

    fn set_capture(&self, handle: NativeHandle, captured: bool);

    /// Asks for a `MouseLeave` once the pointer leaves `handle`.
    fn track_mouse_leave(&self, handle: NativeHandle);

    /// Confines the cursor to the client area of `handle`, or frees it with `None`.
    fn confine_cursor(&self, handle: Option<NativeHandle>);

    fn set_cursor_visible(&self, visible: bool);

    /// Routes raw (relative) mouse input to `handle`.
    fn register_raw_mouse(&self, handle: NativeHandle) -> PlatformResult<()>;

    fn is_key_down(&self, key: VirtualKey) -> bool;

    /// Paints `handle`. Only valid while handling `Message::Paint` for it.
    fn paint(&self, handle: NativeHandle, request: &PaintRequest);

    /// Dispatches every queued message without blocking. Returns the exit code
    /// once a quit request has been dequeued.
    fn pump_messages(&self) -> Option<i32>;

    fn post_quit(&self, exit_code: i32);

    /// Blocking message box used by the top-level error boundary.
    fn show_message_box(&self, title: &str, text: &str);
}

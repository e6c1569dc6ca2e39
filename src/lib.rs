/*
 * windows-wrapper: a control framework over the Win32 windowing API with a
 * managed object model. Native window messages are routed to the `Control`
 * that owns the handle and surface as named, typed events; top-level windows
 * add a lifecycle, buffered keyboard/mouse input and a raw-input mode.
 *
 * Everything above the `NativeBackend` seam is portable. The Win32 backend and
 * its window procedures are compiled on Windows only; `HeadlessBackend` drives
 * the same routing in-process, so the crate builds and tests on every platform.
 */
pub mod app;
pub mod control;
pub(crate) mod controls;
pub mod error;
pub mod event;
pub mod headless;
pub mod input;
pub mod message;
pub mod native;
pub mod registry;
pub mod router;
pub(crate) mod runtime;
pub mod types;
#[cfg(target_os = "windows")]
pub mod win32_backend;
#[cfg(target_os = "windows")]
pub(crate) mod window_common;

pub use app::{Application, Frame, FrameLoopConfig, run_guarded};
pub use control::{Control, ControlState, InputMode, Window, WindowLifecycle};
pub use error::{PlatformError, Result as PlatformResult};
pub use event::{
    CancelEventArgs, CloseReason, ClosedEventArgs, ClosingEventArgs, CommandEventArgs, EventArgs,
    EventDispatcher, KeyEventArgs, KeyPressEventArgs, MouseEventArgs,
};
pub use headless::HeadlessBackend;
pub use input::{KeyEventKind, KeyboardEvent, MouseEvent, MouseEventKind, RawDelta};
pub use message::{Message, MessageResult, MouseButton};
pub use native::{Border, CreateRequest, NativeBackend, PaintRequest};
pub use types::{
    Color, ControlConfig, ControlId, ControlKind, NativeHandle, Point, Rect, Size, Spacing,
    VirtualKey, WindowConfig,
};
#[cfg(target_os = "windows")]
pub use win32_backend::Win32Backend;

/*
 * Win32 glue shared by the backend: window class registration, native window
 * creation, the two window procedures and the translation between raw
 * `(msg, wparam, lparam)` triples and `Message`.
 *
 * Every window of the class starts on `setup_wnd_proc`. When WM_NCCREATE
 * arrives it carries the `Control` (through `CreationContext` in
 * `lpCreateParams`); the setup entry of the router registers it, and once the
 * handle resolves the window procedure is swapped to `forward_wnd_proc`, which
 * only resolves and forwards.
 */
use crate::control::Control;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::message::{Message, MessageResult, MouseButton};
use crate::registry;
use crate::router;
use crate::types::{ControlId, ControlKind, NativeHandle, Point, VirtualKey};

use std::ffi::c_void;
use std::sync::OnceLock;

use windows::Win32::{
    Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM},
    Graphics::Gdi::{COLOR_WINDOW, HBRUSH, ScreenToClient},
    System::LibraryLoader::GetModuleHandleW,
    UI::Input::{
        GetRawInputData, HRAWINPUT, RAWINPUT, RAWINPUTHEADER, RID_INPUT, RIM_TYPEMOUSE,
    },
    UI::WindowsAndMessaging::*,
};
use windows::core::{HSTRING, PCWSTR, w};

/// Tab navigation request from a child to its enclosing window.
/// `wparam` carries the sender's `ControlId`, `lparam` is non-zero for Shift+Tab.
pub(crate) const WM_APP_NEXT_CONTROL: u32 = WM_APP + 0x200;

const WM_MOUSELEAVE: u32 = 0x02A3;

const CLASS_NAME: PCWSTR = w!("WindowsWrapper_ControlClass");
const WA_INACTIVE_CODE: i32 = 0;
const KEY_REPEAT_FLAG: isize = 0x4000_0000;

pub(crate) fn to_hwnd(handle: NativeHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

pub(crate) fn to_native_handle(hwnd: HWND) -> NativeHandle {
    NativeHandle(hwnd.0 as usize)
}

pub(crate) fn module_instance() -> PlatformResult<HINSTANCE> {
    let module = unsafe { GetModuleHandleW(None) }.map_err(|err| {
        PlatformError::InitializationFailed(format!("GetModuleHandleW failed: {err}"))
    })?;
    Ok(module.into())
}

/*
 * Registers the single window class used for windows and child controls. It
 * asks for double-click messages; all painting goes through WM_PAINT.
 * Registration happens once per process.
 */
pub(crate) fn register_window_class(instance: HINSTANCE) -> PlatformResult<()> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    let outcome = REGISTERED.get_or_init(|| unsafe {
        let mut existing = WNDCLASSEXW::default();
        if GetClassInfoExW(Some(instance), CLASS_NAME, &mut existing).is_ok() {
            log::debug!("Platform: window class already registered.");
            return Ok(());
        }
        let cursor = LoadCursorW(None, IDC_ARROW).map_err(|err| err.to_string())?;
        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW | CS_DBLCLKS,
            lpfnWndProc: Some(setup_wnd_proc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: instance,
            hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
            hCursor: cursor,
            hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as *mut c_void),
            lpszMenuName: PCWSTR::null(),
            lpszClassName: CLASS_NAME,
            hIconSm: HICON::default(),
        };
        if RegisterClassExW(&wc) == 0 {
            let error = GetLastError();
            log::error!("Platform: RegisterClassExW failed: {error:?}");
            Err(format!("RegisterClassExW failed: {error:?}"))
        } else {
            log::debug!("Platform: window class registered.");
            Ok(())
        }
    });
    outcome
        .clone()
        .map_err(PlatformError::InitializationFailed)
}

/// Passed through `lpCreateParams`; lives on the caller's stack for the
/// duration of `CreateWindowExW`.
struct CreationContext {
    control: Control,
}

pub(crate) struct NativeCreateParams<'a> {
    pub(crate) instance: HINSTANCE,
    pub(crate) control: &'a Control,
    pub(crate) kind: ControlKind,
    pub(crate) parent: Option<HWND>,
    pub(crate) text: &'a str,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
}

/*
 * Creates the native window. WM_NCCREATE (and with it registration) has run
 * by the time `CreateWindowExW` returns; a refusal there makes the call fail.
 */
pub(crate) fn create_native_window(params: &NativeCreateParams<'_>) -> PlatformResult<HWND> {
    let (style, x, y) = match params.kind {
        ControlKind::Window => (
            WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
        ),
        ControlKind::Panel => (WS_CHILD | WS_CLIPCHILDREN, params.x, params.y),
        ControlKind::Button | ControlKind::Label => (WS_CHILD, params.x, params.y),
    };
    let context = CreationContext {
        control: params.control.clone(),
    };
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            &HSTRING::from(params.text),
            style,
            x,
            y,
            params.width,
            params.height,
            params.parent,
            None,
            Some(params.instance),
            Some(&context as *const CreationContext as *const c_void),
        )
    }
    .map_err(|err| crate::native_error!(err.code().0 as u32))?;
    Ok(hwnd)
}

unsafe extern "system" fn setup_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let handle = to_native_handle(hwnd);
    if msg != WM_NCCREATE {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }
    let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
    let context_ptr = create_struct.lpCreateParams as *const CreationContext;
    if context_ptr.is_null() {
        log::warn!("Platform: WM_NCCREATE for {handle:?} without creation context.");
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }
    let control = unsafe { &*context_ptr }.control.clone();
    match router::handle_message_setup(handle, Message::Create { control }) {
        MessageResult::Handled(value) => return LRESULT(value),
        MessageResult::Default => {}
    }
    if registry::resolve(handle).is_some() {
        unsafe { SetWindowLongPtrW(hwnd, GWLP_WNDPROC, forward_wnd_proc as usize as isize) };
    }
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

unsafe extern "system" fn forward_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let Some(message) = decode_message(hwnd, msg, wparam, lparam) else {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    };
    match router::handle_message_forward(to_native_handle(hwnd), message) {
        MessageResult::Handled(value) => LRESULT(value),
        MessageResult::Default => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

#[inline]
pub(crate) fn loword_from_wparam(wparam: WPARAM) -> u16 {
    (wparam.0 & 0xFFFF) as u16
}
#[inline]
pub(crate) fn hiword_from_wparam(wparam: WPARAM) -> u16 {
    ((wparam.0 >> 16) & 0xFFFF) as u16
}

/// Signed client coordinates packed into an `lparam`.
#[inline]
pub(crate) fn point_from_lparam(lparam: LPARAM) -> Point {
    Point::new(
        (lparam.0 & 0xFFFF) as u16 as i16 as i32,
        ((lparam.0 >> 16) & 0xFFFF) as u16 as i16 as i32,
    )
}

#[inline]
pub(crate) fn lparam_from_point(point: Point) -> LPARAM {
    let x = point.x as i16 as u16 as isize;
    let y = point.y as i16 as u16 as isize;
    LPARAM(x | (y << 16))
}

fn decode_message(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<Message> {
    let message = match msg {
        WM_DESTROY => Message::Destroy,
        WM_CLOSE => Message::Close,
        WM_ACTIVATE => Message::Activate {
            active: loword_from_wparam(wparam) as i32 != WA_INACTIVE_CODE,
        },
        WM_PAINT => Message::Paint,
        WM_ERASEBKGND => Message::EraseBackground,
        WM_KEYDOWN | WM_SYSKEYDOWN => Message::KeyDown {
            key: VirtualKey(wparam.0 as u32),
            repeat: lparam.0 & KEY_REPEAT_FLAG != 0,
        },
        WM_KEYUP | WM_SYSKEYUP => Message::KeyUp {
            key: VirtualKey(wparam.0 as u32),
        },
        WM_CHAR => Message::Char {
            character: char::from_u32(wparam.0 as u32)?,
        },
        WM_MOUSEMOVE => Message::MouseMove {
            position: point_from_lparam(lparam),
        },
        WM_MOUSELEAVE => Message::MouseLeave,
        WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN => {
            Message::MouseDown {
                button: button_of(msg)?,
                position: point_from_lparam(lparam),
            }
        }
        WM_LBUTTONUP | WM_RBUTTONUP | WM_MBUTTONUP => {
            Message::MouseUp {
                button: button_of(msg)?,
                position: point_from_lparam(lparam),
            }
        }
        WM_LBUTTONDBLCLK | WM_RBUTTONDBLCLK | WM_MBUTTONDBLCLK => {
            Message::DoubleClick {
                button: button_of(msg)?,
                position: point_from_lparam(lparam),
            }
        }
        WM_MOUSEWHEEL => {
            // Wheel positions arrive in screen coordinates.
            let screen = point_from_lparam(lparam);
            let mut point = POINT {
                x: screen.x,
                y: screen.y,
            };
            let _ = unsafe { ScreenToClient(hwnd, &mut point) };
            Message::MouseWheel {
                delta: hiword_from_wparam(wparam) as i16 as i32,
                position: Point::new(point.x, point.y),
            }
        }
        WM_INPUT => {
            let (dx, dy) = read_raw_mouse_delta(lparam)?;
            Message::RawMouse { dx, dy }
        }
        WM_SETFOCUS => Message::FocusEnter,
        WM_KILLFOCUS => Message::FocusLeave,
        WM_COMMAND => Message::Command {
            id: loword_from_wparam(wparam),
            notification: hiword_from_wparam(wparam),
        },
        WM_APP_NEXT_CONTROL => Message::NextControl {
            from: ControlId::new(wparam.0 as u32),
            reverse: lparam.0 != 0,
        },
        _ => return None,
    };
    Some(message)
}

fn button_of(msg: u32) -> Option<MouseButton> {
    match msg {
        WM_LBUTTONDOWN | WM_LBUTTONUP | WM_LBUTTONDBLCLK => Some(MouseButton::Left),
        WM_RBUTTONDOWN | WM_RBUTTONUP | WM_RBUTTONDBLCLK => Some(MouseButton::Right),
        WM_MBUTTONDOWN | WM_MBUTTONUP | WM_MBUTTONDBLCLK => Some(MouseButton::Middle),
        _ => None,
    }
}

/// Relative motion of a raw mouse packet; `None` for other devices or empty packets.
fn read_raw_mouse_delta(lparam: LPARAM) -> Option<(i32, i32)> {
    let mut raw: RAWINPUT = unsafe { std::mem::zeroed() };
    let mut size = std::mem::size_of::<RAWINPUT>() as u32;
    let read = unsafe {
        GetRawInputData(
            HRAWINPUT(lparam.0 as *mut c_void),
            RID_INPUT,
            Some(&mut raw as *mut RAWINPUT as *mut c_void),
            &mut size,
            std::mem::size_of::<RAWINPUTHEADER>() as u32,
        )
    };
    if read == u32::MAX || raw.header.dwType != RIM_TYPEMOUSE.0 {
        return None;
    }
    let mouse = unsafe { raw.data.mouse };
    (mouse.lLastX != 0 || mouse.lLastY != 0).then_some((mouse.lLastX, mouse.lLastY))
}

/// Native form of the messages application code may send or post.
/// Messages without one go straight through the router.
pub(crate) fn encode_message(message: &Message) -> Option<(u32, WPARAM, LPARAM)> {
    let encoded = match *message {
        Message::Close => (WM_CLOSE, WPARAM(0), LPARAM(0)),
        Message::KeyDown { key, repeat } => (
            WM_KEYDOWN,
            WPARAM(key.0 as usize),
            LPARAM(if repeat { KEY_REPEAT_FLAG } else { 0 }),
        ),
        Message::KeyUp { key } => (WM_KEYUP, WPARAM(key.0 as usize), LPARAM(0)),
        Message::Char { character } => (WM_CHAR, WPARAM(character as usize), LPARAM(0)),
        Message::MouseMove { position } => (WM_MOUSEMOVE, WPARAM(0), lparam_from_point(position)),
        Message::MouseLeave => (WM_MOUSELEAVE, WPARAM(0), LPARAM(0)),
        Message::MouseDown { button, position } => {
            let msg = match button {
                MouseButton::Left => WM_LBUTTONDOWN,
                MouseButton::Right => WM_RBUTTONDOWN,
                MouseButton::Middle => WM_MBUTTONDOWN,
            };
            (msg, WPARAM(0), lparam_from_point(position))
        }
        Message::MouseUp { button, position } => {
            let msg = match button {
                MouseButton::Left => WM_LBUTTONUP,
                MouseButton::Right => WM_RBUTTONUP,
                MouseButton::Middle => WM_MBUTTONUP,
            };
            (msg, WPARAM(0), lparam_from_point(position))
        }
        Message::Command { id, notification } => (
            WM_COMMAND,
            WPARAM(((notification as usize) << 16) | id as usize),
            LPARAM(0),
        ),
        Message::NextControl { from, reverse } => (
            WM_APP_NEXT_CONTROL,
            WPARAM(from.raw() as usize),
            LPARAM(reverse as isize),
        ),
        _ => return None,
    };
    Some(encoded)
}

/*
 * `NativeBackend` on user32/gdi32. Window procedures and message translation
 * live in `window_common`; this file holds the outbound calls: creation and
 * destruction, window state, capture and cursor handling, raw input
 * registration, GDI painting and the non-blocking message pump.
 *
 * GDI resources acquired for a paint pass are owned by small RAII guards so
 * they are released on every path out of `paint`.
 */
use crate::controls::styling_handler::color_to_colorref;
use crate::error::Result as PlatformResult;
use crate::message::{Message, MessageResult};
use crate::native::{Border, CreateRequest, NativeBackend, PaintRequest};
use crate::native_error;
use crate::router;
use crate::types::{Color, NativeHandle, Rect, VirtualKey};
use crate::window_common::{self, NativeCreateParams, to_hwnd, to_native_handle};

use windows::Win32::{
    Foundation::{HINSTANCE, HWND, POINT, RECT},
    Graphics::Gdi::*,
    UI::Input::KeyboardAndMouse::{
        GetKeyState, ReleaseCapture, SetCapture, SetFocus, TME_LEAVE, TRACKMOUSEEVENT,
        TrackMouseEvent,
    },
    UI::Input::{RAWINPUTDEVICE, RAWINPUTDEVICE_FLAGS, RegisterRawInputDevices},
    UI::WindowsAndMessaging::*,
};
use windows::core::HSTRING;

const HID_USAGE_PAGE_GENERIC: u16 = 0x01;
const HID_USAGE_GENERIC_MOUSE: u16 = 0x02;
const FOCUS_INSET: i32 = 3;

#[derive(Debug)]
pub struct Win32Backend {
    instance: HINSTANCE,
}

impl Win32Backend {
    pub fn new() -> PlatformResult<Self> {
        let instance = window_common::module_instance()?;
        window_common::register_window_class(instance)?;
        log::debug!("Win32Backend: initialized.");
        Ok(Win32Backend { instance })
    }

    fn client_rect(hwnd: HWND) -> RECT {
        let mut rect = RECT::default();
        if let Err(err) = unsafe { GetClientRect(hwnd, &mut rect) } {
            log::warn!("Win32Backend: GetClientRect failed: {err}");
        }
        rect
    }
}

impl NativeBackend for Win32Backend {
    fn create_window(&self, request: &CreateRequest) -> PlatformResult<NativeHandle> {
        let params = NativeCreateParams {
            instance: self.instance,
            control: &request.control,
            kind: request.kind,
            parent: request.parent.map(to_hwnd),
            text: &request.text,
            x: request.location.x,
            y: request.location.y,
            width: request.size.width,
            height: request.size.height,
        };
        let hwnd = window_common::create_native_window(&params)?;
        Ok(to_native_handle(hwnd))
    }

    fn destroy_window(&self, handle: NativeHandle) -> PlatformResult<()> {
        let hwnd = to_hwnd(handle);
        if !unsafe { IsWindow(Some(hwnd)) }.as_bool() {
            log::trace!("Win32Backend: {handle:?} already destroyed.");
            return Ok(());
        }
        unsafe { DestroyWindow(hwnd) }.map_err(|err| native_error!(err.code().0 as u32))
    }

    fn send_message(&self, handle: NativeHandle, message: Message) -> MessageResult {
        match window_common::encode_message(&message) {
            Some((msg, wparam, lparam)) => {
                let result =
                    unsafe { SendMessageW(to_hwnd(handle), msg, Some(wparam), Some(lparam)) };
                MessageResult::Handled(result.0)
            }
            None => router::handle_message_forward(handle, message),
        }
    }

    fn post_message(&self, handle: NativeHandle, message: Message) {
        let Some((msg, wparam, lparam)) = window_common::encode_message(&message) else {
            log::warn!(
                "Win32Backend: {} cannot be posted to {handle:?}, dropped.",
                message.name()
            );
            return;
        };
        if let Err(err) = unsafe { PostMessageW(Some(to_hwnd(handle)), msg, wparam, lparam) } {
            log::warn!("Win32Backend: PostMessageW to {handle:?} failed: {err}");
        }
    }

    fn show_window(&self, handle: NativeHandle, visible: bool) {
        let command = if visible { SW_SHOW } else { SW_HIDE };
        let _ = unsafe { ShowWindow(to_hwnd(handle), command) };
    }

    fn enable_window(&self, handle: NativeHandle, enabled: bool) {
        let _ = unsafe { EnableWindow(to_hwnd(handle), enabled) };
    }

    fn invalidate(&self, handle: NativeHandle) {
        let _ = unsafe { InvalidateRect(Some(to_hwnd(handle)), None, false) };
    }

    fn set_text(&self, handle: NativeHandle, text: &str) -> PlatformResult<()> {
        unsafe { SetWindowTextW(to_hwnd(handle), &HSTRING::from(text)) }
            .map_err(|err| native_error!(err.code().0 as u32))
    }

    fn set_bounds(&self, handle: NativeHandle, bounds: Rect) -> PlatformResult<()> {
        unsafe {
            MoveWindow(
                to_hwnd(handle),
                bounds.left,
                bounds.top,
                bounds.right - bounds.left,
                bounds.bottom - bounds.top,
                true,
            )
        }
        .map_err(|err| native_error!(err.code().0 as u32))
    }

    fn set_focus(&self, handle: NativeHandle) {
        if let Err(err) = unsafe { SetFocus(Some(to_hwnd(handle))) } {
            log::debug!("Win32Backend: SetFocus({handle:?}) failed: {err}");
        }
    }

    fn set_capture(&self, handle: NativeHandle, captured: bool) {
        if captured {
            unsafe { SetCapture(to_hwnd(handle)) };
        } else if let Err(err) = unsafe { ReleaseCapture() } {
            log::debug!("Win32Backend: ReleaseCapture failed: {err}");
        }
    }

    fn track_mouse_leave(&self, handle: NativeHandle) {
        let mut tme = TRACKMOUSEEVENT {
            cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
            dwFlags: TME_LEAVE,
            hwndTrack: to_hwnd(handle),
            dwHoverTime: 0,
        };
        if let Err(err) = unsafe { TrackMouseEvent(&mut tme) } {
            log::warn!("Win32Backend: TrackMouseEvent for {handle:?} failed: {err}");
        }
    }

    fn confine_cursor(&self, handle: Option<NativeHandle>) {
        let result = match handle {
            Some(handle) => {
                let hwnd = to_hwnd(handle);
                let client = Self::client_rect(hwnd);
                let mut top_left = POINT {
                    x: client.left,
                    y: client.top,
                };
                let mut bottom_right = POINT {
                    x: client.right,
                    y: client.bottom,
                };
                unsafe {
                    let _ = ClientToScreen(hwnd, &mut top_left);
                    let _ = ClientToScreen(hwnd, &mut bottom_right);
                }
                let screen = RECT {
                    left: top_left.x,
                    top: top_left.y,
                    right: bottom_right.x,
                    bottom: bottom_right.y,
                };
                unsafe { ClipCursor(Some(&screen as *const RECT)) }
            }
            None => unsafe { ClipCursor(None) },
        };
        if let Err(err) = result {
            log::warn!("Win32Backend: ClipCursor failed: {err}");
        }
    }

    fn set_cursor_visible(&self, visible: bool) {
        // ShowCursor keeps a display counter; step it until the state flips.
        unsafe {
            if visible {
                while ShowCursor(true) < 0 {}
            } else {
                while ShowCursor(false) >= 0 {}
            }
        }
    }

    fn register_raw_mouse(&self, handle: NativeHandle) -> PlatformResult<()> {
        let device = RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_MOUSE,
            dwFlags: RAWINPUTDEVICE_FLAGS(0),
            hwndTarget: to_hwnd(handle),
        };
        unsafe {
            RegisterRawInputDevices(&[device], std::mem::size_of::<RAWINPUTDEVICE>() as u32)
        }
        .map_err(|err| native_error!(err.code().0 as u32))
    }

    fn is_key_down(&self, key: VirtualKey) -> bool {
        unsafe { GetKeyState(key.0 as i32) } < 0
    }

    fn paint(&self, handle: NativeHandle, request: &PaintRequest) {
        let hwnd = to_hwnd(handle);
        let Some(pass) = PaintGuard::begin(hwnd) else {
            log::warn!("Win32Backend: BeginPaint for {handle:?} failed.");
            return;
        };
        let hdc = pass.hdc;
        let mut area = Self::client_rect(hwnd);

        fill(hdc, &area, request.background);
        if let Some(border) = request.outer_border {
            frame(hdc, &area, border);
            area = inset(&area, border.width);
        }
        if let Some(color) = request.focus_dots {
            dotted_frame(hdc, &inset(&area, FOCUS_INSET), color);
        }
        if let Some(border) = request.inner_border {
            frame(hdc, &area, border);
            area = inset(&area, border.width);
        }
        if let Some(text) = request.text.as_deref() {
            draw_text(hdc, &area, text, request.foreground);
        }
    }

    fn pump_messages(&self) -> Option<i32> {
        let mut msg = MSG::default();
        unsafe {
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                if msg.message == WM_QUIT {
                    return Some(msg.wParam.0 as i32);
                }
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        None
    }

    fn post_quit(&self, exit_code: i32) {
        log::debug!("Win32Backend: posting quit ({exit_code}).");
        unsafe { PostQuitMessage(exit_code) };
    }

    fn show_message_box(&self, title: &str, text: &str) {
        unsafe {
            MessageBoxW(
                None,
                &HSTRING::from(text),
                &HSTRING::from(title),
                MB_OK | MB_ICONERROR,
            );
        }
    }
}

/// BeginPaint/EndPaint pair.
struct PaintGuard {
    hwnd: HWND,
    hdc: HDC,
    ps: PAINTSTRUCT,
}

impl PaintGuard {
    fn begin(hwnd: HWND) -> Option<Self> {
        let mut ps = PAINTSTRUCT::default();
        let hdc = unsafe { BeginPaint(hwnd, &mut ps) };
        (!hdc.is_invalid()).then_some(PaintGuard { hwnd, hdc, ps })
    }
}

impl Drop for PaintGuard {
    fn drop(&mut self) {
        let _ = unsafe { EndPaint(self.hwnd, &self.ps) };
    }
}

/// Owned GDI object, deleted on drop.
struct GdiObject(HGDIOBJ);

impl Drop for GdiObject {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            let _ = unsafe { DeleteObject(self.0) };
        }
    }
}

/// Object selected into a DC; restores the previous selection on drop.
struct Selection {
    hdc: HDC,
    previous: HGDIOBJ,
}

impl Selection {
    fn select(hdc: HDC, object: HGDIOBJ) -> Self {
        let previous = unsafe { SelectObject(hdc, object) };
        Selection { hdc, previous }
    }
}

impl Drop for Selection {
    fn drop(&mut self) {
        unsafe { SelectObject(self.hdc, self.previous) };
    }
}

fn inset(rect: &RECT, by: i32) -> RECT {
    RECT {
        left: rect.left + by,
        top: rect.top + by,
        right: (rect.right - by).max(rect.left + by),
        bottom: (rect.bottom - by).max(rect.top + by),
    }
}

fn fill(hdc: HDC, rect: &RECT, color: Color) {
    let brush = unsafe { CreateSolidBrush(color_to_colorref(color)) };
    let owned = GdiObject(brush.into());
    unsafe { FillRect(hdc, rect, brush) };
    drop(owned);
}

fn frame(hdc: HDC, rect: &RECT, border: Border) {
    if border.width <= 0 {
        return;
    }
    let w = border.width;
    let edges = [
        RECT { bottom: rect.top + w, ..*rect },
        RECT { top: rect.bottom - w, ..*rect },
        RECT { right: rect.left + w, ..*rect },
        RECT { left: rect.right - w, ..*rect },
    ];
    for edge in &edges {
        fill(hdc, edge, border.color);
    }
}

fn dotted_frame(hdc: HDC, rect: &RECT, color: Color) {
    let pen = unsafe { CreatePen(PS_DOT, 1, color_to_colorref(color)) };
    let owned_pen = GdiObject(pen.into());
    let _pen = Selection::select(hdc, owned_pen.0);
    let _brush = Selection::select(hdc, unsafe { GetStockObject(NULL_BRUSH) });
    unsafe {
        SetBkMode(hdc, TRANSPARENT);
        let _ = Rectangle(hdc, rect.left, rect.top, rect.right, rect.bottom);
    }
}

fn draw_text(hdc: HDC, rect: &RECT, text: &str, color: Color) {
    let mut wide: Vec<u16> = text.encode_utf16().collect();
    let mut area = *rect;
    let _font = Selection::select(hdc, unsafe { GetStockObject(DEFAULT_GUI_FONT) });
    unsafe {
        SetBkMode(hdc, TRANSPARENT);
        SetTextColor(hdc, color_to_colorref(color));
        DrawTextW(
            hdc,
            &mut wide,
            &mut area,
            DT_CENTER | DT_VCENTER | DT_SINGLELINE,
        );
    }
}

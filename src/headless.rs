/*
 * In-process stand-in for the native windowing system. `HeadlessBackend`
 * hands out handles, keeps a parent/child table and delivers messages through
 * the router with the same synchronous, two-stage semantics as the Win32
 * window procedures:
 *
 * - a new handle starts on the setup entry and receives `Create` before
 *   `create_window` returns; it moves to the forward entry once registered,
 * - `destroy_window` sends `Destroy` to the handle and then its descendants,
 * - `set_focus` sends `FocusLeave` and `FocusEnter`,
 * - `post_message` and `post_quit` queue work for `pump_messages`.
 *
 * Every call is recorded as a `NativeCall`, which is what the tests assert on.
 * The backend also drives the crate on platforms without a native one.
 */
use crate::error::{PlatformError, Result as PlatformResult};
use crate::message::{Message, MessageResult};
use crate::native::{CreateRequest, NativeBackend, PaintRequest};
use crate::router;
use crate::types::{ControlKind, NativeHandle, Rect, VirtualKey};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

const FIRST_HANDLE: usize = 0x1000;
const HANDLE_STRIDE: usize = 0x10;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Create { handle: NativeHandle, kind: ControlKind },
    Destroy { handle: NativeHandle },
    Show { handle: NativeHandle, visible: bool },
    Enable { handle: NativeHandle, enabled: bool },
    Invalidate { handle: NativeHandle },
    SetText { handle: NativeHandle, text: String },
    SetBounds { handle: NativeHandle, bounds: Rect },
    SetFocus { handle: NativeHandle },
    SetCapture { handle: NativeHandle, captured: bool },
    TrackMouseLeave { handle: NativeHandle },
    ConfineCursor { handle: Option<NativeHandle> },
    SetCursorVisible { visible: bool },
    RegisterRawMouse { handle: NativeHandle },
    Paint { handle: NativeHandle, request: PaintRequest },
    PostQuit { exit_code: i32 },
    MessageBox { title: String, text: String },
}

#[derive(Debug)]
struct HeadlessWindow {
    parent: Option<NativeHandle>,
    bound: bool,
    visible: bool,
    enabled: bool,
    text: String,
    bounds: Rect,
    created_at: usize,
}

#[derive(Debug)]
enum Posted {
    Message(NativeHandle, Message),
    Quit(i32),
}

#[derive(Debug)]
struct HeadlessState {
    next_handle: usize,
    windows: HashMap<NativeHandle, HeadlessWindow>,
    calls: Vec<NativeCall>,
    focus: Option<NativeHandle>,
    posted: VecDeque<Posted>,
    quit_posted: bool,
    cursor_visible: bool,
    confined_to: Option<NativeHandle>,
    keys_down: HashSet<VirtualKey>,
    fail_next_create: Option<PlatformError>,
    fail_next_destroy: Option<PlatformError>,
}

#[derive(Debug)]
pub struct HeadlessBackend {
    state: RefCell<HeadlessState>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        HeadlessBackend {
            state: RefCell::new(HeadlessState {
                next_handle: FIRST_HANDLE,
                windows: HashMap::new(),
                calls: Vec::new(),
                focus: None,
                posted: VecDeque::new(),
                quit_posted: false,
                cursor_visible: true,
                confined_to: None,
                keys_down: HashSet::new(),
                fail_next_create: None,
                fail_next_destroy: None,
            }),
        }
    }

    fn record(&self, call: NativeCall) {
        self.state.borrow_mut().calls.push(call);
    }

    /*
     * Routes one message to the entry the handle is currently bound to. The
     * state borrow ends before the router runs, handlers re-enter freely.
     */
    fn deliver(&self, handle: NativeHandle, message: Message) -> MessageResult {
        let bound = match self.state.borrow().windows.get(&handle) {
            Some(window) => window.bound,
            None => return MessageResult::Default,
        };
        if bound {
            router::handle_message_forward(handle, message)
        } else {
            router::handle_message_setup(handle, message)
        }
    }

    /// Native descendants of `handle` in creation order, parents before children.
    fn descendants(&self, handle: NativeHandle) -> Vec<NativeHandle> {
        let state = self.state.borrow();
        let mut children: Vec<(usize, NativeHandle)> = state
            .windows
            .iter()
            .filter(|(_, window)| window.parent == Some(handle))
            .map(|(child, window)| (window.created_at, *child))
            .collect();
        drop(state);
        children.sort_by_key(|(created_at, _)| *created_at);
        let mut out = Vec::new();
        for (_, child) in children {
            out.push(child);
            out.extend(self.descendants(child));
        }
        out
    }

    /// Delivers `message` to `handle` as if the system sent it.
    pub fn send(&self, handle: NativeHandle, message: Message) -> MessageResult {
        self.deliver(handle, message)
    }

    /// Makes the next `create_window` fail with `error` before any handle exists.
    pub fn fail_next_create(&self, error: PlatformError) {
        self.state.borrow_mut().fail_next_create = Some(error);
    }

    /// Makes the next `destroy_window` of a live handle fail with `error`.
    pub fn fail_next_destroy(&self, error: PlatformError) {
        self.state.borrow_mut().fail_next_destroy = Some(error);
    }

    /// Sets what `is_key_down` reports for `key`.
    pub fn set_key_down(&self, key: VirtualKey, down: bool) {
        let mut state = self.state.borrow_mut();
        if down {
            state.keys_down.insert(key);
        } else {
            state.keys_down.remove(&key);
        }
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn invalidate_count(&self, handle: NativeHandle) -> usize {
        self.count_calls(|call| *call == NativeCall::Invalidate { handle })
    }

    pub fn track_leave_count(&self, handle: NativeHandle) -> usize {
        self.count_calls(|call| *call == NativeCall::TrackMouseLeave { handle })
    }

    fn count_calls(&self, predicate: impl Fn(&NativeCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn last_paint(&self, handle: NativeHandle) -> Option<PaintRequest> {
        self.state.borrow().calls.iter().rev().find_map(|call| match call {
            NativeCall::Paint { handle: h, request } if *h == handle => Some(request.clone()),
            _ => None,
        })
    }

    pub fn message_boxes(&self) -> Vec<(String, String)> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                NativeCall::MessageBox { title, text } => Some((title.clone(), text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn is_alive(&self, handle: NativeHandle) -> bool {
        self.state.borrow().windows.contains_key(&handle)
    }

    pub fn is_bound(&self, handle: NativeHandle) -> bool {
        self.state
            .borrow()
            .windows
            .get(&handle)
            .is_some_and(|window| window.bound)
    }

    pub fn is_visible(&self, handle: NativeHandle) -> bool {
        self.state
            .borrow()
            .windows
            .get(&handle)
            .is_some_and(|window| window.visible)
    }

    pub fn is_enabled(&self, handle: NativeHandle) -> bool {
        self.state
            .borrow()
            .windows
            .get(&handle)
            .is_some_and(|window| window.enabled)
    }

    pub fn text_of(&self, handle: NativeHandle) -> Option<String> {
        self.state
            .borrow()
            .windows
            .get(&handle)
            .map(|window| window.text.clone())
    }

    pub fn bounds_of(&self, handle: NativeHandle) -> Option<Rect> {
        self.state.borrow().windows.get(&handle).map(|window| window.bounds)
    }

    pub fn focused(&self) -> Option<NativeHandle> {
        self.state.borrow().focus
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.state.borrow().cursor_visible
    }

    pub fn confined_to(&self) -> Option<NativeHandle> {
        self.state.borrow().confined_to
    }

    pub fn quit_posted(&self) -> bool {
        self.state.borrow().quit_posted
    }

    pub fn live_window_count(&self) -> usize {
        self.state.borrow().windows.len()
    }
}

impl NativeBackend for HeadlessBackend {
    fn create_window(&self, request: &CreateRequest) -> PlatformResult<NativeHandle> {
        if let Some(err) = self.state.borrow_mut().fail_next_create.take() {
            return Err(err);
        }
        if let Some(parent) = request.parent {
            if !self.is_alive(parent) {
                return Err(PlatformError::InvalidHandle(format!(
                    "parent {parent:?} does not exist"
                )));
            }
        }
        let handle = {
            let mut state = self.state.borrow_mut();
            let handle = NativeHandle(state.next_handle);
            state.next_handle += HANDLE_STRIDE;
            state.windows.insert(
                handle,
                HeadlessWindow {
                    parent: request.parent,
                    bound: false,
                    visible: false,
                    enabled: true,
                    text: request.text.clone(),
                    bounds: Rect::from_location_size(request.location, request.size),
                    created_at: handle.0,
                },
            );
            state.calls.push(NativeCall::Create {
                handle,
                kind: request.kind,
            });
            handle
        };

        let created = self.deliver(
            handle,
            Message::Create {
                control: request.control.clone(),
            },
        );
        if created == MessageResult::Handled(0) {
            self.state.borrow_mut().windows.remove(&handle);
            return Err(PlatformError::OperationFailed(format!(
                "creation of {handle:?} was aborted by its create handler"
            )));
        }
        if crate::registry::resolve(handle).is_some() {
            if let Some(window) = self.state.borrow_mut().windows.get_mut(&handle) {
                window.bound = true;
            }
        }
        Ok(handle)
    }

    fn destroy_window(&self, handle: NativeHandle) -> PlatformResult<()> {
        if !self.is_alive(handle) {
            return Ok(());
        }
        if let Some(err) = self.state.borrow_mut().fail_next_destroy.take() {
            return Err(err);
        }
        self.record(NativeCall::Destroy { handle });
        let mut doomed = vec![handle];
        doomed.extend(self.descendants(handle));
        for target in &doomed {
            self.deliver(*target, Message::Destroy);
        }
        let mut state = self.state.borrow_mut();
        for target in &doomed {
            state.windows.remove(target);
            if state.focus == Some(*target) {
                state.focus = None;
            }
            if state.confined_to == Some(*target) {
                state.confined_to = None;
            }
        }
        Ok(())
    }

    fn send_message(&self, handle: NativeHandle, message: Message) -> MessageResult {
        self.deliver(handle, message)
    }

    fn post_message(&self, handle: NativeHandle, message: Message) {
        self.state
            .borrow_mut()
            .posted
            .push_back(Posted::Message(handle, message));
    }

    fn show_window(&self, handle: NativeHandle, visible: bool) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.windows.get_mut(&handle) {
            window.visible = visible;
        }
        state.calls.push(NativeCall::Show { handle, visible });
    }

    fn enable_window(&self, handle: NativeHandle, enabled: bool) {
        let mut state = self.state.borrow_mut();
        if let Some(window) = state.windows.get_mut(&handle) {
            window.enabled = enabled;
        }
        state.calls.push(NativeCall::Enable { handle, enabled });
    }

    fn invalidate(&self, handle: NativeHandle) {
        self.record(NativeCall::Invalidate { handle });
    }

    fn set_text(&self, handle: NativeHandle, text: &str) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        let window = state
            .windows
            .get_mut(&handle)
            .ok_or_else(|| PlatformError::InvalidHandle(format!("{handle:?}")))?;
        window.text = text.to_string();
        state.calls.push(NativeCall::SetText {
            handle,
            text: text.to_string(),
        });
        Ok(())
    }

    fn set_bounds(&self, handle: NativeHandle, bounds: Rect) -> PlatformResult<()> {
        let mut state = self.state.borrow_mut();
        let window = state
            .windows
            .get_mut(&handle)
            .ok_or_else(|| PlatformError::InvalidHandle(format!("{handle:?}")))?;
        window.bounds = bounds;
        state.calls.push(NativeCall::SetBounds { handle, bounds });
        Ok(())
    }

    fn set_focus(&self, handle: NativeHandle) {
        if !self.is_alive(handle) {
            return;
        }
        let previous = {
            let mut state = self.state.borrow_mut();
            state.calls.push(NativeCall::SetFocus { handle });
            if state.focus == Some(handle) {
                return;
            }
            state.focus.replace(handle)
        };
        if let Some(previous) = previous {
            self.deliver(previous, Message::FocusLeave);
        }
        self.deliver(handle, Message::FocusEnter);
    }

    fn set_capture(&self, handle: NativeHandle, captured: bool) {
        self.record(NativeCall::SetCapture { handle, captured });
    }

    fn track_mouse_leave(&self, handle: NativeHandle) {
        self.record(NativeCall::TrackMouseLeave { handle });
    }

    fn confine_cursor(&self, handle: Option<NativeHandle>) {
        let mut state = self.state.borrow_mut();
        state.confined_to = handle;
        state.calls.push(NativeCall::ConfineCursor { handle });
    }

    fn set_cursor_visible(&self, visible: bool) {
        let mut state = self.state.borrow_mut();
        state.cursor_visible = visible;
        state.calls.push(NativeCall::SetCursorVisible { visible });
    }

    fn register_raw_mouse(&self, handle: NativeHandle) -> PlatformResult<()> {
        self.record(NativeCall::RegisterRawMouse { handle });
        Ok(())
    }

    fn is_key_down(&self, key: VirtualKey) -> bool {
        self.state.borrow().keys_down.contains(&key)
    }

    fn paint(&self, handle: NativeHandle, request: &PaintRequest) {
        self.record(NativeCall::Paint {
            handle,
            request: request.clone(),
        });
    }

    fn pump_messages(&self) -> Option<i32> {
        loop {
            let next = self.state.borrow_mut().posted.pop_front();
            match next {
                Some(Posted::Message(handle, message)) => {
                    self.deliver(handle, message);
                }
                Some(Posted::Quit(exit_code)) => return Some(exit_code),
                None => return None,
            }
        }
    }

    fn post_quit(&self, exit_code: i32) {
        let mut state = self.state.borrow_mut();
        state.quit_posted = true;
        state.posted.push_back(Posted::Quit(exit_code));
        state.calls.push(NativeCall::PostQuit { exit_code });
    }

    fn show_message_box(&self, title: &str, text: &str) {
        log::error!("Headless: message box '{title}': {text}");
        self.record(NativeCall::MessageBox {
            title: title.to_string(),
            text: text.to_string(),
        });
    }
}

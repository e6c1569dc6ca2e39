/*
 * Keyboard and mouse buffers owned by each window. The window handler feeds them
 * from native messages; the frame loop drains them once per frame through
 * `Window::key_events` / `Window::mouse_events` / `Window::raw_deltas`.
 *
 * Queues are bounded: when more than `BUFFER_SIZE` events pile up between two
 * frames the oldest ones are dropped.
 */
use crate::types::{Point, VirtualKey};

use std::collections::VecDeque;

const BUFFER_SIZE: usize = 16;
/// One notch of a standard mouse wheel.
pub const WHEEL_DELTA: i32 = 120;

fn trim_buffer<T>(buffer: &mut VecDeque<T>) {
    while buffer.len() > BUFFER_SIZE {
        buffer.pop_front();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub kind: KeyEventKind,
    pub key: VirtualKey,
}

impl KeyboardEvent {
    pub fn is_press(&self) -> bool {
        self.kind == KeyEventKind::Press
    }

    pub fn is_release(&self) -> bool {
        self.kind == KeyEventKind::Release
    }
}

#[derive(Debug)]
pub struct Keyboard {
    key_states: [bool; 256],
    key_buffer: VecDeque<KeyboardEvent>,
    char_buffer: VecDeque<char>,
    autorepeat: bool,
}

impl Keyboard {
    pub(crate) fn new(autorepeat: bool) -> Self {
        Keyboard {
            key_states: [false; 256],
            key_buffer: VecDeque::new(),
            char_buffer: VecDeque::new(),
            autorepeat,
        }
    }

    pub fn is_key_pressed(&self, key: VirtualKey) -> bool {
        key.index().is_some_and(|i| self.key_states[i])
    }

    pub fn read_key(&mut self) -> Option<KeyboardEvent> {
        self.key_buffer.pop_front()
    }

    pub fn read_char(&mut self) -> Option<char> {
        self.char_buffer.pop_front()
    }

    pub fn is_key_empty(&self) -> bool {
        self.key_buffer.is_empty()
    }

    pub fn is_char_empty(&self) -> bool {
        self.char_buffer.is_empty()
    }

    pub fn flush(&mut self) {
        self.key_buffer.clear();
        self.char_buffer.clear();
    }

    pub fn is_autorepeat_enabled(&self) -> bool {
        self.autorepeat
    }

    pub fn set_autorepeat(&mut self, enabled: bool) {
        self.autorepeat = enabled;
    }

    pub(crate) fn on_key_pressed(&mut self, key: VirtualKey, repeat: bool) {
        if repeat && !self.autorepeat {
            return;
        }
        if let Some(index) = key.index() {
            self.key_states[index] = true;
        }
        self.key_buffer.push_back(KeyboardEvent {
            kind: KeyEventKind::Press,
            key,
        });
        trim_buffer(&mut self.key_buffer);
    }

    pub(crate) fn on_key_released(&mut self, key: VirtualKey) {
        if let Some(index) = key.index() {
            self.key_states[index] = false;
        }
        self.key_buffer.push_back(KeyboardEvent {
            kind: KeyEventKind::Release,
            key,
        });
        trim_buffer(&mut self.key_buffer);
    }

    pub(crate) fn on_char(&mut self, character: char) {
        self.char_buffer.push_back(character);
        trim_buffer(&mut self.char_buffer);
    }

    /// Forgets held keys, e.g. when the window loses focus and never sees the key-ups.
    pub(crate) fn clear_state(&mut self) {
        self.key_states = [false; 256];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    LeftPress,
    LeftRelease,
    RightPress,
    RightRelease,
    WheelUp,
    WheelDown,
    Move,
    Enter,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub position: Point,
    pub left_pressed: bool,
    pub right_pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDelta {
    pub dx: i32,
    pub dy: i32,
}

#[derive(Debug, Default)]
pub struct Mouse {
    position: Point,
    left_pressed: bool,
    right_pressed: bool,
    in_window: bool,
    wheel_delta_carry: i32,
    raw_enabled: bool,
    buffer: VecDeque<MouseEvent>,
    raw_buffer: VecDeque<RawDelta>,
}

impl Mouse {
    pub(crate) fn new() -> Self {
        Mouse::default()
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_in_window(&self) -> bool {
        self.in_window
    }

    pub fn is_left_pressed(&self) -> bool {
        self.left_pressed
    }

    pub fn is_right_pressed(&self) -> bool {
        self.right_pressed
    }

    pub fn is_raw_enabled(&self) -> bool {
        self.raw_enabled
    }

    pub fn read(&mut self) -> Option<MouseEvent> {
        self.buffer.pop_front()
    }

    pub fn read_raw_delta(&mut self) -> Option<RawDelta> {
        self.raw_buffer.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn flush(&mut self) {
        self.buffer.clear();
        self.raw_buffer.clear();
    }

    /// Only the window's input-mode switch may flip this, together with the cursor.
    pub(crate) fn set_raw_enabled(&mut self, enabled: bool) {
        self.raw_enabled = enabled;
        if !enabled {
            self.raw_buffer.clear();
        }
    }

    fn push(&mut self, kind: MouseEventKind) {
        self.buffer.push_back(MouseEvent {
            kind,
            position: self.position,
            left_pressed: self.left_pressed,
            right_pressed: self.right_pressed,
        });
        trim_buffer(&mut self.buffer);
    }

    pub(crate) fn on_move(&mut self, position: Point) {
        self.position = position;
        self.push(MouseEventKind::Move);
    }

    pub(crate) fn on_enter(&mut self) {
        self.in_window = true;
        self.push(MouseEventKind::Enter);
    }

    pub(crate) fn on_leave(&mut self) {
        self.in_window = false;
        self.push(MouseEventKind::Leave);
    }

    pub(crate) fn on_left_pressed(&mut self, position: Point) {
        self.position = position;
        self.left_pressed = true;
        self.push(MouseEventKind::LeftPress);
    }

    pub(crate) fn on_left_released(&mut self, position: Point) {
        self.position = position;
        self.left_pressed = false;
        self.push(MouseEventKind::LeftRelease);
    }

    pub(crate) fn on_right_pressed(&mut self, position: Point) {
        self.position = position;
        self.right_pressed = true;
        self.push(MouseEventKind::RightPress);
    }

    pub(crate) fn on_right_released(&mut self, position: Point) {
        self.position = position;
        self.right_pressed = false;
        self.push(MouseEventKind::RightRelease);
    }

    /// Accumulates wheel movement and emits one event per full notch.
    pub(crate) fn on_wheel_delta(&mut self, position: Point, delta: i32) {
        self.position = position;
        self.wheel_delta_carry += delta;
        while self.wheel_delta_carry >= WHEEL_DELTA {
            self.wheel_delta_carry -= WHEEL_DELTA;
            self.push(MouseEventKind::WheelUp);
        }
        while self.wheel_delta_carry <= -WHEEL_DELTA {
            self.wheel_delta_carry += WHEEL_DELTA;
            self.push(MouseEventKind::WheelDown);
        }
    }

    pub(crate) fn on_raw_delta(&mut self, dx: i32, dy: i32) {
        if !self.raw_enabled {
            return;
        }
        self.raw_buffer.push_back(RawDelta { dx, dy });
        trim_buffer(&mut self.raw_buffer);
    }

    pub(crate) fn release_buttons(&mut self) {
        self.left_pressed = false;
        self.right_pressed = false;
    }
}

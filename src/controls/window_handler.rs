/*
 * Top-level windows: lifecycle, input buffering and focus navigation.
 *
 * Besides the shared control behavior a window
 * - moves through `WindowLifecycle` on activate, close and destroy,
 * - feeds every key, character and mouse message into its `Keyboard` and
 *   `Mouse` buffers before raising the usual events,
 * - keeps the native cursor in step with its `InputMode` across activation
 *   changes,
 * - answers `NextControl` requests from its children by focusing the next tab
 *   stop, wrapping around at either end.
 */

use crate::control::{Control, InputMode, Window, WindowLifecycle};
use crate::controls::{self, ControlBehavior};
use crate::event::{ClosedEventArgs, ClosingEventArgs, CloseReason, EventArgs, names};
use crate::message::{Message, MessageResult, MouseButton};
use crate::runtime;
use crate::types::ControlId;

pub(crate) struct WindowHandler;

impl ControlBehavior for WindowHandler {
    fn on_create(&self, control: &Control) {
        log::debug!("WindowHandler: window {} created.", control.id().raw());
    }

    fn handle_message(&self, control: &Control, message: Message) -> MessageResult {
        let Some(window) = Window::from_control(control) else {
            log::warn!(
                "WindowHandler: control {} routed as a window but has no window state.",
                control.id().raw()
            );
            return controls::route_common(self, control, message);
        };
        match message {
            Message::Activate { active } => handle_activate(&window, active),
            Message::Close => handle_close(&window),
            Message::Destroy => handle_destroy(&window),
            Message::NextControl { from, reverse } => handle_next_control(&window, from, reverse),
            Message::RawMouse { dx, dy } => {
                window.mouse().borrow_mut().on_raw_delta(dx, dy);
                // Raw input needs default processing to release its buffer.
                MessageResult::Default
            }
            other => {
                feed_input_buffers(&window, &other);
                controls::route_common(self, control, other)
            }
        }
    }

    fn focus_leave(&self, control: &Control) -> MessageResult {
        if let Some(window) = Window::from_control(control) {
            window.keyboard().borrow_mut().clear_state();
        }
        control.update_state(|state| {
            state.tab_selected = false;
            state.pressed = false;
        });
        control.dispatch_event(names::ON_LOST_FOCUS, &mut EventArgs::Plain);
        MessageResult::Handled(0)
    }
}

fn feed_input_buffers(window: &Window, message: &Message) {
    match *message {
        Message::KeyDown { key, repeat } => {
            window.keyboard().borrow_mut().on_key_pressed(key, repeat);
        }
        Message::KeyUp { key } => window.keyboard().borrow_mut().on_key_released(key),
        Message::Char { character } => window.keyboard().borrow_mut().on_char(character),
        Message::MouseMove { position } => {
            let mut mouse = window.mouse().borrow_mut();
            if !mouse.is_in_window() {
                mouse.on_enter();
            }
            mouse.on_move(position);
        }
        Message::MouseEnter => {
            let mut mouse = window.mouse().borrow_mut();
            if !mouse.is_in_window() {
                mouse.on_enter();
            }
        }
        Message::MouseLeave => window.mouse().borrow_mut().on_leave(),
        Message::MouseDown { button, position } => {
            let mut mouse = window.mouse().borrow_mut();
            match button {
                MouseButton::Left => mouse.on_left_pressed(position),
                MouseButton::Right => mouse.on_right_pressed(position),
                MouseButton::Middle => {}
            }
        }
        Message::MouseUp { button, position } => {
            let mut mouse = window.mouse().borrow_mut();
            match button {
                MouseButton::Left => mouse.on_left_released(position),
                MouseButton::Right => mouse.on_right_released(position),
                MouseButton::Middle => {}
            }
        }
        Message::MouseWheel { delta, position } => {
            window.mouse().borrow_mut().on_wheel_delta(position, delta);
        }
        _ => {}
    }
}

fn handle_activate(window: &Window, active: bool) -> MessageResult {
    let lifecycle = window.lifecycle();
    if active {
        if matches!(lifecycle, WindowLifecycle::Created | WindowLifecycle::Inactive) {
            window.set_lifecycle(WindowLifecycle::Active);
            if window.input_mode() == InputMode::Raw {
                window.apply_native_cursor(InputMode::Raw);
            }
            window.dispatch_event(names::ON_ACTIVATED, &mut EventArgs::Plain);
        }
    } else if lifecycle == WindowLifecycle::Active {
        window.set_lifecycle(WindowLifecycle::Inactive);
        window.keyboard().borrow_mut().clear_state();
        window.mouse().borrow_mut().release_buttons();
        if window.input_mode() == InputMode::Raw {
            window.apply_native_cursor(InputMode::Cursor);
        }
        window.dispatch_event(names::ON_DEACTIVATE, &mut EventArgs::Plain);
    }
    // Default processing assigns the keyboard focus.
    MessageResult::Default
}

/*
 * Listeners of `OnClosing` may cancel. Otherwise the window raises `OnClosed`
 * and destroys its native window, which re-enters through `handle_destroy`.
 */
fn handle_close(window: &Window) -> MessageResult {
    if window.lifecycle().is_closing_or_later() {
        log::debug!(
            "WindowHandler: close for window {} ignored, already {:?}.",
            window.id().raw(),
            window.lifecycle()
        );
        return MessageResult::Handled(0);
    }
    let mut args = EventArgs::Closing(ClosingEventArgs {
        cancel: false,
        reason: CloseReason::UserClosing,
    });
    window.dispatch_event(names::ON_CLOSING, &mut args);
    if args.is_cancelled() == Some(true) {
        log::debug!("WindowHandler: close of window {} cancelled.", window.id().raw());
        return MessageResult::Handled(0);
    }

    if window.input_mode() == InputMode::Raw && window.lifecycle() == WindowLifecycle::Active {
        window.apply_native_cursor(InputMode::Cursor);
    }
    window.set_lifecycle(WindowLifecycle::Closing);
    window.dispatch_event(
        names::ON_CLOSED,
        &mut EventArgs::Closed(ClosedEventArgs {
            reason: CloseReason::UserClosing,
        }),
    );
    window.set_lifecycle(WindowLifecycle::Closed);
    if let Err(err) = window.destroy() {
        log::error!(
            "WindowHandler: destroying window {} failed: {err}",
            window.id().raw()
        );
    }
    MessageResult::Handled(0)
}

/*
 * A window destroyed without going through close (application exit, or the
 * system tearing it down) still reports `OnClosed` once.
 */
fn handle_destroy(window: &Window) -> MessageResult {
    let previous = window.lifecycle();
    if previous == WindowLifecycle::Destroyed {
        return MessageResult::Handled(0);
    }
    if previous != WindowLifecycle::Closed {
        window.dispatch_event(
            names::ON_CLOSED,
            &mut EventArgs::Closed(ClosedEventArgs {
                reason: CloseReason::ApplicationExit,
            }),
        );
    }
    window.set_lifecycle(WindowLifecycle::Destroyed);
    if window.input_mode() == InputMode::Raw && previous == WindowLifecycle::Active {
        window.apply_native_cursor(InputMode::Cursor);
    }
    window.dispose();

    let removed = runtime::remove_window(window.id());
    let remaining = runtime::window_count();
    log::debug!(
        "WindowHandler: window {} destroyed, {remaining} window(s) left.",
        window.id().raw()
    );
    if removed && remaining == 0 {
        window.backend().post_quit(0);
    }
    MessageResult::Handled(0)
}

fn handle_next_control(window: &Window, from: ControlId, reverse: bool) -> MessageResult {
    let stops = window.tab_stops();
    if stops.is_empty() {
        return MessageResult::Handled(0);
    }
    let count = stops.len();
    let next = match (stops.iter().position(|c| c.id() == from), reverse) {
        (Some(index), false) => (index + 1) % count,
        (Some(index), true) => (index + count - 1) % count,
        (None, false) => 0,
        (None, true) => count - 1,
    };
    log::trace!(
        "WindowHandler: tab from {} to {}",
        from.raw(),
        stops[next].id().raw()
    );
    stops[next].focus();
    MessageResult::Handled(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Application;
    use crate::headless::HeadlessBackend;
    use crate::input::{KeyEventKind, MouseEventKind};
    use crate::types::{ControlConfig, Point, VirtualKey, WindowConfig};

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessBackend>, Application, Window) {
        let backend = Rc::new(HeadlessBackend::new());
        let app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        (backend, app, window)
    }

    #[test]
    fn activation_cycles_lifecycle_and_clears_keys() {
        // Arrange
        let (backend, _app, window) = setup();
        let handle = window.native_handle();
        // Act
        backend.send(handle, Message::Activate { active: true });
        backend.send(
            handle,
            Message::KeyDown {
                key: VirtualKey::SPACE,
                repeat: false,
            },
        );
        let held = window.is_key_pressed(VirtualKey::SPACE);
        backend.send(handle, Message::Activate { active: false });
        // Assert
        assert!(held);
        assert_eq!(window.lifecycle(), WindowLifecycle::Inactive);
        assert!(!window.is_key_pressed(VirtualKey::SPACE));
    }

    #[test]
    fn cancelled_close_keeps_window_alive() {
        let (backend, _app, window) = setup();
        let closed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&closed);
        window.on_closing(|_, args| args.cancel = true);
        window.on_closed(move |_, _| flag.set(true));

        window.close();

        assert!(!closed.get());
        assert_ne!(window.lifecycle(), WindowLifecycle::Destroyed);
        assert!(backend.is_alive(window.native_handle()));
        assert_eq!(runtime::window_count(), 1);
    }

    #[test]
    fn close_runs_closing_closed_then_destroy_and_quits() {
        let (backend, app, window) = setup();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in [names::ON_CLOSING, names::ON_CLOSED, names::ON_DISPOSE] {
            let log = Rc::clone(&order);
            window.register_event(name, move |_, _| log.borrow_mut().push(name));
        }

        window.close();

        assert_eq!(
            *order.borrow(),
            vec![names::ON_CLOSING, names::ON_CLOSED, names::ON_DISPOSE]
        );
        assert_eq!(window.lifecycle(), WindowLifecycle::Destroyed);
        assert!(window.is_disposed());
        assert_eq!(app.window_count(), 0);
        assert_eq!(app.process_messages(), Some(0));
    }

    #[test]
    fn second_close_is_ignored() {
        let (_backend, _app, window) = setup();
        let closings = Rc::new(Cell::new(0));
        let counter = Rc::clone(&closings);
        window.on_closing(move |_, _| counter.set(counter.get() + 1));

        window.close();
        window.close();

        assert_eq!(closings.get(), 1);
    }

    #[test]
    fn closing_one_of_two_windows_does_not_quit() {
        let (backend, app, window) = setup();
        let _other = Window::create(&WindowConfig::default()).unwrap();

        window.close();

        assert_eq!(app.window_count(), 1);
        assert_eq!(app.process_messages(), None);
        assert!(!backend.quit_posted());
    }

    #[test]
    fn destroy_in_raw_mode_releases_cursor() {
        let (backend, _app, window) = setup();
        backend.send(window.native_handle(), Message::Activate { active: true });
        window.disable_cursor();
        assert!(!backend.is_cursor_visible());

        window.destroy().unwrap();

        assert!(backend.is_cursor_visible());
        assert!(backend.confined_to().is_none());
    }

    #[test]
    fn close_in_raw_mode_releases_cursor() {
        let (backend, _app, window) = setup();
        backend.send(window.native_handle(), Message::Activate { active: true });
        window.disable_cursor();

        window.close();

        assert_eq!(window.lifecycle(), WindowLifecycle::Destroyed);
        assert!(backend.is_cursor_visible());
        assert!(backend.confined_to().is_none());
    }

    #[test]
    fn input_messages_fill_buffers() {
        let (backend, _app, window) = setup();
        let handle = window.native_handle();

        backend.send(
            handle,
            Message::MouseMove {
                position: Point::new(4, 5),
            },
        );
        backend.send(
            handle,
            Message::MouseDown {
                button: MouseButton::Right,
                position: Point::new(4, 5),
            },
        );
        backend.send(handle, Message::Char { character: 'q' });
        backend.send(
            handle,
            Message::KeyUp {
                key: VirtualKey::from_char('Q'),
            },
        );

        let kinds: Vec<MouseEventKind> = window.mouse_events().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MouseEventKind::Enter,
                MouseEventKind::Move,
                MouseEventKind::RightPress
            ]
        );
        assert_eq!(window.mouse_position(), Point::new(4, 5));
        assert_eq!(window.chars().collect::<String>(), "q");
        assert_eq!(
            window.key_events().map(|e| e.kind).collect::<Vec<_>>(),
            vec![KeyEventKind::Release]
        );
    }

    #[test]
    fn raw_deltas_only_arrive_in_raw_mode() {
        let (backend, _app, window) = setup();
        let handle = window.native_handle();

        backend.send(handle, Message::RawMouse { dx: 1, dy: 1 });
        window.disable_cursor();
        backend.send(handle, Message::RawMouse { dx: 5, dy: -2 });

        let deltas: Vec<(i32, i32)> = window.raw_deltas().map(|d| (d.dx, d.dy)).collect();
        assert_eq!(deltas, vec![(5, -2)]);
    }

    #[test]
    fn tab_navigation_wraps_in_both_directions() {
        // Arrange
        let (backend, _app, window) = setup();
        let config = ControlConfig::new("b", 10, 10, 0, 0);
        let first = Control::create_button(&window, &config).unwrap();
        let panel = Control::create_panel(&window, &config).unwrap();
        let second = Control::create_button(&panel, &config).unwrap();
        let _label = Control::create_label(&window, &config).unwrap();
        let tab = Message::KeyDown {
            key: VirtualKey::TAB,
            repeat: false,
        };
        first.focus();
        // Act / Assert
        backend.send(first.native_handle(), tab.clone());
        assert_eq!(backend.focused(), Some(second.native_handle()));
        assert!(second.state().tab_selected);
        assert!(!first.state().tab_selected);

        backend.send(second.native_handle(), tab.clone());
        assert_eq!(backend.focused(), Some(first.native_handle()));

        backend.set_key_down(VirtualKey::SHIFT, true);
        backend.send(first.native_handle(), tab);
        assert_eq!(backend.focused(), Some(second.native_handle()));
    }
}

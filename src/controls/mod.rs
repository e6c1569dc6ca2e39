/*
 * Per-kind message handling. Every control kind has a handler implementing
 * `ControlBehavior`; the router looks it up with `behavior_for` and hands it
 * each message for a control of that kind.
 *
 * The trait's provided methods carry the behavior every control shares (hover
 * tracking, press and click, focus and Tab navigation, the input events). A
 * handler overrides only the hooks where its kind differs.
 */
pub(crate) mod button_handler;
pub(crate) mod label_handler;
pub(crate) mod panel_handler;
#[cfg(target_os = "windows")]
pub(crate) mod styling_handler;
pub(crate) mod window_handler;

use crate::control::Control;
use crate::event::{
    CommandEventArgs, EventArgs, KeyEventArgs, KeyPressEventArgs, MouseEventArgs, names,
};
use crate::message::{Message, MessageResult, MouseButton};
use crate::native::PaintRequest;
use crate::types::{ControlKind, Point, Rect, VirtualKey};

pub(crate) trait ControlBehavior {
    /// Runs once, right after the handle is registered and bound.
    fn on_create(&self, _control: &Control) {}

    fn handle_message(&self, control: &Control, message: Message) -> MessageResult {
        route_common(self, control, message)
    }

    fn mouse_enter(&self, control: &Control) -> MessageResult {
        if !control.state().hovered {
            control.backend().track_mouse_leave(control.native_handle());
        }
        control.update_state(|state| state.hovered = true);
        control.dispatch_event(names::ON_MOUSE_ENTER, &mut EventArgs::Plain);
        MessageResult::Handled(0)
    }

    fn mouse_leave(&self, control: &Control) -> MessageResult {
        control.update_state(|state| state.hovered = false);
        control.dispatch_event(names::ON_MOUSE_LEAVE, &mut EventArgs::Plain);
        MessageResult::Handled(0)
    }

    /*
     * Hover follows the client area. While the mouse is captured moves keep
     * arriving from outside it; those count as leaving, and the first move
     * back inside counts as entering.
     */
    fn mouse_move(&self, control: &Control, position: Point) -> MessageResult {
        let inside = Rect::from_location_size(Point::default(), control.size()).contains(position);
        let hovered = control.state().hovered;
        if inside && !hovered {
            self.mouse_enter(control);
        } else if !inside && hovered {
            self.mouse_leave(control);
        }
        let mut args = EventArgs::Mouse(MouseEventArgs::new(None, position, 0));
        control.dispatch_event(names::ON_MOUSE_MOVE, &mut args);
        MessageResult::Handled(0)
    }

    fn mouse_down(&self, control: &Control, button: MouseButton, position: Point) -> MessageResult {
        let mut args = EventArgs::Mouse(MouseEventArgs::new(Some(button), position, 1));
        control.dispatch_event(names::ON_MOUSE_DOWN, &mut args);
        if button == MouseButton::Left && control.is_enabled() {
            if control.kind().is_tab_stop() {
                control.focus();
            }
            control.backend().set_capture(control.native_handle(), true);
            control.update_state(|state| state.pressed = true);
        }
        MessageResult::Handled(0)
    }

    /*
     * A click needs both ends on this control: the press must have started here
     * and the pointer must still be over it when the button comes up.
     */
    fn mouse_up(&self, control: &Control, button: MouseButton, position: Point) -> MessageResult {
        let mut args = EventArgs::Mouse(MouseEventArgs::new(Some(button), position, 1));
        control.dispatch_event(names::ON_MOUSE_UP, &mut args);
        if button != MouseButton::Left {
            return MessageResult::Handled(0);
        }
        let state = control.state();
        if state.pressed {
            control.backend().set_capture(control.native_handle(), false);
        }
        if state.pressed && state.hovered {
            control.dispatch_event(names::ON_CLICK, &mut EventArgs::Plain);
            let mut args = EventArgs::Mouse(MouseEventArgs::new(Some(button), position, 1));
            control.dispatch_event(names::ON_MOUSE_CLICK, &mut args);
        }
        control.update_state(|state| state.pressed = false);
        MessageResult::Handled(0)
    }

    fn double_click(&self, control: &Control, button: MouseButton, position: Point) -> MessageResult {
        let mut args = EventArgs::Mouse(MouseEventArgs::new(Some(button), position, 2));
        control.dispatch_event(names::ON_MOUSE_DOUBLE_CLICK, &mut args);
        MessageResult::Handled(0)
    }

    fn mouse_wheel(&self, control: &Control, delta: i32, position: Point) -> MessageResult {
        let mut mouse = MouseEventArgs::new(None, position, 0);
        mouse.wheel_delta = delta;
        control.dispatch_event(names::ON_MOUSE_WHEEL, &mut EventArgs::Mouse(mouse));
        MessageResult::Handled(0)
    }

    fn key_down(&self, control: &Control, key: VirtualKey, repeat: bool) -> MessageResult {
        common_key_down(control, key, repeat)
    }

    fn key_up(&self, control: &Control, key: VirtualKey) -> MessageResult {
        common_key_up(control, key)
    }

    fn char_input(&self, control: &Control, character: char) -> MessageResult {
        let mut args = EventArgs::KeyPress(KeyPressEventArgs {
            character,
            handled: false,
        });
        control.dispatch_event(names::ON_KEY_PRESS, &mut args);
        MessageResult::Handled(0)
    }

    fn focus_enter(&self, control: &Control) -> MessageResult {
        control.update_state(|state| state.tab_selected = true);
        control.dispatch_event(names::ON_GOT_FOCUS, &mut EventArgs::Plain);
        MessageResult::Handled(0)
    }

    fn focus_leave(&self, control: &Control) -> MessageResult {
        control.update_state(|state| {
            state.tab_selected = false;
            state.pressed = false;
        });
        control.dispatch_event(names::ON_LOST_FOCUS, &mut EventArgs::Plain);
        MessageResult::Handled(0)
    }

    fn command(&self, control: &Control, id: u16, notification: u16) -> MessageResult {
        let mut args = EventArgs::Command(CommandEventArgs { id, notification });
        control.dispatch_event(names::ON_COMMAND, &mut args);
        MessageResult::Default
    }

    fn appearance(&self, control: &Control) -> PaintRequest {
        PaintRequest::fill(control.back_color())
    }

    fn paint(&self, control: &Control) -> MessageResult {
        let request = self.appearance(control);
        control.backend().paint(control.native_handle(), &request);
        MessageResult::Handled(0)
    }

    fn erase_background(&self, _control: &Control) -> MessageResult {
        MessageResult::Default
    }

    fn destroy(&self, control: &Control) -> MessageResult {
        control.dispose();
        MessageResult::Handled(0)
    }
}

/// Maps a message onto the behavior's hooks.
pub(crate) fn route_common<B>(behavior: &B, control: &Control, message: Message) -> MessageResult
where
    B: ControlBehavior + ?Sized,
{
    match message {
        Message::MouseEnter => behavior.mouse_enter(control),
        Message::MouseLeave => behavior.mouse_leave(control),
        Message::MouseMove { position } => behavior.mouse_move(control, position),
        Message::MouseDown { button, position } => behavior.mouse_down(control, button, position),
        Message::MouseUp { button, position } => behavior.mouse_up(control, button, position),
        Message::DoubleClick { button, position } => {
            behavior.double_click(control, button, position)
        }
        Message::MouseWheel { delta, position } => behavior.mouse_wheel(control, delta, position),
        Message::KeyDown { key, repeat } => behavior.key_down(control, key, repeat),
        Message::KeyUp { key } => behavior.key_up(control, key),
        Message::Char { character } => behavior.char_input(control, character),
        Message::FocusEnter => behavior.focus_enter(control),
        Message::FocusLeave => behavior.focus_leave(control),
        Message::Command { id, notification } => behavior.command(control, id, notification),
        Message::Paint => behavior.paint(control),
        Message::EraseBackground => behavior.erase_background(control),
        Message::Destroy => behavior.destroy(control),
        Message::Create { .. }
        | Message::Close
        | Message::Activate { .. }
        | Message::RawMouse { .. }
        | Message::NextControl { .. } => MessageResult::Default,
    }
}

/// Raises `OnKeyDown`; an unhandled Tab moves focus within the enclosing window.
pub(crate) fn common_key_down(control: &Control, key: VirtualKey, repeat: bool) -> MessageResult {
    let mut args = EventArgs::Key(KeyEventArgs {
        key,
        repeat,
        handled: false,
    });
    control.dispatch_event(names::ON_KEY_DOWN, &mut args);
    if matches!(args, EventArgs::Key(KeyEventArgs { handled: true, .. })) {
        return MessageResult::Handled(0);
    }
    if key == VirtualKey::TAB && !control.kind().is_top_level() {
        request_next_control(control);
    }
    MessageResult::Handled(0)
}

pub(crate) fn common_key_up(control: &Control, key: VirtualKey) -> MessageResult {
    let mut args = EventArgs::Key(KeyEventArgs {
        key,
        repeat: false,
        handled: false,
    });
    control.dispatch_event(names::ON_KEY_UP, &mut args);
    MessageResult::Handled(0)
}

/// Asks the enclosing window to move focus on from `control`.
fn request_next_control(control: &Control) {
    let Some(window) = control.enclosing_window() else {
        return;
    };
    let backend = control.backend();
    let reverse = backend.is_key_down(VirtualKey::SHIFT);
    backend.send_message(
        window.native_handle(),
        Message::NextControl {
            from: control.id(),
            reverse,
        },
    );
}

static WINDOW: window_handler::WindowHandler = window_handler::WindowHandler;
static BUTTON: button_handler::ButtonHandler = button_handler::ButtonHandler;
static LABEL: label_handler::LabelHandler = label_handler::LabelHandler;
static PANEL: panel_handler::PanelHandler = panel_handler::PanelHandler;

pub(crate) fn behavior_for(kind: ControlKind) -> &'static dyn ControlBehavior {
    match kind {
        ControlKind::Window => &WINDOW,
        ControlKind::Button => &BUTTON,
        ControlKind::Label => &LABEL,
        ControlKind::Panel => &PANEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Application;
    use crate::control::Window;
    use crate::headless::HeadlessBackend;
    use crate::types::{ControlConfig, WindowConfig};

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessBackend>, Application, Window) {
        let backend = Rc::new(HeadlessBackend::new());
        let app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        (backend, app, window)
    }

    fn press(button: MouseButton) -> Message {
        Message::MouseDown {
            button,
            position: Point::new(2, 2),
        }
    }

    fn release(button: MouseButton) -> Message {
        Message::MouseUp {
            button,
            position: Point::new(2, 2),
        }
    }

    #[test]
    fn click_needs_press_and_hover() {
        // Arrange
        let (backend, _app, window) = setup();
        let button = Control::create_button(&window, &ControlConfig::new("b", 10, 10, 0, 0)).unwrap();
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        button.on_click(move |_| counter.set(counter.get() + 1));
        let handle = button.native_handle();
        // Act
        backend.send(handle, Message::MouseEnter);
        backend.send(handle, press(MouseButton::Left));
        backend.send(handle, release(MouseButton::Left));
        // Assert
        assert_eq!(clicks.get(), 1);
        assert!(!button.state().pressed);
        assert!(button.state().hovered);
    }

    #[test]
    fn release_after_leaving_is_not_a_click() {
        let (backend, _app, window) = setup();
        let button = Control::create_button(&window, &ControlConfig::new("b", 10, 10, 0, 0)).unwrap();
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        button.on_click(move |_| counter.set(counter.get() + 1));
        let handle = button.native_handle();

        backend.send(handle, Message::MouseEnter);
        backend.send(handle, press(MouseButton::Left));
        backend.send(handle, Message::MouseLeave);
        backend.send(handle, release(MouseButton::Left));

        assert_eq!(clicks.get(), 0);
        assert!(!button.state().pressed);
    }

    #[test]
    fn captured_move_outside_clears_hover_and_suppresses_click() {
        // Arrange
        let (backend, _app, window) = setup();
        let button = Control::create_button(&window, &ControlConfig::new("b", 10, 10, 0, 0)).unwrap();
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        button.on_click(move |_| counter.set(counter.get() + 1));
        let handle = button.native_handle();
        let outside = Point::new(300, 300);
        backend.send(handle, Message::MouseMove { position: Point::new(5, 5) });
        backend.send(handle, press(MouseButton::Left));
        backend.send(handle, Message::MouseLeave);
        // Act
        backend.send(handle, Message::MouseMove { position: outside });
        let hovered_outside = button.state().hovered;
        backend.send(
            handle,
            Message::MouseUp {
                button: MouseButton::Left,
                position: outside,
            },
        );
        // Assert
        assert!(!hovered_outside);
        assert_eq!(clicks.get(), 0);
    }

    #[test]
    fn move_back_inside_while_captured_restores_click() {
        let (backend, _app, window) = setup();
        let button = Control::create_button(&window, &ControlConfig::new("b", 10, 10, 0, 0)).unwrap();
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        button.on_click(move |_| counter.set(counter.get() + 1));
        let handle = button.native_handle();

        backend.send(handle, Message::MouseMove { position: Point::new(5, 5) });
        backend.send(handle, press(MouseButton::Left));
        backend.send(handle, Message::MouseMove { position: Point::new(-4, 5) });
        assert!(!button.state().hovered);
        backend.send(handle, Message::MouseMove { position: Point::new(2, 2) });
        backend.send(handle, release(MouseButton::Left));

        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn first_move_counts_as_enter_and_tracks_leave() {
        let (backend, _app, window) = setup();
        let panel = Control::create_panel(&window, &ControlConfig::new("", 10, 10, 0, 0)).unwrap();
        let enters = Rc::new(Cell::new(0));
        let counter = Rc::clone(&enters);
        panel.on_mouse_enter(move |_| counter.set(counter.get() + 1));
        let handle = panel.native_handle();

        for x in 0..3 {
            backend.send(
                handle,
                Message::MouseMove {
                    position: Point::new(x, 0),
                },
            );
        }

        assert_eq!(enters.get(), 1);
        assert_eq!(backend.track_leave_count(handle), 1);
        assert_eq!(backend.invalidate_count(handle), 1);
    }

    #[test]
    fn focus_leave_clears_pressed_and_selection() {
        let (backend, _app, window) = setup();
        let button = Control::create_button(&window, &ControlConfig::new("b", 10, 10, 0, 0)).unwrap();
        let handle = button.native_handle();
        backend.send(handle, Message::MouseEnter);
        backend.send(handle, press(MouseButton::Left));
        assert!(button.state().tab_selected);

        backend.send(handle, Message::FocusLeave);

        assert!(!button.state().pressed);
        assert!(!button.state().tab_selected);
    }

    #[test]
    fn handled_key_down_skips_tab_navigation() {
        let (backend, _app, window) = setup();
        let first = Control::create_button(&window, &ControlConfig::new("1", 10, 10, 0, 0)).unwrap();
        let _second = Control::create_button(&window, &ControlConfig::new("2", 10, 10, 0, 0)).unwrap();
        first.focus();
        first.on_key_down(|_, args| args.handled = true);

        backend.send(
            first.native_handle(),
            Message::KeyDown {
                key: VirtualKey::TAB,
                repeat: false,
            },
        );

        assert_eq!(backend.focused(), Some(first.native_handle()));
    }

    #[test]
    fn wheel_and_double_click_carry_their_payload() {
        let (backend, _app, window) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for name in [names::ON_MOUSE_WHEEL, names::ON_MOUSE_DOUBLE_CLICK] {
            let log = Rc::clone(&seen);
            window.register_event(name, move |_, args| {
                if let EventArgs::Mouse(mouse) = args {
                    log.borrow_mut().push((mouse.clicks, mouse.wheel_delta));
                }
            });
        }

        backend.send(
            window.native_handle(),
            Message::MouseWheel {
                delta: -120,
                position: Point::new(0, 0),
            },
        );
        backend.send(
            window.native_handle(),
            Message::DoubleClick {
                button: MouseButton::Left,
                position: Point::new(0, 0),
            },
        );

        assert_eq!(*seen.borrow(), vec![(0, -120), (2, 0)]);
    }
}

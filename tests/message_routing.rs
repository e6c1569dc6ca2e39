//! End-to-end routing scenarios on the headless backend: messages enter the
//! way the OS would deliver them and come out as control events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use windows_wrapper::headless::NativeCall;
use windows_wrapper::registry;
use windows_wrapper::{
    Application, CloseReason, Control, ControlConfig, HeadlessBackend, InputMode, Message,
    MessageResult, MouseButton, Point, VirtualKey, Window, WindowConfig, WindowLifecycle,
};

fn app_with_window() -> (Rc<HeadlessBackend>, Application, Window) {
    let backend = Rc::new(HeadlessBackend::new());
    let app = Application::new(backend.clone()).unwrap();
    let window = app.create_window(&WindowConfig::default()).unwrap();
    (backend, app, window)
}

fn press_and_release(backend: &HeadlessBackend, control: &Control, at: Point) {
    let handle = control.native_handle();
    backend.send(handle, Message::MouseMove { position: at });
    backend.send(
        handle,
        Message::MouseDown {
            button: MouseButton::Left,
            position: at,
        },
    );
    backend.send(
        handle,
        Message::MouseUp {
            button: MouseButton::Left,
            position: at,
        },
    );
}

#[test]
fn button_click_reaches_listener_with_sender() {
    let (backend, _app, window) = app_with_window();
    let button =
        Control::create_button(&window, &ControlConfig::new("OK", 80, 24, 10, 10)).unwrap();
    let clicked = Rc::new(RefCell::new(Vec::new()));
    let sink = clicked.clone();
    button.on_click(move |sender| sink.borrow_mut().push(sender.text()));

    press_and_release(&backend, &button, Point::new(5, 5));

    assert_eq!(*clicked.borrow(), vec!["OK".to_string()]);
    assert_eq!(backend.focused(), Some(button.native_handle()));
}

#[test]
fn release_after_leaving_does_not_click() {
    let (backend, _app, window) = app_with_window();
    let button =
        Control::create_button(&window, &ControlConfig::new("OK", 80, 24, 10, 10)).unwrap();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();
    button.on_click(move |_| counter.set(counter.get() + 1));
    let handle = button.native_handle();

    backend.send(handle, Message::MouseMove { position: Point::new(1, 1) });
    backend.send(
        handle,
        Message::MouseDown {
            button: MouseButton::Left,
            position: Point::new(1, 1),
        },
    );
    backend.send(handle, Message::MouseLeave);
    backend.send(
        handle,
        Message::MouseUp {
            button: MouseButton::Left,
            position: Point::new(200, 200),
        },
    );

    assert_eq!(clicks.get(), 0);
    assert!(!button.state().pressed);
}

#[test]
fn cancelled_close_keeps_window_open() {
    let (backend, app, window) = app_with_window();
    window.on_closing(|_, args| args.cancel = true);

    window.close();

    assert_eq!(window.lifecycle(), WindowLifecycle::Created);
    assert!(backend.is_alive(window.native_handle()));
    assert_eq!(app.window_count(), 1);
    assert_eq!(app.process_messages(), None);
}

#[test]
fn closing_last_window_requests_quit() {
    let (backend, app, window) = app_with_window();
    let reasons = Rc::new(RefCell::new(Vec::new()));
    let sink = reasons.clone();
    window.on_closed(move |_, args| sink.borrow_mut().push(args.reason));

    window.close();

    assert_eq!(*reasons.borrow(), vec![CloseReason::UserClosing]);
    assert_eq!(window.lifecycle(), WindowLifecycle::Destroyed);
    assert!(window.is_disposed());
    assert_eq!(app.window_count(), 0);
    assert!(backend.quit_posted());
    assert_eq!(app.process_messages(), Some(0));
}

#[test]
fn showing_twice_notifies_once() {
    let (backend, _app, window) = app_with_window();
    let changes = Rc::new(Cell::new(0));
    let counter = changes.clone();
    window.on_visible_changed(move |_| counter.set(counter.get() + 1));

    window.show();
    window.show();
    window.hide();

    assert_eq!(changes.get(), 2);
    assert!(!backend.is_visible(window.native_handle()));
}

#[test]
fn raw_mode_toggle_keeps_cursor_and_mouse_in_lockstep() {
    let (backend, _app, window) = app_with_window();
    backend.send(window.native_handle(), Message::Activate { active: true });

    window.toggle_input_mode();
    assert_eq!(window.input_mode(), InputMode::Raw);
    assert!(window.is_raw_input_enabled());
    assert!(!backend.is_cursor_visible());
    assert_eq!(backend.confined_to(), Some(window.native_handle()));

    window.toggle_input_mode();
    assert!(window.is_cursor_enabled());
    assert!(!window.is_raw_input_enabled());
    assert!(backend.is_cursor_visible());
    assert_eq!(backend.confined_to(), None);
}

#[test]
fn destroyed_handles_no_longer_resolve() {
    let (_backend, _app, window) = app_with_window();
    let label =
        Control::create_label(&window, &ControlConfig::new("x", 10, 10, 0, 0)).unwrap();
    let window_handle = window.native_handle();
    let label_handle = label.native_handle();
    assert!(registry::resolve(label_handle).is_some());

    window.destroy().unwrap();

    assert!(registry::resolve(window_handle).is_none());
    assert!(registry::resolve(label_handle).is_none());
    assert!(label.is_disposed());
}

#[test]
fn messages_for_unknown_handles_fall_through() {
    let (backend, _app, _window) = app_with_window();
    let stranger = windows_wrapper::NativeHandle(0xDEAD_0000);

    let result = backend.send(
        stranger,
        Message::KeyDown {
            key: VirtualKey::SPACE,
            repeat: false,
        },
    );

    assert_eq!(result, MessageResult::Default);
}

#[test]
fn tab_moves_focus_between_buttons_and_wraps() {
    let (backend, _app, window) = app_with_window();
    let first = Control::create_button(&window, &ControlConfig::new("1", 10, 10, 0, 0)).unwrap();
    let second = Control::create_button(&window, &ControlConfig::new("2", 10, 10, 20, 0)).unwrap();
    first.focus();

    for expected in [&second, &first] {
        let focused = backend.focused().unwrap();
        backend.send(
            focused,
            Message::KeyDown {
                key: VirtualKey::TAB,
                repeat: false,
            },
        );
        assert_eq!(backend.focused(), Some(expected.native_handle()));
    }
}

#[test]
fn enter_then_leave_toggles_hover_with_one_repaint_each() {
    let (backend, _app, window) = app_with_window();
    let button =
        Control::create_button(&window, &ControlConfig::new("OK", 80, 24, 10, 10)).unwrap();
    let handle = button.native_handle();
    backend.clear_calls();

    backend.send(handle, Message::MouseEnter);
    let hovered_inside = button.state().hovered;
    backend.send(handle, Message::MouseLeave);

    assert!(hovered_inside);
    assert!(!button.state().hovered);
    assert_eq!(backend.invalidate_count(handle), 2);
}

#[test]
fn dragging_out_under_capture_does_not_click() {
    let (backend, _app, window) = app_with_window();
    let button =
        Control::create_button(&window, &ControlConfig::new("OK", 80, 24, 10, 10)).unwrap();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();
    button.on_click(move |_| counter.set(counter.get() + 1));
    let handle = button.native_handle();
    let outside = Point::new(300, 300);

    backend.send(handle, Message::MouseMove { position: Point::new(5, 5) });
    backend.send(
        handle,
        Message::MouseDown {
            button: MouseButton::Left,
            position: Point::new(5, 5),
        },
    );
    backend.send(handle, Message::MouseLeave);
    backend.send(handle, Message::MouseMove { position: outside });
    backend.send(
        handle,
        Message::MouseUp {
            button: MouseButton::Left,
            position: outside,
        },
    );

    assert_eq!(clicks.get(), 0);
    assert!(!button.state().hovered);
}

#[test]
fn cancelled_close_of_active_window_stays_active() {
    let (backend, app, window) = app_with_window();
    backend.send(window.native_handle(), Message::Activate { active: true });
    window.on_closing(|_, args| args.cancel = true);

    window.close();

    assert_eq!(window.lifecycle(), WindowLifecycle::Active);
    assert_eq!(app.window_count(), 1);
}

#[test]
fn raw_mode_survives_deactivate_and_reactivate() {
    let (backend, _app, window) = app_with_window();
    let handle = window.native_handle();
    backend.send(handle, Message::Activate { active: true });
    window.disable_cursor();

    backend.send(handle, Message::Activate { active: false });
    assert!(backend.is_cursor_visible());
    assert_eq!(backend.confined_to(), None);
    assert_eq!(window.input_mode(), InputMode::Raw);

    backend.send(handle, Message::Activate { active: true });
    assert!(!backend.is_cursor_visible());
    assert_eq!(backend.confined_to(), Some(handle));
}

#[test]
fn closing_raw_mode_window_gives_the_cursor_back() {
    let (backend, _app, window) = app_with_window();
    backend.send(window.native_handle(), Message::Activate { active: true });
    window.disable_cursor();

    window.close();

    assert_eq!(window.lifecycle(), WindowLifecycle::Destroyed);
    assert!(backend.is_cursor_visible());
    assert_eq!(backend.confined_to(), None);
}

#[test]
fn hiding_twice_hides_natively_once() {
    let (backend, _app, window) = app_with_window();
    window.show();
    backend.clear_calls();

    window.hide();
    window.hide();

    let hides = backend
        .calls()
        .into_iter()
        .filter(|call| matches!(call, NativeCall::Show { visible: false, .. }))
        .count();
    assert_eq!(hides, 1);
}

#[test]
fn disposing_a_window_closes_it_for_good() {
    let (backend, app, window) = app_with_window();
    let handle = window.native_handle();

    window.dispose();

    assert!(!backend.is_alive(handle));
    assert_eq!(app.window_count(), 0);
    assert_eq!(app.process_messages(), Some(0));
}

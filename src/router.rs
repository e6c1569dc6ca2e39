/*
 * Message Router. Native messages enter through one of two entry points:
 *
 * - `handle_message_setup` is bound to a handle from the moment it exists. It
 *   waits for the create message, which carries the control the handle belongs
 *   to, registers the pair and binds the handle on the control.
 * - `handle_message_forward` takes over once the handle is registered. It
 *   resolves the control and hands the message to the behavior of its kind.
 *
 * The registry is never borrowed while a behavior runs, so handlers may create,
 * destroy or message other controls synchronously.
 */
use crate::controls;
use crate::message::{Message, MessageResult};
use crate::registry;
use crate::types::NativeHandle;

/// Entry for a handle that has not been bound yet.
pub fn handle_message_setup(handle: NativeHandle, message: Message) -> MessageResult {
    match message {
        Message::Create { control } => {
            if let Err(err) = registry::register(handle, &control) {
                log::error!(
                    "Router: failed to register {handle:?} for control {}: {err}",
                    control.id().raw()
                );
                return MessageResult::Handled(0);
            }
            control.bind_native_handle(handle);
            controls::behavior_for(control.kind()).on_create(&control);
            log::debug!(
                "Router: bound {handle:?} to {:?} {}",
                control.kind(),
                control.id().raw()
            );
            MessageResult::Default
        }
        other => {
            log::trace!(
                "Router: {} for {handle:?} before create, default processing.",
                other.name()
            );
            MessageResult::Default
        }
    }
}

/// Entry for bound handles.
pub fn handle_message_forward(handle: NativeHandle, message: Message) -> MessageResult {
    let is_destroy = matches!(message, Message::Destroy);
    let result = match registry::resolve(handle) {
        Some(control) if is_destroy || !control.is_disposed() => {
            log::trace!(
                "Router: {} -> {:?} {}",
                message.name(),
                control.kind(),
                control.id().raw()
            );
            controls::behavior_for(control.kind()).handle_message(&control, message)
        }
        Some(_) => MessageResult::Default,
        None => {
            log::trace!("Router: no control for {handle:?}, default processing.");
            MessageResult::Default
        }
    };
    if is_destroy {
        registry::unregister(handle);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Application;
    use crate::control::{Control, Window};
    use crate::headless::HeadlessBackend;
    use crate::types::{ControlConfig, Point, WindowConfig};

    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn forward_miss_is_default_processing() {
        let backend = Rc::new(HeadlessBackend::new());
        let _app = Application::new(backend).unwrap();

        let result = handle_message_forward(NativeHandle(0xdead), Message::Paint);

        assert_eq!(result, MessageResult::Default);
    }

    #[test]
    fn setup_ignores_messages_before_create() {
        let result = handle_message_setup(NativeHandle(0x10), Message::MouseEnter);
        assert_eq!(result, MessageResult::Default);
    }

    #[test]
    fn setup_aborts_creation_when_handle_is_taken() {
        // Arrange
        let backend = Rc::new(HeadlessBackend::new());
        let _app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        let other = Control::create_label(&window, &ControlConfig::new("x", 1, 1, 0, 0)).unwrap();
        // Act
        let result = handle_message_setup(
            window.native_handle(),
            Message::Create {
                control: other.clone(),
            },
        );
        // Assert
        assert_eq!(result, MessageResult::Handled(0));
        assert_eq!(
            registry::resolve(window.native_handle()).map(|c| c.id()),
            Some(window.id())
        );
    }

    #[test]
    fn destroy_unregisters_after_handling() {
        let backend = Rc::new(HeadlessBackend::new());
        let _app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        let button = Control::create_button(&window, &ControlConfig::new("b", 1, 1, 0, 0)).unwrap();
        let handle = button.native_handle();

        button.destroy().unwrap();

        assert!(registry::resolve(handle).is_none());
        assert!(button.is_disposed());
        assert_eq!(handle_message_forward(handle, Message::Paint), MessageResult::Default);
    }

    #[test]
    fn nested_send_from_listener_is_routed() {
        let backend = Rc::new(HeadlessBackend::new());
        let _app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        let target = Control::create_button(&window, &ControlConfig::new("t", 1, 1, 0, 0)).unwrap();
        let source = Control::create_button(&window, &ControlConfig::new("s", 1, 1, 0, 0)).unwrap();
        let entered = Rc::new(Cell::new(false));
        let flag = Rc::clone(&entered);
        target.on_mouse_enter(move |_| flag.set(true));
        let nested_backend = Rc::clone(&backend);
        let target_handle = target.native_handle();
        source.on_mouse_enter(move |_| {
            nested_backend.send(target_handle, Message::MouseEnter);
        });

        backend.send(
            source.native_handle(),
            Message::MouseMove {
                position: Point::new(0, 0),
            },
        );

        assert!(entered.get());
        assert!(target.state().hovered);
    }
}

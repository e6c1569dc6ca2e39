/*
 * Panels are plain containers. They paint their background and, like the
 * window, let child controls handle their own input. Commands raised by
 * children are re-sent to the parent so they surface on the enclosing window
 * no matter how deeply the sender is nested.
 */

use crate::control::Control;
use crate::controls::ControlBehavior;
use crate::event::{CommandEventArgs, EventArgs, names};
use crate::message::{Message, MessageResult};

pub(crate) struct PanelHandler;

impl ControlBehavior for PanelHandler {
    fn command(&self, control: &Control, id: u16, notification: u16) -> MessageResult {
        let mut args = EventArgs::Command(CommandEventArgs { id, notification });
        control.dispatch_event(names::ON_COMMAND, &mut args);
        match control.parent() {
            Some(parent) if !parent.native_handle().is_null() => {
                log::trace!(
                    "PanelHandler: forwarding command {id} from panel {} to parent {}",
                    control.id().raw(),
                    parent.id().raw()
                );
                control
                    .backend()
                    .send_message(parent.native_handle(), Message::Command { id, notification })
            }
            _ => MessageResult::Default,
        }
    }

    fn erase_background(&self, _control: &Control) -> MessageResult {
        MessageResult::Handled(1)
    }
}

#[cfg(test)]
mod tests {
    use crate::app::Application;
    use crate::control::{Control, Window};
    use crate::headless::HeadlessBackend;
    use crate::message::Message;
    use crate::types::{Color, ControlConfig, WindowConfig};

    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn nested_command_reaches_the_window() {
        // Arrange
        let backend = Rc::new(HeadlessBackend::new());
        let _app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        let outer = Control::create_panel(&window, &ControlConfig::new("", 100, 100, 0, 0)).unwrap();
        let inner = Control::create_panel(&outer, &ControlConfig::new("", 50, 50, 0, 0)).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        window.on_command(move |_, args| log.borrow_mut().push(args.id));
        // Act
        backend.send(
            inner.native_handle(),
            Message::Command {
                id: 42,
                notification: 0,
            },
        );
        // Assert
        assert_eq!(*seen.borrow(), vec![42]);
    }

    #[test]
    fn panel_paints_its_background() {
        let backend = Rc::new(HeadlessBackend::new());
        let _app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        let panel = Control::create_panel(&window, &ControlConfig::new("", 10, 10, 0, 0)).unwrap();
        panel.set_back_color(Color::WHITE);

        backend.send(panel.native_handle(), Message::Paint);

        assert_eq!(backend.last_paint(panel.native_handle()).unwrap().background, Color::WHITE);
    }
}

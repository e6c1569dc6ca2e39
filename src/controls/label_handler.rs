/*
 * Static text labels. A label never takes focus and paints its text on its
 * background color; everything else is the shared control behavior.
 */

use crate::control::Control;
use crate::controls::ControlBehavior;
use crate::native::PaintRequest;

pub(crate) struct LabelHandler;

impl ControlBehavior for LabelHandler {
    fn appearance(&self, control: &Control) -> PaintRequest {
        PaintRequest {
            foreground: control.fore_color(),
            text: Some(control.text()),
            ..PaintRequest::fill(control.back_color())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::Application;
    use crate::control::{Control, Window};
    use crate::headless::HeadlessBackend;
    use crate::message::Message;
    use crate::types::{Color, ControlConfig, WindowConfig};

    use std::rc::Rc;

    #[test]
    fn label_paints_text_in_fore_color() {
        let backend = Rc::new(HeadlessBackend::new());
        let _app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        let label = Control::create_label(&window, &ControlConfig::new("Name:", 60, 20, 4, 4)).unwrap();
        label.set_fore_color(Color::rgb(200, 0, 0));

        backend.send(label.native_handle(), Message::Paint);

        let painted = backend.last_paint(label.native_handle()).unwrap();
        assert_eq!(painted.text.as_deref(), Some("Name:"));
        assert_eq!(painted.foreground, Color::rgb(200, 0, 0));
        assert_eq!(painted.outer_border, None);
    }

    #[test]
    fn clicking_a_label_does_not_take_focus() {
        let backend = Rc::new(HeadlessBackend::new());
        let _app = Application::new(backend.clone()).unwrap();
        let window = Window::create(&WindowConfig::default()).unwrap();
        let label = Control::create_label(&window, &ControlConfig::new("x", 10, 10, 0, 0)).unwrap();

        backend.send(
            label.native_handle(),
            Message::MouseDown {
                button: crate::message::MouseButton::Left,
                position: crate::types::Point::new(1, 1),
            },
        );

        assert_ne!(backend.focused(), Some(label.native_handle()));
        assert!(label.state().pressed);
    }
}

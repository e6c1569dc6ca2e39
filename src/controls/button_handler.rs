/*
 * Push buttons. On top of the shared control behavior a button clicks from the
 * keyboard (Enter down presses it, Enter up clicks it) and paints itself from
 * its interaction state: border, focus dots and fill follow the standard
 * flat-look button of the desktop theme.
 */

use crate::control::{Control, ControlState};
use crate::controls::{self, ControlBehavior};
use crate::event::{EventArgs, names};
use crate::message::MessageResult;
use crate::native::{Border, PaintRequest};
use crate::types::{Color, VirtualKey};

const ACCENT: Color = Color::rgb(0, 120, 215);
const ACCENT_DARK: Color = Color::rgb(0, 84, 153);
const HOVER_FACE: Color = Color::rgb(229, 241, 251);
const PRESSED_FACE: Color = Color::rgb(204, 228, 247);
const IDLE_BORDER: Color = Color::rgb(173, 173, 173);
const DISABLED_TEXT: Color = Color::rgb(109, 109, 109);

pub(crate) struct ButtonHandler;

/*
 * Resolves the look of a button for one paint pass. Pressing wins over hover,
 * hover over plain focus. The face color is the control's background unless
 * the button is pressed or hovered.
 */
pub(crate) fn appearance(
    state: ControlState,
    enabled: bool,
    back_color: Color,
    fore_color: Color,
    text: &str,
) -> PaintRequest {
    let border = |color, width| Some(Border { color, width });
    let (outer_border, inner_border, focus_dots, background) = if state.pressed {
        (
            border(ACCENT_DARK, 1),
            border(PRESSED_FACE, 2),
            Some(Color::BLACK),
            PRESSED_FACE,
        )
    } else if state.hovered {
        let dots = state.tab_selected.then_some(Color::BLACK);
        (border(ACCENT, 1), border(HOVER_FACE, 2), dots, HOVER_FACE)
    } else if state.tab_selected {
        (
            border(ACCENT, 2),
            border(Color::CONTROL, 1),
            Some(Color::BLACK),
            back_color,
        )
    } else {
        (
            border(IDLE_BORDER, 1),
            border(Color::CONTROL, 2),
            None,
            back_color,
        )
    };
    PaintRequest {
        background,
        foreground: if enabled { fore_color } else { DISABLED_TEXT },
        text: Some(text.to_string()),
        outer_border,
        inner_border,
        focus_dots,
    }
}

impl ControlBehavior for ButtonHandler {
    fn key_down(&self, control: &Control, key: VirtualKey, repeat: bool) -> MessageResult {
        if key == VirtualKey::RETURN && control.is_enabled() {
            control.update_state(|state| state.pressed = true);
        }
        controls::common_key_down(control, key, repeat)
    }

    fn key_up(&self, control: &Control, key: VirtualKey) -> MessageResult {
        if key == VirtualKey::RETURN && control.state().pressed {
            log::debug!("ButtonHandler: Enter click on button {}", control.id().raw());
            control.dispatch_event(names::ON_CLICK, &mut EventArgs::Plain);
            control.update_state(|state| state.pressed = false);
        }
        controls::common_key_up(control, key)
    }

    fn appearance(&self, control: &Control) -> PaintRequest {
        appearance(
            control.state(),
            control.is_enabled(),
            control.back_color(),
            control.fore_color(),
            &control.text(),
        )
    }

    // The paint pass covers the whole client area.
    fn erase_background(&self, _control: &Control) -> MessageResult {
        MessageResult::Handled(1)
    }
}

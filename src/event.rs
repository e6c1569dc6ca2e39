/*
 * Named, ordered event dispatch. Each control owns an `EventDispatcher` that
 * maps an event name to the listeners registered under it. Dispatch invokes a
 * snapshot of the listener list, so listeners may register more listeners, clear
 * the dispatcher, or trigger nested native messages without invalidating the
 * iteration.
 *
 * Argument payloads are polymorphic over `EventArgs`. Cancel-capable payloads
 * carry a flag that listeners may set; interpreting it is the caller's job.
 */
use crate::message::MouseButton;
use crate::types::{Point, VirtualKey};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub mod names {
    pub const ON_CLICK: &str = "OnClick";
    pub const ON_MOUSE_CLICK: &str = "OnMouseClick";
    pub const ON_MOUSE_DOUBLE_CLICK: &str = "OnMouseDoubleClick";
    pub const ON_MOUSE_DOWN: &str = "OnMouseDown";
    pub const ON_MOUSE_UP: &str = "OnMouseUp";
    pub const ON_MOUSE_ENTER: &str = "OnMouseEnter";
    pub const ON_MOUSE_LEAVE: &str = "OnMouseLeave";
    pub const ON_MOUSE_MOVE: &str = "OnMouseMove";
    pub const ON_MOUSE_WHEEL: &str = "OnMouseWheel";
    pub const ON_KEY_DOWN: &str = "OnKeyDown";
    pub const ON_KEY_UP: &str = "OnKeyUp";
    pub const ON_KEY_PRESS: &str = "OnKeyPress";
    pub const ON_GOT_FOCUS: &str = "OnGotFocus";
    pub const ON_LOST_FOCUS: &str = "OnLostFocus";
    pub const ON_VISIBLE_CHANGED: &str = "OnVisibleChanged";
    pub const ON_TEXT_CHANGED: &str = "OnTextChanged";
    pub const ON_ACTIVATED: &str = "OnActivated";
    pub const ON_DEACTIVATE: &str = "OnDeactivate";
    pub const ON_CLOSING: &str = "OnClosing";
    pub const ON_CLOSED: &str = "OnClosed";
    pub const ON_COMMAND: &str = "OnCommand";
    pub const ON_DISPOSE: &str = "OnDispose";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEventArgs {
    pub key: VirtualKey,
    pub repeat: bool,
    pub handled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPressEventArgs {
    pub character: char,
    pub handled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEventArgs {
    pub button: Option<MouseButton>,
    pub position: Point,
    pub clicks: u32,
    pub wheel_delta: i32,
}

impl MouseEventArgs {
    pub fn new(button: Option<MouseButton>, position: Point, clicks: u32) -> Self {
        MouseEventArgs {
            button,
            position,
            clicks,
            wheel_delta: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CancelEventArgs {
    pub cancel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    UserClosing,
    ApplicationExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingEventArgs {
    pub cancel: bool,
    pub reason: CloseReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedEventArgs {
    pub reason: CloseReason,
}

/// A control-originated notification or menu/accelerator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEventArgs {
    pub id: u16,
    pub notification: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventArgs {
    Plain,
    Key(KeyEventArgs),
    KeyPress(KeyPressEventArgs),
    Mouse(MouseEventArgs),
    Cancel(CancelEventArgs),
    Closing(ClosingEventArgs),
    Closed(ClosedEventArgs),
    Command(CommandEventArgs),
}

impl EventArgs {
    /// `Some(flag)` for cancel-capable payloads.
    pub fn is_cancelled(&self) -> Option<bool> {
        match self {
            EventArgs::Cancel(args) => Some(args.cancel),
            EventArgs::Closing(args) => Some(args.cancel),
            _ => None,
        }
    }
}

pub type Listener<S> = Rc<dyn Fn(&S, &mut EventArgs)>;

/// Per-control registry of named events and their ordered listeners.
pub struct EventDispatcher<S> {
    handlers: RefCell<HashMap<String, Vec<Listener<S>>>>,
}

impl<S> EventDispatcher<S> {
    pub fn new() -> Self {
        EventDispatcher {
            handlers: RefCell::new(HashMap::new()),
        }
    }

    /// Appends `listener` under `name`. The same listener registered twice runs twice.
    pub fn register(&self, name: &str, listener: Listener<S>) {
        self.handlers
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push(listener);
    }

    /// Invokes every listener registered under `name`, in registration order.
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, name: &str, sender: &S, args: &mut EventArgs) -> usize {
        let snapshot: Vec<Listener<S>> = match self.handlers.borrow().get(name) {
            Some(listeners) => listeners.clone(),
            None => return 0,
        };
        for listener in &snapshot {
            listener(sender, args);
        }
        snapshot.len()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.handlers.borrow().get(name).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    pub fn clear(&self) {
        let drained = std::mem::take(&mut *self.handlers.borrow_mut());
        // Listeners may own controls; drop them after the borrow is released.
        drop(drained);
    }
}

impl<S> Default for EventDispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for EventDispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.borrow();
        let mut names: Vec<&String> = handlers.keys().collect();
        names.sort();
        f.debug_struct("EventDispatcher")
            .field("events", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Listener<u32> {
        let log = Rc::clone(log);
        Rc::new(move |_sender: &u32, _args: &mut EventArgs| log.borrow_mut().push(tag))
    }

    #[test]
    fn dispatch_runs_listeners_in_registration_order() {
        // Arrange
        let events = EventDispatcher::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        events.register(names::ON_CLICK, recorder(&log, "L1"));
        events.register(names::ON_CLICK, recorder(&log, "L2"));
        events.register(names::ON_CLICK, recorder(&log, "L3"));
        // Act
        let invoked = events.dispatch(names::ON_CLICK, &1, &mut EventArgs::Plain);
        // Assert
        assert_eq!(invoked, 3);
        assert_eq!(*log.borrow(), vec!["L1", "L2", "L3"]);
    }

    #[test]
    fn same_listener_registered_twice_runs_twice() {
        let events = EventDispatcher::<u32>::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let listener: Listener<u32> =
            Rc::new(move |_: &u32, _: &mut EventArgs| counter.set(counter.get() + 1));
        events.register("OnClick", Rc::clone(&listener));
        events.register("OnClick", listener);

        events.dispatch("OnClick", &0, &mut EventArgs::Plain);

        assert_eq!(count.get(), 2);
    }

    #[test]
    fn unknown_event_is_a_no_op() {
        let events = EventDispatcher::<u32>::new();
        assert_eq!(events.dispatch("OnNothing", &0, &mut EventArgs::Plain), 0);
    }

    #[test]
    fn clear_is_idempotent_and_silences_dispatch() {
        let events = EventDispatcher::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        events.register(names::ON_CLICK, recorder(&log, "L1"));

        events.clear();
        events.clear();

        assert!(events.is_empty());
        assert_eq!(events.dispatch(names::ON_CLICK, &0, &mut EventArgs::Plain), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cancel_flag_is_left_for_the_caller() {
        let events = EventDispatcher::<u32>::new();
        events.register(
            names::ON_CLOSING,
            Rc::new(|_: &u32, args: &mut EventArgs| {
                if let EventArgs::Closing(closing) = args {
                    closing.cancel = true;
                }
            }),
        );
        let mut args = EventArgs::Closing(ClosingEventArgs {
            cancel: false,
            reason: CloseReason::UserClosing,
        });

        events.dispatch(names::ON_CLOSING, &0, &mut args);

        assert_eq!(args.is_cancelled(), Some(true));
    }

    #[test]
    fn listener_may_register_during_dispatch() {
        let events = Rc::new(EventDispatcher::<u32>::new());
        let count = Rc::new(Cell::new(0));
        let inner_events = Rc::clone(&events);
        let inner_count = Rc::clone(&count);
        events.register(
            names::ON_CLICK,
            Rc::new(move |_: &u32, _: &mut EventArgs| {
                let counter = Rc::clone(&inner_count);
                inner_events.register(
                    names::ON_CLICK,
                    Rc::new(move |_: &u32, _: &mut EventArgs| counter.set(counter.get() + 1)),
                );
            }),
        );

        // The listener added mid-dispatch is not part of the running snapshot.
        events.dispatch(names::ON_CLICK, &0, &mut EventArgs::Plain);
        assert_eq!(count.get(), 0);
        assert_eq!(events.listener_count(names::ON_CLICK), 2);

        events.dispatch(names::ON_CLICK, &0, &mut EventArgs::Plain);
        assert_eq!(count.get(), 1);
    }
}

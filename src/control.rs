/*
 * The managed side of a native window: `Control` is a cheap, clonable handle to
 * a node in the control tree, and `Window` is a top-level control that also
 * owns the keyboard and mouse buffers, the lifecycle state and the input mode.
 *
 * Ownership runs downward. A parent owns its children (`Vec<Control>`), a
 * child points back through a `Weak` link, and the handle registry only holds
 * weak references. Native messages reach a control through the router; the
 * public methods here are what application code calls.
 *
 * No `RefCell` in this module is borrowed across a call into listeners or into
 * the backend. Both may re-enter and touch the same control.
 */
use crate::event::{
    ClosedEventArgs, ClosingEventArgs, CommandEventArgs, EventArgs, EventDispatcher,
    KeyEventArgs, KeyPressEventArgs, MouseEventArgs, names,
};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::input::{Keyboard, KeyboardEvent, Mouse, MouseEvent, RawDelta};
use crate::message::Message;
use crate::native::{CreateRequest, NativeBackend};
use crate::registry;
use crate::runtime;
use crate::types::{
    Color, ControlConfig, ControlId, ControlKind, NativeHandle, Point, Rect, Size, Spacing,
    VirtualKey, WindowConfig,
};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Visual interaction state. Mutated by message handling and by `show`/`hide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub hovered: bool,
    pub pressed: bool,
    pub tab_selected: bool,
    pub visible: bool,
}

impl ControlState {
    fn visuals(self) -> (bool, bool, bool) {
        (self.hovered, self.pressed, self.tab_selected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLifecycle {
    Created,
    Active,
    Inactive,
    Closing,
    Closed,
    Destroyed,
}

impl WindowLifecycle {
    /// Closing has started; further close requests are ignored.
    pub fn is_closing_or_later(self) -> bool {
        matches!(
            self,
            WindowLifecycle::Closing | WindowLifecycle::Closed | WindowLifecycle::Destroyed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Visible, free cursor; mouse input arrives as positions.
    Cursor,
    /// Hidden cursor confined to the window; mouse input arrives as raw deltas.
    Raw,
}

#[derive(Debug)]
pub(crate) struct WindowParts {
    pub(crate) keyboard: RefCell<Keyboard>,
    pub(crate) mouse: RefCell<Mouse>,
    input_mode: Cell<InputMode>,
    lifecycle: Cell<WindowLifecycle>,
    raw_toggle_key: Option<VirtualKey>,
}

pub(crate) struct ControlInner {
    id: ControlId,
    kind: ControlKind,
    handle: Cell<NativeHandle>,
    parent: RefCell<Weak<ControlInner>>,
    children: RefCell<Vec<Control>>,
    text: RefCell<String>,
    location: Cell<Point>,
    size: Cell<Size>,
    fore_color: Cell<Color>,
    back_color: Cell<Color>,
    margin: Cell<Spacing>,
    padding: Cell<Spacing>,
    enabled: Cell<bool>,
    disposed: Cell<bool>,
    state: Cell<ControlState>,
    events: EventDispatcher<Control>,
    backend: Rc<dyn NativeBackend>,
    window: Option<Rc<WindowParts>>,
}

impl ControlInner {
    pub(crate) fn id(&self) -> ControlId {
        self.id
    }
}

#[derive(Clone)]
pub struct Control {
    inner: Rc<ControlInner>,
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("handle", &self.inner.handle.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl PartialEq for Control {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Control {}

fn default_back_color(kind: ControlKind) -> Color {
    match kind {
        ControlKind::Window | ControlKind::Label => Color::WINDOW,
        ControlKind::Button | ControlKind::Panel => Color::CONTROL,
    }
}

impl Control {
    pub(crate) fn inner(&self) -> &Rc<ControlInner> {
        &self.inner
    }

    pub(crate) fn from_inner(inner: Rc<ControlInner>) -> Self {
        Control { inner }
    }

    pub fn create_button(parent: &Control, config: &ControlConfig) -> PlatformResult<Control> {
        Self::construct(ControlKind::Button, Some(parent), config, None)
    }

    pub fn create_label(parent: &Control, config: &ControlConfig) -> PlatformResult<Control> {
        Self::construct(ControlKind::Label, Some(parent), config, None)
    }

    pub fn create_panel(parent: &Control, config: &ControlConfig) -> PlatformResult<Control> {
        Self::construct(ControlKind::Panel, Some(parent), config, None)
    }

    /*
     * Builds the managed node, then asks the backend for the native window. The
     * backend delivers the create message to the router's setup entry, which
     * registers the handle and stores it on the node before `create_window`
     * returns; a handle that comes back without that binding is torn down again.
     */
    fn construct(
        kind: ControlKind,
        parent: Option<&Control>,
        config: &ControlConfig,
        window: Option<Rc<WindowParts>>,
    ) -> PlatformResult<Control> {
        let backend = runtime::backend()?;
        if let Some(parent) = parent {
            if parent.is_disposed() {
                return Err(PlatformError::Disposed(parent.id()));
            }
            if parent.native_handle().is_null() {
                return Err(PlatformError::InvalidHandle(format!(
                    "parent control {} has no native handle",
                    parent.id().raw()
                )));
            }
        }

        let control = Control {
            inner: Rc::new(ControlInner {
                id: ControlId::next(),
                kind,
                handle: Cell::new(NativeHandle::NULL),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                text: RefCell::new(config.text.clone()),
                location: Cell::new(config.location),
                size: Cell::new(config.size),
                fore_color: Cell::new(Color::BLACK),
                back_color: Cell::new(default_back_color(kind)),
                margin: Cell::new(Spacing::default()),
                padding: Cell::new(Spacing::default()),
                enabled: Cell::new(true),
                disposed: Cell::new(false),
                state: Cell::new(ControlState::default()),
                events: EventDispatcher::new(),
                backend: Rc::clone(&backend),
                window,
            }),
        };
        log::debug!(
            "Control: creating {kind:?} {} (parent {:?})",
            control.id().raw(),
            parent.map(|p| p.id().raw())
        );

        let request = CreateRequest {
            control: control.clone(),
            kind,
            parent: parent.map(Control::native_handle),
            text: config.text.clone(),
            location: config.location,
            size: config.size,
        };
        let handle = match backend.create_window(&request) {
            Ok(handle) => handle,
            Err(err) => {
                let bound = control.native_handle();
                if !bound.is_null() {
                    registry::unregister(bound);
                }
                log::error!(
                    "Control: native creation of {kind:?} {} failed: {err}",
                    control.id().raw()
                );
                return Err(err);
            }
        };
        if control.native_handle() != handle {
            log::error!(
                "Control: handle {handle:?} for control {} was never bound by the create message.",
                control.id().raw()
            );
            if let Err(err) = backend.destroy_window(handle) {
                log::warn!("Control: cleanup of unbound handle {handle:?} failed: {err}");
            }
            return Err(PlatformError::OperationFailed(format!(
                "native window for control {} was not bound during creation",
                control.id().raw()
            )));
        }

        if let Some(parent) = parent {
            *control.inner.parent.borrow_mut() = Rc::downgrade(&parent.inner);
            parent.inner.children.borrow_mut().push(control.clone());
        }
        Ok(control)
    }

    /// Called by the router while handling the create message.
    pub(crate) fn bind_native_handle(&self, handle: NativeHandle) {
        let current = self.inner.handle.get();
        if current.is_null() {
            self.inner.handle.set(handle);
        } else if current != handle {
            log::warn!(
                "Control: control {} already bound to {current:?}, ignoring {handle:?}",
                self.id().raw()
            );
        }
    }

    pub fn id(&self) -> ControlId {
        self.inner.id
    }

    pub fn kind(&self) -> ControlKind {
        self.inner.kind
    }

    pub fn native_handle(&self) -> NativeHandle {
        self.inner.handle.get()
    }

    pub(crate) fn backend(&self) -> &Rc<dyn NativeBackend> {
        &self.inner.backend
    }

    fn live_handle(&self) -> Option<NativeHandle> {
        let handle = self.native_handle();
        (!handle.is_null() && !self.is_disposed()).then_some(handle)
    }

    pub fn state(&self) -> ControlState {
        self.inner.state.get()
    }

    /// Applies `update` to the state and repaints once if the visual part changed.
    /// Returns whether it changed.
    pub(crate) fn update_state(&self, update: impl FnOnce(&mut ControlState)) -> bool {
        let before = self.inner.state.get();
        let mut after = before;
        update(&mut after);
        self.inner.state.set(after);
        let changed = before.visuals() != after.visuals();
        if changed {
            if let Some(handle) = self.live_handle() {
                self.inner.backend.invalidate(handle);
            }
        }
        changed
    }

    pub fn text(&self) -> String {
        self.inner.text.borrow().clone()
    }

    pub fn set_text(&self, text: &str) -> PlatformResult<()> {
        if *self.inner.text.borrow() == text {
            return Ok(());
        }
        if let Some(handle) = self.live_handle() {
            self.inner.backend.set_text(handle, text)?;
        }
        *self.inner.text.borrow_mut() = text.to_string();
        self.dispatch_event(names::ON_TEXT_CHANGED, &mut EventArgs::Plain);
        Ok(())
    }

    pub fn location(&self) -> Point {
        self.inner.location.get()
    }

    pub fn size(&self) -> Size {
        self.inner.size.get()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_location_size(self.location(), self.size())
    }

    pub fn set_bounds(&self, location: Point, size: Size) -> PlatformResult<()> {
        if let Some(handle) = self.live_handle() {
            self.inner
                .backend
                .set_bounds(handle, Rect::from_location_size(location, size))?;
        }
        self.inner.location.set(location);
        self.inner.size.set(size);
        Ok(())
    }

    pub fn fore_color(&self) -> Color {
        self.inner.fore_color.get()
    }

    pub fn set_fore_color(&self, color: Color) {
        self.inner.fore_color.set(color);
        self.invalidate();
    }

    pub fn back_color(&self) -> Color {
        self.inner.back_color.get()
    }

    pub fn set_back_color(&self, color: Color) {
        self.inner.back_color.set(color);
        self.invalidate();
    }

    pub fn margin(&self) -> Spacing {
        self.inner.margin.get()
    }

    pub fn set_margin(&self, margin: Spacing) {
        self.inner.margin.set(margin);
    }

    pub fn padding(&self) -> Spacing {
        self.inner.padding.get()
    }

    pub fn set_padding(&self, padding: Spacing) {
        self.inner.padding.set(padding);
        self.invalidate();
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        if self.inner.enabled.replace(enabled) == enabled {
            return;
        }
        if let Some(handle) = self.live_handle() {
            self.inner.backend.enable_window(handle, enabled);
            self.inner.backend.invalidate(handle);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state().visible
    }

    /// Makes the control visible. Calling it on a visible control does nothing.
    pub fn show(&self) {
        self.set_visible(true);
    }

    pub fn hide(&self) {
        self.set_visible(false);
    }

    fn set_visible(&self, visible: bool) {
        if self.state().visible == visible {
            return;
        }
        self.update_state(|state| state.visible = visible);
        if let Some(handle) = self.live_handle() {
            self.inner.backend.show_window(handle, visible);
        }
        self.dispatch_event(names::ON_VISIBLE_CHANGED, &mut EventArgs::Plain);
    }

    pub fn invalidate(&self) {
        if let Some(handle) = self.live_handle() {
            self.inner.backend.invalidate(handle);
        }
    }

    pub fn focus(&self) {
        if !self.is_enabled() {
            return;
        }
        if let Some(handle) = self.live_handle() {
            self.inner.backend.set_focus(handle);
        }
    }

    /// Destroys the native window. The destroy message disposes the managed side.
    pub fn destroy(&self) -> PlatformResult<()> {
        match self.live_handle() {
            Some(handle) => self.inner.backend.destroy_window(handle),
            None => Ok(()),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /*
     * Releases the managed side of this control and its subtree: raises
     * `OnDispose`, disposes the children (over a snapshot, listeners may
     * reshape the tree), drops every listener and detaches from the parent.
     * A second call is a no-op.
     *
     * A live top-level window is destroyed natively instead, so it leaves the
     * application's window list the same way a closed window does. If that
     * fails the window is dropped from the list here.
     */
    pub fn dispose(&self) {
        if let Some(window) = Window::from_control(self) {
            if !self.is_disposed() && window.lifecycle() != WindowLifecycle::Destroyed {
                if let Err(err) = self.destroy() {
                    log::warn!(
                        "Control: native destroy of window {} failed: {err}",
                        self.id().raw()
                    );
                }
                if self.is_disposed() {
                    return;
                }
                runtime::remove_window(self.id());
            }
        }
        self.release();
    }

    fn release(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        log::debug!("Control: disposing {:?} {}", self.kind(), self.id().raw());
        self.inner
            .events
            .dispatch(names::ON_DISPOSE, self, &mut EventArgs::Plain);

        let children: Vec<Control> = self.inner.children.borrow().clone();
        for child in &children {
            child.dispose();
        }
        self.inner.events.clear();
        let released = std::mem::take(&mut *self.inner.children.borrow_mut());
        drop(released);

        if let Some(parent) = self.parent() {
            parent
                .inner
                .children
                .borrow_mut()
                .retain(|child| !Rc::ptr_eq(&child.inner, &self.inner));
        }
        *self.inner.parent.borrow_mut() = Weak::new();
    }

    pub fn parent(&self) -> Option<Control> {
        self.inner.parent.borrow().upgrade().map(Control::from_inner)
    }

    pub fn children(&self) -> Vec<Control> {
        self.inner.children.borrow().clone()
    }

    /// The top-level window this control lives in; a window is its own.
    pub fn enclosing_window(&self) -> Option<Window> {
        let mut current = self.clone();
        loop {
            if let Some(window) = Window::from_control(&current) {
                return Some(window);
            }
            current = current.parent()?;
        }
    }

    /// Depth-first pre-order walk of the subtree below this control.
    pub(crate) fn descendants(&self) -> Vec<Control> {
        let mut out = Vec::new();
        for child in self.children() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    pub fn register_event(&self, name: &str, listener: impl Fn(&Control, &mut EventArgs) + 'static) {
        self.inner.events.register(name, Rc::new(listener));
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.inner.events.listener_count(name)
    }

    pub(crate) fn dispatch_event(&self, name: &str, args: &mut EventArgs) -> usize {
        self.inner.events.dispatch(name, self, args)
    }

    pub fn on_click(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_CLICK, move |control, _| listener(control));
    }

    pub fn on_mouse_enter(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_MOUSE_ENTER, move |control, _| listener(control));
    }

    pub fn on_mouse_leave(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_MOUSE_LEAVE, move |control, _| listener(control));
    }

    pub fn on_mouse_down(&self, listener: impl Fn(&Control, &MouseEventArgs) + 'static) {
        self.register_mouse(names::ON_MOUSE_DOWN, listener);
    }

    pub fn on_mouse_up(&self, listener: impl Fn(&Control, &MouseEventArgs) + 'static) {
        self.register_mouse(names::ON_MOUSE_UP, listener);
    }

    pub fn on_mouse_move(&self, listener: impl Fn(&Control, &MouseEventArgs) + 'static) {
        self.register_mouse(names::ON_MOUSE_MOVE, listener);
    }

    pub fn on_mouse_click(&self, listener: impl Fn(&Control, &MouseEventArgs) + 'static) {
        self.register_mouse(names::ON_MOUSE_CLICK, listener);
    }

    pub fn on_mouse_wheel(&self, listener: impl Fn(&Control, &MouseEventArgs) + 'static) {
        self.register_mouse(names::ON_MOUSE_WHEEL, listener);
    }

    fn register_mouse(&self, name: &str, listener: impl Fn(&Control, &MouseEventArgs) + 'static) {
        self.register_event(name, move |control, args| {
            if let EventArgs::Mouse(mouse) = args {
                listener(control, mouse);
            }
        });
    }

    pub fn on_key_down(&self, listener: impl Fn(&Control, &mut KeyEventArgs) + 'static) {
        self.register_event(names::ON_KEY_DOWN, move |control, args| {
            if let EventArgs::Key(key) = args {
                listener(control, key);
            }
        });
    }

    pub fn on_key_up(&self, listener: impl Fn(&Control, &mut KeyEventArgs) + 'static) {
        self.register_event(names::ON_KEY_UP, move |control, args| {
            if let EventArgs::Key(key) = args {
                listener(control, key);
            }
        });
    }

    pub fn on_key_press(&self, listener: impl Fn(&Control, &mut KeyPressEventArgs) + 'static) {
        self.register_event(names::ON_KEY_PRESS, move |control, args| {
            if let EventArgs::KeyPress(press) = args {
                listener(control, press);
            }
        });
    }

    pub fn on_got_focus(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_GOT_FOCUS, move |control, _| listener(control));
    }

    pub fn on_lost_focus(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_LOST_FOCUS, move |control, _| listener(control));
    }

    pub fn on_visible_changed(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_VISIBLE_CHANGED, move |control, _| listener(control));
    }

    pub fn on_text_changed(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_TEXT_CHANGED, move |control, _| listener(control));
    }

    pub fn on_dispose(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_DISPOSE, move |control, _| listener(control));
    }
}

/// A top-level control. Derefs to its `Control`.
#[derive(Clone, Debug)]
pub struct Window {
    control: Control,
    parts: Rc<WindowParts>,
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.control == other.control
    }
}

impl std::ops::Deref for Window {
    type Target = Control;

    fn deref(&self) -> &Control {
        &self.control
    }
}

impl Window {
    /*
     * Creates the native top-level window and adds it to the application's
     * open-window list. The window starts hidden in the `Created` state; raw
     * mouse input is registered right away so the raw mode toggle works later.
     */
    pub fn create(config: &WindowConfig) -> PlatformResult<Window> {
        let parts = Rc::new(WindowParts {
            keyboard: RefCell::new(Keyboard::new(config.keyboard_autorepeat)),
            mouse: RefCell::new(Mouse::new()),
            input_mode: Cell::new(InputMode::Cursor),
            lifecycle: Cell::new(WindowLifecycle::Created),
            raw_toggle_key: config.raw_toggle_key,
        });
        let control_config = ControlConfig {
            text: config.title.clone(),
            location: Point::default(),
            size: Size::new(config.width, config.height),
        };
        let control = Control::construct(
            ControlKind::Window,
            None,
            &control_config,
            Some(Rc::clone(&parts)),
        )?;
        let window = Window { control, parts };

        if let Err(err) = window.backend().register_raw_mouse(window.native_handle()) {
            log::warn!(
                "Window: raw mouse registration failed for window {}: {err}",
                window.id().raw()
            );
        }
        runtime::add_window(window.clone());
        if config.start_in_raw_mode {
            window.set_input_mode(InputMode::Raw);
        }
        log::debug!(
            "Window: created window {} '{}' ({}x{})",
            window.id().raw(),
            config.title,
            config.width,
            config.height
        );
        Ok(window)
    }

    pub fn from_control(control: &Control) -> Option<Window> {
        control.inner.window.as_ref().map(|parts| Window {
            control: control.clone(),
            parts: Rc::clone(parts),
        })
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn lifecycle(&self) -> WindowLifecycle {
        self.parts.lifecycle.get()
    }

    pub(crate) fn set_lifecycle(&self, lifecycle: WindowLifecycle) {
        let previous = self.parts.lifecycle.replace(lifecycle);
        if previous != lifecycle {
            log::debug!(
                "Window: window {} {previous:?} -> {lifecycle:?}",
                self.id().raw()
            );
        }
    }

    pub fn title(&self) -> String {
        self.text()
    }

    pub fn set_title(&self, title: &str) -> PlatformResult<()> {
        self.set_text(title)
    }

    pub fn raw_toggle_key(&self) -> Option<VirtualKey> {
        self.parts.raw_toggle_key
    }

    pub fn input_mode(&self) -> InputMode {
        self.parts.input_mode.get()
    }

    pub fn is_cursor_enabled(&self) -> bool {
        self.input_mode() == InputMode::Cursor
    }

    pub fn is_raw_input_enabled(&self) -> bool {
        self.parts.mouse.borrow().is_raw_enabled()
    }

    pub fn enable_cursor(&self) {
        self.set_input_mode(InputMode::Cursor);
    }

    pub fn disable_cursor(&self) {
        self.set_input_mode(InputMode::Raw);
    }

    pub fn toggle_input_mode(&self) {
        let next = match self.input_mode() {
            InputMode::Cursor => InputMode::Raw,
            InputMode::Raw => InputMode::Cursor,
        };
        self.set_input_mode(next);
    }

    /*
     * The only place the cursor flag and the mouse raw flag change, always
     * together. The native cursor follows while the window is active; an
     * inactive window gets its cursor state applied on the next activation.
     */
    pub fn set_input_mode(&self, mode: InputMode) {
        if self.parts.input_mode.replace(mode) == mode {
            return;
        }
        self.parts
            .mouse
            .borrow_mut()
            .set_raw_enabled(mode == InputMode::Raw);
        log::debug!("Window: window {} input mode {mode:?}", self.id().raw());
        if self.lifecycle() == WindowLifecycle::Active {
            self.apply_native_cursor(mode);
        }
    }

    pub(crate) fn apply_native_cursor(&self, mode: InputMode) {
        let backend = self.backend();
        match mode {
            InputMode::Raw => {
                backend.set_cursor_visible(false);
                backend.confine_cursor(Some(self.native_handle()));
            }
            InputMode::Cursor => {
                backend.confine_cursor(None);
                backend.set_cursor_visible(true);
            }
        }
    }

    pub(crate) fn keyboard(&self) -> &RefCell<Keyboard> {
        &self.parts.keyboard
    }

    pub(crate) fn mouse(&self) -> &RefCell<Mouse> {
        &self.parts.mouse
    }

    pub fn is_key_pressed(&self, key: VirtualKey) -> bool {
        self.parts.keyboard.borrow().is_key_pressed(key)
    }

    pub fn read_key(&self) -> Option<KeyboardEvent> {
        self.parts.keyboard.borrow_mut().read_key()
    }

    pub fn read_char(&self) -> Option<char> {
        self.parts.keyboard.borrow_mut().read_char()
    }

    pub fn read_mouse(&self) -> Option<MouseEvent> {
        self.parts.mouse.borrow_mut().read()
    }

    pub fn mouse_position(&self) -> Point {
        self.parts.mouse.borrow().position()
    }

    /// Drains queued key events lazily; stops at the first empty read.
    pub fn key_events(&self) -> impl Iterator<Item = KeyboardEvent> + '_ {
        std::iter::from_fn(move || self.read_key())
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        std::iter::from_fn(move || self.read_char())
    }

    pub fn mouse_events(&self) -> impl Iterator<Item = MouseEvent> + '_ {
        std::iter::from_fn(move || self.read_mouse())
    }

    pub fn raw_deltas(&self) -> impl Iterator<Item = RawDelta> + '_ {
        std::iter::from_fn(move || self.parts.mouse.borrow_mut().read_raw_delta())
    }

    /// Requests a close; listeners of `OnClosing` may cancel it.
    pub fn close(&self) {
        if self.lifecycle().is_closing_or_later() {
            return;
        }
        let handle = self.native_handle();
        if !handle.is_null() && !self.is_disposed() {
            self.backend().send_message(handle, Message::Close);
        }
    }

    /// Controls that take part in Tab navigation, in tree pre-order.
    pub(crate) fn tab_stops(&self) -> Vec<Control> {
        self.descendants()
            .into_iter()
            .filter(|c| c.kind().is_tab_stop() && c.is_enabled() && !c.is_disposed())
            .collect()
    }

    pub fn on_closing(&self, listener: impl Fn(&Control, &mut ClosingEventArgs) + 'static) {
        self.register_event(names::ON_CLOSING, move |control, args| {
            if let EventArgs::Closing(closing) = args {
                listener(control, closing);
            }
        });
    }

    pub fn on_closed(&self, listener: impl Fn(&Control, &ClosedEventArgs) + 'static) {
        self.register_event(names::ON_CLOSED, move |control, args| {
            if let EventArgs::Closed(closed) = args {
                listener(control, closed);
            }
        });
    }

    pub fn on_activated(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_ACTIVATED, move |control, _| listener(control));
    }

    pub fn on_deactivate(&self, listener: impl Fn(&Control) + 'static) {
        self.register_event(names::ON_DEACTIVATE, move |control, _| listener(control));
    }

    pub fn on_command(&self, listener: impl Fn(&Control, &CommandEventArgs) + 'static) {
        self.register_event(names::ON_COMMAND, move |control, args| {
            if let EventArgs::Command(command) = args {
                listener(control, command);
            }
        });
    }
}

/*
 * Handle Registry: maps a native handle to the control that owns it.
 *
 * `HandleRegistry<T>` is the plain map, holding weak references so the registry
 * never keeps a control alive. The process-wide instance lives in a thread-local
 * and has an explicit lifecycle: `initialize` before the first control is built,
 * `shutdown` after the last one is gone (both driven by `runtime`).
 *
 * Precondition: only the message-handling thread touches the process instance.
 * Every accessor borrows the cell for the duration of a single map operation and
 * never while calling out, so handlers that re-enter the router are safe.
 */
use crate::control::{Control, ControlInner};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::{ControlId, NativeHandle};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Identity used in duplicate-handle diagnostics.
pub(crate) trait RegistryEntry {
    fn entry_id(&self) -> ControlId;
}

#[derive(Debug)]
pub(crate) struct HandleRegistry<T> {
    entries: HashMap<NativeHandle, Weak<T>>,
}

impl<T: RegistryEntry> HandleRegistry<T> {
    pub(crate) fn new() -> Self {
        HandleRegistry {
            entries: HashMap::new(),
        }
    }

    /// Associates `handle` with `target`. Re-registering the same target is a
    /// no-op; an entry whose target is gone is replaced.
    pub(crate) fn register(&mut self, handle: NativeHandle, target: &Rc<T>) -> PlatformResult<()> {
        if handle.is_null() {
            return Err(PlatformError::InvalidHandle(
                "cannot register the null handle".to_string(),
            ));
        }
        if let Some(existing) = self.entries.get(&handle).and_then(Weak::upgrade) {
            if Rc::ptr_eq(&existing, target) {
                return Ok(());
            }
            return Err(PlatformError::DuplicateHandle {
                handle,
                existing: existing.entry_id(),
            });
        }
        self.entries.insert(handle, Rc::downgrade(target));
        Ok(())
    }

    pub(crate) fn resolve(&self, handle: NativeHandle) -> Option<Rc<T>> {
        self.entries.get(&handle).and_then(Weak::upgrade)
    }

    /// Returns whether a live or dead entry was removed.
    pub(crate) fn unregister(&mut self, handle: NativeHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn drain(&mut self) -> Vec<Weak<T>> {
        self.entries.drain().map(|(_, target)| target).collect()
    }
}

impl RegistryEntry for ControlInner {
    fn entry_id(&self) -> ControlId {
        self.id()
    }
}

thread_local! {
    static HANDLE_REGISTRY: RefCell<Option<HandleRegistry<ControlInner>>> =
        const { RefCell::new(None) };
}

pub(crate) fn initialize() {
    HANDLE_REGISTRY.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(HandleRegistry::new());
            log::debug!("Registry: handle registry initialized.");
        }
    });
}

pub(crate) fn shutdown() {
    let leftovers = HANDLE_REGISTRY.with(|cell| {
        cell.borrow_mut()
            .take()
            .map(|mut registry| registry.drain())
            .unwrap_or_default()
    });
    if !leftovers.is_empty() {
        log::warn!(
            "Registry: shut down with {} handle(s) still registered.",
            leftovers.len()
        );
    }
    log::debug!("Registry: handle registry torn down.");
}

pub(crate) fn is_initialized() -> bool {
    HANDLE_REGISTRY.with(|cell| cell.borrow().is_some())
}

pub(crate) fn register(handle: NativeHandle, control: &Control) -> PlatformResult<()> {
    HANDLE_REGISTRY.with(|cell| match cell.borrow_mut().as_mut() {
        Some(registry) => registry.register(handle, control.inner()),
        None => Err(PlatformError::RuntimeNotInstalled),
    })?;
    log::trace!(
        "Registry: handle {handle:?} -> control {}",
        control.id().raw()
    );
    Ok(())
}

/// Looks up the control owning `handle`. A miss is not an error.
pub fn resolve(handle: NativeHandle) -> Option<Control> {
    HANDLE_REGISTRY
        .with(|cell| cell.borrow().as_ref().and_then(|r| r.resolve(handle)))
        .map(Control::from_inner)
}

pub(crate) fn unregister(handle: NativeHandle) -> bool {
    let removed = HANDLE_REGISTRY.with(|cell| {
        cell.borrow_mut()
            .as_mut()
            .is_some_and(|registry| registry.unregister(handle))
    });
    if removed {
        log::trace!("Registry: handle {handle:?} unregistered.");
    }
    removed
}

pub fn registered_count() -> usize {
    HANDLE_REGISTRY.with(|cell| cell.borrow().as_ref().map_or(0, HandleRegistry::len))
}

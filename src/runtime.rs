/*
 * Per-thread runtime: the installed native backend, the handle registry
 * lifecycle and the list of open top-level windows. One `Application` owns the
 * runtime of its thread; it is installed in `Application::new` and torn down when
 * the application is dropped.
 *
 * Accessors copy out what they need (`Rc` clones, snapshots) and release the
 * cell before returning, so callers are free to re-enter.
 */
use crate::control::Window;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::NativeBackend;
use crate::registry;
use crate::types::ControlId;

use std::cell::RefCell;
use std::rc::Rc;

struct Runtime {
    backend: Rc<dyn NativeBackend>,
    windows: Vec<Window>,
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
}

pub(crate) fn install(backend: Rc<dyn NativeBackend>) -> PlatformResult<()> {
    RUNTIME.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_some() {
            return Err(PlatformError::InitializationFailed(
                "a runtime is already installed on this thread".to_string(),
            ));
        }
        *slot = Some(Runtime {
            backend,
            windows: Vec::new(),
        });
        Ok(())
    })?;
    registry::initialize();
    log::debug!("Runtime: installed.");
    Ok(())
}

pub(crate) fn teardown() {
    let runtime = RUNTIME.with(|cell| cell.borrow_mut().take());
    registry::shutdown();
    // Windows and the backend are dropped outside the borrow.
    drop(runtime);
    log::debug!("Runtime: torn down.");
}

pub(crate) fn is_installed() -> bool {
    RUNTIME.with(|cell| cell.borrow().is_some())
}

pub(crate) fn backend() -> PlatformResult<Rc<dyn NativeBackend>> {
    RUNTIME.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|runtime| Rc::clone(&runtime.backend))
            .ok_or(PlatformError::RuntimeNotInstalled)
    })
}

pub(crate) fn add_window(window: Window) {
    RUNTIME.with(|cell| {
        if let Some(runtime) = cell.borrow_mut().as_mut() {
            runtime.windows.push(window);
        }
    });
}

/// Removes the window from the open list. Returns `false` if it was not listed.
pub(crate) fn remove_window(id: ControlId) -> bool {
    let removed = RUNTIME.with(|cell| {
        let mut slot = cell.borrow_mut();
        let runtime = slot.as_mut()?;
        let index = runtime.windows.iter().position(|w| w.id() == id)?;
        Some(runtime.windows.remove(index))
    });
    // Dropped after the borrow ends.
    removed.is_some()
}

pub(crate) fn windows_snapshot() -> Vec<Window> {
    RUNTIME.with(|cell| {
        cell.borrow()
            .as_ref()
            .map(|runtime| runtime.windows.clone())
            .unwrap_or_default()
    })
}

pub(crate) fn window_count() -> usize {
    RUNTIME.with(|cell| cell.borrow().as_ref().map_or(0, |r| r.windows.len()))
}

/*
 * Application entry points. `Application` installs the per-thread runtime
 * (backend, handle registry, open-window list) and tears it down again when
 * dropped. It offers three ways to drive the message loop:
 *
 * - `process_messages` drains pending messages without blocking,
 * - `run` loops until a quit request arrives,
 * - `run_frames` is the real-time loop: drain, measure the frame delta, honor
 *   the window's raw-mode toggle key, call the user update, idle briefly.
 *
 * `run_guarded` is the outermost error boundary for a whole program.
 */
use crate::control::Window;
use crate::error::Result as PlatformResult;
use crate::input::KeyboardEvent;
use crate::native::NativeBackend;
use crate::runtime;
use crate::types::WindowConfig;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Tuning of the real-time frame loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLoopConfig {
    /// Sleep between frames so the loop does not spin a core.
    pub idle_delay: Duration,
    /// Multiplier applied to the measured frame delta.
    pub speed_factor: f32,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        FrameLoopConfig {
            idle_delay: Duration::from_millis(1),
            speed_factor: 1.0,
        }
    }
}

/// What the frame loop hands to the user update each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    /// Time since the previous frame, scaled by the speed factor.
    pub delta: Duration,
    /// Key events drained this frame, including the raw-mode toggle key.
    pub key_events: Vec<KeyboardEvent>,
}

pub struct Application {
    backend: Rc<dyn NativeBackend>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("windows", &runtime::window_count())
            .finish()
    }
}

impl Application {
    /// Installs `backend` as this thread's runtime. Fails if one is already installed.
    pub fn new(backend: Rc<dyn NativeBackend>) -> PlatformResult<Self> {
        runtime::install(Rc::clone(&backend))?;
        log::debug!("Application: started.");
        Ok(Application { backend })
    }

    /// Application on the Win32 backend.
    #[cfg(target_os = "windows")]
    pub fn native() -> PlatformResult<Self> {
        let backend = crate::win32_backend::Win32Backend::new()?;
        Self::new(Rc::new(backend))
    }

    pub fn backend(&self) -> Rc<dyn NativeBackend> {
        Rc::clone(&self.backend)
    }

    pub fn create_window(&self, config: &WindowConfig) -> PlatformResult<Window> {
        Window::create(config)
    }

    /// Open windows, oldest first.
    pub fn windows(&self) -> Vec<Window> {
        runtime::windows_snapshot()
    }

    pub fn window_count(&self) -> usize {
        runtime::window_count()
    }

    /// Dispatches every pending message. Returns the exit code once quit was requested.
    pub fn process_messages(&self) -> Option<i32> {
        self.backend.pump_messages()
    }

    pub fn run(&self) -> i32 {
        loop {
            if let Some(exit_code) = self.process_messages() {
                log::debug!("Application: message loop finished with {exit_code}.");
                return exit_code;
            }
            std::thread::sleep(FrameLoopConfig::default().idle_delay);
        }
    }

    /*
     * Real-time loop over `window`. Each frame drains the native queue, takes
     * the window's pending key events (a release of the window's toggle key
     * switches the input mode), then calls `update`. Ends with the exit code
     * of the quit request.
     */
    pub fn run_frames<F>(&self, window: &Window, config: &FrameLoopConfig, mut update: F) -> i32
    where
        F: FnMut(&Window, &Frame),
    {
        let mut last = Instant::now();
        let mut index = 0;
        loop {
            if let Some(exit_code) = self.process_messages() {
                log::debug!("Application: frame loop finished after {index} frame(s).");
                return exit_code;
            }
            let now = Instant::now();
            let delta = now.duration_since(last).mul_f32(config.speed_factor.max(0.0));
            last = now;

            let key_events: Vec<KeyboardEvent> = window.key_events().collect();
            handle_toggle_key(window, &key_events);
            let frame = Frame {
                index,
                delta,
                key_events,
            };
            update(window, &frame);
            index += 1;

            if !config.idle_delay.is_zero() {
                std::thread::sleep(config.idle_delay);
            }
        }
    }

    /// Destroys every open window. Iterates a snapshot; the list shrinks as windows go.
    pub fn exit(&self) {
        let windows = runtime::windows_snapshot();
        if !windows.is_empty() {
            log::debug!("Application: exiting with {} window(s) open.", windows.len());
        }
        for window in windows {
            // Destroys natively; falls back to a managed-only release.
            window.dispose();
        }
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.exit();
        runtime::teardown();
        log::debug!("Application: stopped.");
    }
}

fn handle_toggle_key(window: &Window, key_events: &[KeyboardEvent]) {
    let Some(toggle) = window.raw_toggle_key() else {
        return;
    };
    let releases = key_events
        .iter()
        .filter(|event| event.is_release() && event.key == toggle)
        .count();
    for _ in 0..releases {
        window.toggle_input_mode();
    }
}

/*
 * Runs `body` inside the program's error boundary. An `Err` or a panic is
 * logged and reported in a blocking message box; the program then exits with
 * -1.
 */
pub fn run_guarded<F>(backend: &dyn NativeBackend, body: F) -> i32
where
    F: FnOnce() -> PlatformResult<i32>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(exit_code)) => exit_code,
        Ok(Err(err)) => {
            log::error!("Application: terminated with error: {err}");
            backend.show_message_box("Platform Error", &err.to_string());
            -1
        }
        Err(payload) => {
            let text = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "No details available".to_string());
            log::error!("Application: panicked: {text}");
            backend.show_message_box("Unknown Exception", &text);
            -1
        }
    }
}

/*
 * Small interactive demo: a window with two buttons and a label. Clicking a
 * button updates the label; Escape toggles raw mouse mode; closing the window
 * asks once before it goes.
 */
#[cfg(target_os = "windows")]
fn main() {
    use std::cell::Cell;
    use std::rc::Rc;
    use windows_wrapper::{
        Application, Control, ControlConfig, FrameLoopConfig, NativeBackend, Win32Backend,
        WindowConfig, run_guarded,
    };

    let backend: Rc<dyn NativeBackend> = match Win32Backend::new() {
        Ok(backend) => Rc::new(backend),
        Err(err) => {
            log::error!("demo: backend initialization failed: {err}");
            std::process::exit(-1);
        }
    };

    let exit_code = run_guarded(backend.as_ref(), || {
        let app = Application::new(Rc::clone(&backend))?;
        let window = app.create_window(&WindowConfig {
            title: "windows-wrapper demo".to_string(),
            ..WindowConfig::default()
        })?;

        let label = Control::create_label(
            &window,
            &ControlConfig::new("Click a button", 240, 24, 20, 80),
        )?;
        let first =
            Control::create_button(&window, &ControlConfig::new("First", 100, 30, 20, 20))?;
        let second =
            Control::create_button(&window, &ControlConfig::new("Second", 100, 30, 140, 20))?;

        for button in [&first, &second] {
            let label = label.clone();
            button.on_click(move |sender| {
                if let Err(err) = label.set_text(&format!("{} clicked", sender.text())) {
                    log::warn!("demo: label update failed: {err}");
                }
            });
        }

        let asked = Rc::new(Cell::new(false));
        window.on_closing(move |_, args| {
            // The first close only warns; the second one goes through.
            args.cancel = !asked.replace(true);
        });

        for control in [&label, &first, &second] {
            control.show();
        }
        window.show();

        Ok(app.run_frames(&window, &FrameLoopConfig::default(), |window, frame| {
            for delta in window.raw_deltas() {
                log::trace!("demo: frame {} raw delta {delta:?}", frame.index);
            }
        }))
    });
    std::process::exit(exit_code);
}

#[cfg(not(target_os = "windows"))]
fn main() {
    eprintln!("The demo needs the Win32 backend and only runs on Windows.");
}

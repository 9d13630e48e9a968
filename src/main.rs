//! vsdl-viewer - animated test pattern on an SDL2 window
//!
//! Esc or closing the window quits, Alt+Return toggles fullscreen.
//! Settings are read from `<config dir>/vsdl/viewer.json`.

mod frame;

use frame::Pattern;
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use vsdl::{Config, Event, Keycode, Modifiers, Session, Settings};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vsdl").join("viewer.json"))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let settings = match settings_path() {
        Some(path) => {
            info!("Reading settings from {}", path.display());
            Settings::load(&path)
        }
        None => Settings::default(),
    };

    let session = Session::initialize(Config::from_settings(&settings))?;
    info!(
        "SDL {} window {} (back-buffer {})",
        session.version(),
        session.window_size(),
        session.back_buffer_size()
    );

    let result = run(&session);
    if let Err(e) = &result {
        error!("Viewer stopped: {}", e);
    }
    session.shutdown()?;
    result
}

fn run(session: &Session) -> Result<(), Box<dyn Error>> {
    let mut pattern = Pattern::new(session.back_buffer_size());

    loop {
        let started = Instant::now();

        for event in session.events() {
            match &event {
                Event::Quit(_) => return Ok(()),
                Event::KeyDown(key) => {
                    let keysym = key.keysym();
                    if keysym.is_key(Keycode::ESCAPE) {
                        return Ok(());
                    }
                    if keysym.is_key(Keycode::RETURN) && keysym.is_mod(Modifiers::ALT) {
                        let fullscreen = session.toggle_fullscreen()?;
                        info!("Fullscreen: {}", fullscreen);
                    } else if !key.is_repeat() {
                        info!("{}: {:X}", keysym, keysym.sym.0);
                    }
                }
                Event::MouseMotion(motion) => pattern.set_cursor(motion.x(), motion.y()),
                _ => {}
            }
            event.release();
        }

        session.present_rgba(pattern.paint())?;

        if let Some(rest) = FRAME_INTERVAL.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
}

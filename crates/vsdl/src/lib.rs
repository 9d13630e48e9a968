//! vsdl - SDL2 window, renderer and event access from any thread.
//!
//! SDL only works from the thread that initialized it. A [`Session`] owns a
//! dedicated thread for that and exposes:
//! - [`Session::events`] - drain pending input as typed, pooled views
//! - [`Session::present`] - upload an RGBA frame and flip it to the window
//! - [`Session::shutdown`] - ordered teardown on the owning thread
//!
//! ```no_run
//! use vsdl::{Config, Event, Session};
//!
//! let session = Session::initialize(Config::new().with_window_size((640, 480)))?;
//! let frame = image::RgbaImage::new(640, 480);
//! 'frames: loop {
//!     for event in session.events() {
//!         if let Event::Quit(_) = event {
//!             break 'frames;
//!         }
//!         event.release();
//!     }
//!     session.present_rgba(&frame)?;
//! }
//! session.shutdown()?;
//! # Ok::<(), vsdl::VsdlError>(())
//! ```

mod affine;
pub mod config;
mod diagnostics;
pub mod error;
pub mod events;
pub mod keys;
pub mod native;
pub mod session;

pub use config::{Config, LogSink, Settings};
pub use error::{ValidationError, VsdlError};
pub use events::{
    Event, EventPool, EventStream, EventView, KeyboardEvent, MouseButtonEvent,
    MouseMotionEvent, MouseWheelEvent, QuitEvent, WindowEvent, WindowEventId,
};
pub use keys::{Keycode, Keysym, Modifiers};
pub use native::{EmbeddedLibrary, LibrarySource, NativeAdapter, Size, Version};
pub use session::Session;

pub type Result<T> = std::result::Result<T, VsdlError>;

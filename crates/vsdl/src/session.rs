//! Public session: a window, its renderer and back-buffer, driven from any thread.

use crate::affine::AffineContext;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::{ValidationError, VsdlError};
use crate::events::{EventDecoder, EventPool, EventStream};
use crate::native::{self, NativeAdapter, Size, Version};
use image::{DynamicImage, GenericImageView, RgbaImage};
use std::fmt;
use vsdl_affine::{AffineExecutor, Builder};

/// Name of the thread that owns the native context.
pub const NATIVE_THREAD: &str = "vsdl-affine";

const BYTES_PER_PIXEL: usize = 4;

/// An initialized native context with one window.
///
/// All native work runs on a dedicated thread in submission order; the
/// session itself is `Send + Sync` and can be shared behind an `Arc`.
/// Dropping it shuts it down.
pub struct Session {
    executor: AffineExecutor<AffineContext, VsdlError>,
    window_size: Size,
    back_buffer: Size,
    version: Version,
    pool: EventPool,
    diag: Diagnostics,
}

impl Session {
    /// Load the native library named by `config` and open a window.
    pub fn initialize(config: Config) -> Result<Session, VsdlError> {
        config.validate()?;
        let native = native::load(config.library())?;
        Self::with_adapter(config, Box::new(native))
    }

    /// Open a window through an already loaded adapter.
    ///
    /// Each setup step is its own blocking command. On failure whatever was
    /// created is torn down before the error is returned.
    pub fn with_adapter(
        config: Config,
        native: Box<dyn NativeAdapter>,
    ) -> Result<Session, VsdlError> {
        config.validate()?;

        let diag = Diagnostics::new(config.logger().cloned());
        let pool = EventPool::new();
        let decoder = EventDecoder::new(pool.clone());

        let hook = diag.clone();
        let worker_diag = diag.clone();
        let executor = Builder::new(NATIVE_THREAD)
            .on_report(move |severity, message| hook.report(severity, message))
            .spawn(move || AffineContext::new(native, decoder, worker_diag))?;

        let mut session = Session {
            executor,
            window_size: config.window_size(),
            back_buffer: config.back_buffer_size(),
            version: Version::default(),
            pool,
            diag,
        };

        session.version = session.executor.submit(AffineContext::init_video)?;

        let window_size = session.window_size;
        session
            .executor
            .submit(move |ctx| ctx.create_window_and_renderer(window_size))?;

        if let Some(logical) = config.logical_size() {
            session
                .executor
                .submit(move |ctx| ctx.set_logical_size(logical))?;
        }

        let back_buffer = session.back_buffer;
        session
            .executor
            .submit(move |ctx| ctx.create_back_buffer(back_buffer))?;

        session.diag.info(&format!(
            "SDL {} ready: window {}, back-buffer {}",
            session.version, session.window_size, session.back_buffer
        ));
        Ok(session)
    }

    /// Drain pending native events.
    ///
    /// Polling runs as a fire-and-forget command; the stream ends once the
    /// native queue is empty. Call once per frame.
    pub fn events(&self) -> EventStream {
        let (tx, rx) = crossbeam_channel::unbounded();
        let queued = self.executor.submit_async(move |ctx| {
            ctx.drain_events(&tx);
            Ok(())
        });
        if let Err(e) = queued {
            self.diag.debug(&format!("event poll not queued: {}", e));
        }
        EventStream::new(rx)
    }

    /// Upload `image` to the back-buffer and present it.
    ///
    /// The image must match [`back_buffer_size`](Self::back_buffer_size) and
    /// be RGBA8; both are checked before anything is sent to the native thread.
    pub fn present(&self, image: &DynamicImage) -> Result<(), VsdlError> {
        self.check_size(Size::new(image.width(), image.height()))?;
        match image {
            DynamicImage::ImageRgba8(rgba) => self.present_rgba(rgba),
            other => Err(ValidationError::PixelFormat(format!("{:?}", other.color())).into()),
        }
    }

    pub fn present_rgba(&self, image: &RgbaImage) -> Result<(), VsdlError> {
        self.check_size(Size::new(image.width(), image.height()))?;

        let pitch = image.width() as usize * BYTES_PER_PIXEL;
        let pixels = image.as_raw().clone();
        self.executor
            .submit(move |ctx| ctx.present(&pixels, pitch))
            .map_err(VsdlError::from)
    }

    fn check_size(&self, actual: Size) -> Result<(), ValidationError> {
        if actual != self.back_buffer {
            return Err(ValidationError::SizeMismatch {
                expected: self.back_buffer,
                actual,
            });
        }
        Ok(())
    }

    /// Switch between windowed and fullscreen. Returns true if now fullscreen.
    pub fn toggle_fullscreen(&self) -> Result<bool, VsdlError> {
        self.executor
            .submit(AffineContext::toggle_fullscreen)
            .map_err(VsdlError::from)
    }

    /// Size presented images must have: the logical size if set, else the window size.
    pub fn back_buffer_size(&self) -> Size {
        self.back_buffer
    }

    pub fn window_size(&self) -> Size {
        self.window_size
    }

    /// Version of the loaded native library.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Event buffers shared with the native thread.
    pub fn pool(&self) -> &EventPool {
        &self.pool
    }

    pub fn is_running(&self) -> bool {
        self.executor.is_running()
    }

    /// Run everything already submitted, then tear down on the native thread.
    pub fn shutdown(&self) -> Result<(), VsdlError> {
        self.executor.shutdown().map_err(VsdlError::from)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("executor", &self.executor)
            .field("window_size", &self.window_size)
            .field("back_buffer", &self.back_buffer)
            .field("version", &self.version)
            .finish()
    }
}

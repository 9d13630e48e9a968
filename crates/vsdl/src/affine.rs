//! State owned by the session's native thread.
//!
//! Every method here runs on that thread, inside a command submitted by the
//! session. Handles are created in order (context, window and renderer,
//! texture) and released in reverse when the context is dropped.

use crate::diagnostics::Diagnostics;
use crate::error::VsdlError;
use crate::events::{Event, EventDecoder};
use crate::native::{
    INIT_VIDEO, NativeAdapter, PIXELFORMAT_ABGR8888, RendererHandle, Size, Status,
    TEXTUREACCESS_STREAMING, TextureHandle, Version, WINDOW_FULLSCREEN,
    WINDOW_FULLSCREEN_DESKTOP, WindowHandle,
};
use crossbeam_channel::Sender;

pub(crate) struct AffineContext {
    native: Box<dyn NativeAdapter>,
    decoder: EventDecoder,
    diag: Diagnostics,
    initialized: bool,
    window: Option<WindowHandle>,
    renderer: Option<RendererHandle>,
    texture: Option<TextureHandle>,
}

impl AffineContext {
    pub(crate) fn new(
        native: Box<dyn NativeAdapter>,
        decoder: EventDecoder,
        diag: Diagnostics,
    ) -> Self {
        Self {
            native,
            decoder,
            diag,
            initialized: false,
            window: None,
            renderer: None,
            texture: None,
        }
    }

    /// Failure of `call`, described by the library's error text.
    fn native_error(&mut self, call: &'static str) -> VsdlError {
        let message = self
            .native
            .last_error()
            .unwrap_or_else(|| "unknown error".to_string());
        VsdlError::Native { call, message }
    }

    fn check(&mut self, call: &'static str, status: Status) -> Result<(), VsdlError> {
        if status != 0 {
            return Err(self.native_error(call));
        }
        Ok(())
    }

    fn window(&self, call: &'static str) -> Result<WindowHandle, VsdlError> {
        self.window.ok_or_else(|| missing(call, "window"))
    }

    fn renderer(&self, call: &'static str) -> Result<RendererHandle, VsdlError> {
        self.renderer.ok_or_else(|| missing(call, "renderer"))
    }

    fn texture(&self, call: &'static str) -> Result<TextureHandle, VsdlError> {
        self.texture.ok_or_else(|| missing(call, "texture"))
    }

    pub(crate) fn init_video(&mut self) -> Result<Version, VsdlError> {
        let status = self.native.init(INIT_VIDEO);
        self.check("SDL_Init", status)?;
        self.initialized = true;
        Ok(self.native.version())
    }

    pub(crate) fn create_window_and_renderer(&mut self, size: Size) -> Result<(), VsdlError> {
        let Some((window, renderer)) = self.native.create_window_and_renderer(size) else {
            return Err(self.native_error("SDL_CreateWindowAndRenderer"));
        };
        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    pub(crate) fn set_logical_size(&mut self, size: Size) -> Result<(), VsdlError> {
        let renderer = self.renderer("SDL_RenderSetLogicalSize")?;
        let status = self.native.set_logical_size(renderer, size);
        self.check("SDL_RenderSetLogicalSize", status)
    }

    /// Streaming RGBA texture that frames are uploaded into.
    pub(crate) fn create_back_buffer(&mut self, size: Size) -> Result<(), VsdlError> {
        let renderer = self.renderer("SDL_CreateTexture")?;
        let texture = self.native.create_texture(
            renderer,
            PIXELFORMAT_ABGR8888,
            TEXTUREACCESS_STREAMING,
            size,
        );
        match texture {
            Some(texture) => {
                self.texture = Some(texture);
                Ok(())
            }
            None => Err(self.native_error("SDL_CreateTexture")),
        }
    }

    /// Upload, copy to the render target, flip.
    pub(crate) fn present(&mut self, pixels: &[u8], pitch: usize) -> Result<(), VsdlError> {
        let texture = self.texture("SDL_UpdateTexture")?;
        let renderer = self.renderer("SDL_RenderCopy")?;

        let status = self.native.update_texture(texture, pixels, pitch);
        self.check("SDL_UpdateTexture", status)?;

        let status = self.native.render_copy(renderer, texture);
        self.check("SDL_RenderCopy", status)?;

        self.native.render_present(renderer);
        Ok(())
    }

    /// Switch between windowed and desktop fullscreen. Returns the new state.
    pub(crate) fn toggle_fullscreen(&mut self) -> Result<bool, VsdlError> {
        let window = self.window("SDL_SetWindowFullscreen")?;
        let fullscreen = self.native.window_flags(window) & WINDOW_FULLSCREEN != 0;
        let flags = if fullscreen {
            0
        } else {
            WINDOW_FULLSCREEN_DESKTOP
        };
        let status = self.native.set_window_fullscreen(window, flags);
        self.check("SDL_SetWindowFullscreen", status)?;
        Ok(!fullscreen)
    }

    /// Poll until the native queue is empty, forwarding each event.
    ///
    /// Stops early if the consumer has gone away; the undelivered event
    /// goes back to the pool with the failed send.
    pub(crate) fn drain_events(&mut self, sink: &Sender<Event>) {
        let mut forwarded = 0usize;
        while let Some(event) = self.decoder.poll_next(&mut *self.native) {
            if sink.send(event).is_err() {
                break;
            }
            forwarded += 1;
        }
        if forwarded > 0 {
            log::trace!("drained {} events", forwarded);
        }
    }

    fn teardown_step(&mut self, call: &str, step: impl FnOnce(&mut dyn NativeAdapter)) {
        self.native.clear_error();
        step(&mut *self.native);
        if let Some(message) = self.native.last_error() {
            self.diag
                .warn(&format!("could not {} during teardown: {}", call, message));
        }
    }
}

fn missing(call: &'static str, what: &str) -> VsdlError {
    VsdlError::Native {
        call,
        message: format!("no {} has been created", what),
    }
}

impl Drop for AffineContext {
    fn drop(&mut self) {
        if let Some(texture) = self.texture.take() {
            self.teardown_step("destroy texture", |native| native.destroy_texture(texture));
        }
        if let Some(renderer) = self.renderer.take() {
            self.teardown_step("destroy renderer", |native| {
                native.destroy_renderer(renderer)
            });
        }
        if let Some(window) = self.window.take() {
            self.teardown_step("destroy window", |native| native.destroy_window(window));
        }
        if self.initialized {
            self.initialized = false;
            self.teardown_step("quit", |native| native.quit());
        }
        self.diag.debug("native context released");
    }
}

//! Native adapter boundary.
//!
//! [`NativeAdapter`] is the set of SDL calls the session makes. Every method is
//! invoked from the session's affine thread only, which is why the handle
//! types are `!Send`: they never leave that thread.

mod loader;
#[cfg(test)]
pub(crate) mod mock;
mod sdl2;

pub use loader::{DEFAULT_LIBRARY_NAMES, EmbeddedLibrary, LibrarySource, load};
pub use sdl2::Sdl2;

use crate::events::EventSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Return code of a native call; zero means success.
pub type Status = i32;

pub const INIT_VIDEO: u32 = 0x0000_0020;

/// SDL_PIXELFORMAT_ABGR8888: R, G, B, A byte order on little-endian hosts.
pub const PIXELFORMAT_ABGR8888: u32 = 0x1676_2004;
pub const TEXTUREACCESS_STREAMING: i32 = 1;

pub const WINDOW_FULLSCREEN: u32 = 0x0000_0001;
pub const WINDOW_FULLSCREEN_DESKTOP: u32 = WINDOW_FULLSCREEN | 0x0000_1000;

/// Pixel dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Dimensions as C ints, clamped. Config validation keeps real sizes in range.
    pub fn to_c(self) -> (i32, i32) {
        (
            i32::try_from(self.width).unwrap_or(i32::MAX),
            i32::try_from(self.height).unwrap_or(i32::MAX),
        )
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Version of the loaded native library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

macro_rules! affine_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            raw: usize,
            _affine: PhantomData<*mut ()>,
        }

        impl $name {
            /// Wrap a native pointer value. Null is not a handle.
            pub fn from_raw(raw: usize) -> Option<Self> {
                (raw != 0).then_some(Self {
                    raw,
                    _affine: PhantomData,
                })
            }

            pub fn as_raw(self) -> usize {
                self.raw
            }
        }
    };
}

affine_handle!(
    /// SDL_Window owned by the affine thread.
    WindowHandle
);
affine_handle!(
    /// SDL_Renderer owned by the affine thread.
    RendererHandle
);
affine_handle!(
    /// SDL_Texture owned by the affine thread.
    TextureHandle
);

/// Native calls used by a session.
///
/// Methods mirror the C API: failures come back as a non-zero [`Status`] or
/// `None`, and the description is fetched separately with
/// [`last_error`](NativeAdapter::last_error).
pub trait NativeAdapter: EventSource + Send {
    fn init(&mut self, flags: u32) -> Status;
    fn quit(&mut self);

    /// Last error text, `None` when empty.
    fn last_error(&mut self) -> Option<String>;
    fn clear_error(&mut self);
    fn version(&mut self) -> Version;

    fn create_window_and_renderer(&mut self, size: Size)
    -> Option<(WindowHandle, RendererHandle)>;
    fn destroy_renderer(&mut self, renderer: RendererHandle);
    fn destroy_window(&mut self, window: WindowHandle);
    fn set_logical_size(&mut self, renderer: RendererHandle, size: Size) -> Status;

    fn window_flags(&mut self, window: WindowHandle) -> u32;
    fn set_window_fullscreen(&mut self, window: WindowHandle, flags: u32) -> Status;

    fn create_texture(
        &mut self,
        renderer: RendererHandle,
        format: u32,
        access: i32,
        size: Size,
    ) -> Option<TextureHandle>;
    fn destroy_texture(&mut self, texture: TextureHandle);
    fn update_texture(&mut self, texture: TextureHandle, pixels: &[u8], pitch: usize) -> Status;

    fn render_copy(&mut self, renderer: RendererHandle, texture: TextureHandle) -> Status;
    fn render_present(&mut self, renderer: RendererHandle);
}

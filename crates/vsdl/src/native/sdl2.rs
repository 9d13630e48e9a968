//! [`NativeAdapter`] over a dynamically loaded SDL2.

use super::{
    NativeAdapter, RendererHandle, Size, Status, TextureHandle, Version, WindowHandle,
};
use crate::error::VsdlError;
use crate::events::{EventSource, RawEvent};
use libloading::Library;
use log::debug;
use std::ffi::{CStr, c_char, c_int, c_void};
use std::fmt;
use std::path::Path;
use std::ptr;
use tempfile::TempDir;

#[repr(C)]
#[derive(Default)]
struct SdlVersion {
    major: u8,
    minor: u8,
    patch: u8,
}

type InitFn = unsafe extern "C" fn(flags: u32) -> c_int;
type QuitFn = unsafe extern "C" fn();
type GetErrorFn = unsafe extern "C" fn() -> *const c_char;
type ClearErrorFn = unsafe extern "C" fn();
type GetVersionFn = unsafe extern "C" fn(version: *mut SdlVersion);
type CreateWindowAndRendererFn = unsafe extern "C" fn(
    width: c_int,
    height: c_int,
    flags: u32,
    window: *mut *mut c_void,
    renderer: *mut *mut c_void,
) -> c_int;
type DestroyFn = unsafe extern "C" fn(object: *mut c_void);
type SetLogicalSizeFn =
    unsafe extern "C" fn(renderer: *mut c_void, width: c_int, height: c_int) -> c_int;
type GetWindowFlagsFn = unsafe extern "C" fn(window: *mut c_void) -> u32;
type SetWindowFullscreenFn = unsafe extern "C" fn(window: *mut c_void, flags: u32) -> c_int;
type CreateTextureFn = unsafe extern "C" fn(
    renderer: *mut c_void,
    format: u32,
    access: c_int,
    width: c_int,
    height: c_int,
) -> *mut c_void;
type UpdateTextureFn = unsafe extern "C" fn(
    texture: *mut c_void,
    rect: *const c_void,
    pixels: *const c_void,
    pitch: c_int,
) -> c_int;
type RenderCopyFn = unsafe extern "C" fn(
    renderer: *mut c_void,
    texture: *mut c_void,
    src: *const c_void,
    dst: *const c_void,
) -> c_int;
type RenderPresentFn = unsafe extern "C" fn(renderer: *mut c_void);
type PollEventFn = unsafe extern "C" fn(event: *mut u8) -> c_int;

struct Procs {
    init: InitFn,
    quit: QuitFn,
    get_error: GetErrorFn,
    clear_error: ClearErrorFn,
    get_version: GetVersionFn,
    create_window_and_renderer: CreateWindowAndRendererFn,
    destroy_renderer: DestroyFn,
    destroy_window: DestroyFn,
    render_set_logical_size: SetLogicalSizeFn,
    get_window_flags: GetWindowFlagsFn,
    set_window_fullscreen: SetWindowFullscreenFn,
    create_texture: CreateTextureFn,
    destroy_texture: DestroyFn,
    update_texture: UpdateTextureFn,
    render_copy: RenderCopyFn,
    render_present: RenderPresentFn,
    poll_event: PollEventFn,
}

/// A loaded SDL2 library.
///
/// Fields drop in order: the procs go first, then the library is unloaded,
/// then the extraction directory (if any) is removed.
pub struct Sdl2 {
    procs: Procs,
    library: Library,
    extracted: Option<TempDir>,
}

/// Resolve one symbol to a plain function pointer.
///
/// # Safety
/// `T` must be the exact C signature of `name`.
unsafe fn resolve<T: Copy>(library: &Library, name: &'static str) -> Result<T, VsdlError> {
    // SAFETY: the caller guarantees the signature; the pointer is only used
    // while `library` stays loaded, which `Sdl2` ensures by owning both.
    unsafe {
        library
            .get::<T>(name.as_bytes())
            .map(|symbol| *symbol)
            .map_err(|source| VsdlError::Symbol { name, source })
    }
}

impl Sdl2 {
    /// Load the library at `path`. `extracted` is removed after unloading.
    pub(crate) fn open(path: &Path, extracted: Option<TempDir>) -> Result<Self, VsdlError> {
        // SAFETY: loading SDL2 runs no initializers with preconditions.
        let library = unsafe { Library::new(path) }.map_err(|source| VsdlError::Load {
            path: path.display().to_string(),
            source,
        })?;

        // SAFETY: signatures match the SDL 2.0 headers.
        let procs = unsafe {
            Procs {
                init: resolve(&library, "SDL_Init")?,
                quit: resolve(&library, "SDL_Quit")?,
                get_error: resolve(&library, "SDL_GetError")?,
                clear_error: resolve(&library, "SDL_ClearError")?,
                get_version: resolve(&library, "SDL_GetVersion")?,
                create_window_and_renderer: resolve(&library, "SDL_CreateWindowAndRenderer")?,
                destroy_renderer: resolve(&library, "SDL_DestroyRenderer")?,
                destroy_window: resolve(&library, "SDL_DestroyWindow")?,
                render_set_logical_size: resolve(&library, "SDL_RenderSetLogicalSize")?,
                get_window_flags: resolve(&library, "SDL_GetWindowFlags")?,
                set_window_fullscreen: resolve(&library, "SDL_SetWindowFullscreen")?,
                create_texture: resolve(&library, "SDL_CreateTexture")?,
                destroy_texture: resolve(&library, "SDL_DestroyTexture")?,
                update_texture: resolve(&library, "SDL_UpdateTexture")?,
                render_copy: resolve(&library, "SDL_RenderCopy")?,
                render_present: resolve(&library, "SDL_RenderPresent")?,
                poll_event: resolve(&library, "SDL_PollEvent")?,
            }
        };

        debug!("loaded {}", path.display());
        Ok(Self {
            procs,
            library,
            extracted,
        })
    }
}

fn ptr_of(raw: usize) -> *mut c_void {
    raw as *mut c_void
}

impl EventSource for Sdl2 {
    fn poll_event(&mut self, event: &mut RawEvent) -> bool {
        // SAFETY: `RawEvent` is sized and aligned like SDL_Event.
        unsafe { (self.procs.poll_event)(event.as_mut_ptr()) != 0 }
    }
}

// SAFETY for every call below: the procs were resolved from `self.library`,
// which is still loaded, and handles were produced by the same library.
impl NativeAdapter for Sdl2 {
    fn init(&mut self, flags: u32) -> Status {
        unsafe { (self.procs.init)(flags) }
    }

    fn quit(&mut self) {
        unsafe { (self.procs.quit)() }
    }

    fn last_error(&mut self) -> Option<String> {
        let message = unsafe { (self.procs.get_error)() };
        if message.is_null() {
            return None;
        }
        // SAFETY: SDL_GetError returns a NUL-terminated string it owns.
        let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
        (!text.is_empty()).then(|| text.into_owned())
    }

    fn clear_error(&mut self) {
        unsafe { (self.procs.clear_error)() }
    }

    fn version(&mut self) -> Version {
        let mut version = SdlVersion::default();
        unsafe { (self.procs.get_version)(&mut version) };
        Version {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
        }
    }

    fn create_window_and_renderer(
        &mut self,
        size: Size,
    ) -> Option<(WindowHandle, RendererHandle)> {
        let (width, height) = size.to_c();
        let mut window: *mut c_void = ptr::null_mut();
        let mut renderer: *mut c_void = ptr::null_mut();
        let status = unsafe {
            (self.procs.create_window_and_renderer)(width, height, 0, &mut window, &mut renderer)
        };
        if status != 0 {
            return None;
        }
        Some((
            WindowHandle::from_raw(window as usize)?,
            RendererHandle::from_raw(renderer as usize)?,
        ))
    }

    fn destroy_renderer(&mut self, renderer: RendererHandle) {
        unsafe { (self.procs.destroy_renderer)(ptr_of(renderer.as_raw())) }
    }

    fn destroy_window(&mut self, window: WindowHandle) {
        unsafe { (self.procs.destroy_window)(ptr_of(window.as_raw())) }
    }

    fn set_logical_size(&mut self, renderer: RendererHandle, size: Size) -> Status {
        let (width, height) = size.to_c();
        unsafe { (self.procs.render_set_logical_size)(ptr_of(renderer.as_raw()), width, height) }
    }

    fn window_flags(&mut self, window: WindowHandle) -> u32 {
        unsafe { (self.procs.get_window_flags)(ptr_of(window.as_raw())) }
    }

    fn set_window_fullscreen(&mut self, window: WindowHandle, flags: u32) -> Status {
        unsafe { (self.procs.set_window_fullscreen)(ptr_of(window.as_raw()), flags) }
    }

    fn create_texture(
        &mut self,
        renderer: RendererHandle,
        format: u32,
        access: i32,
        size: Size,
    ) -> Option<TextureHandle> {
        let (width, height) = size.to_c();
        let texture = unsafe {
            (self.procs.create_texture)(ptr_of(renderer.as_raw()), format, access, width, height)
        };
        TextureHandle::from_raw(texture as usize)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        unsafe { (self.procs.destroy_texture)(ptr_of(texture.as_raw())) }
    }

    fn update_texture(&mut self, texture: TextureHandle, pixels: &[u8], pitch: usize) -> Status {
        let Ok(pitch) = c_int::try_from(pitch) else {
            return -1;
        };
        // SAFETY: `pixels` covers the full texture; callers check its size.
        unsafe {
            (self.procs.update_texture)(
                ptr_of(texture.as_raw()),
                ptr::null(),
                pixels.as_ptr().cast(),
                pitch,
            )
        }
    }

    fn render_copy(&mut self, renderer: RendererHandle, texture: TextureHandle) -> Status {
        unsafe {
            (self.procs.render_copy)(
                ptr_of(renderer.as_raw()),
                ptr_of(texture.as_raw()),
                ptr::null(),
                ptr::null(),
            )
        }
    }

    fn render_present(&mut self, renderer: RendererHandle) {
        unsafe { (self.procs.render_present)(ptr_of(renderer.as_raw())) }
    }
}

impl fmt::Debug for Sdl2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdl2")
            .field("library", &self.library)
            .field("extracted", &self.extracted.as_ref().map(|dir| dir.path()))
            .finish_non_exhaustive()
    }
}

//! Scripted adapter that records native calls.

use super::{
    NativeAdapter, RendererHandle, Size, Status, TextureHandle, Version, WindowHandle,
};
use crate::events::{EventSource, RawEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

const WINDOW: usize = 0x1000;
const RENDERER: usize = 0x2000;
const TEXTURE: usize = 0x3000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Init(u32),
    Quit,
    Version,
    CreateWindowAndRenderer(Size),
    DestroyRenderer,
    DestroyWindow,
    SetLogicalSize(Size),
    WindowFlags,
    SetWindowFullscreen(u32),
    CreateTexture { format: u32, access: i32, size: Size },
    DestroyTexture,
    UpdateTexture { len: usize, pitch: usize },
    RenderCopy,
    RenderPresent,
    PollEvent,
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    failures: HashMap<&'static str, String>,
    trap: Option<&'static str>,
    events: VecDeque<RawEvent>,
    poll_delay: Duration,
    error: Option<String>,
    window_flags: u32,
}

#[derive(Clone, Default)]
pub(crate) struct MockNative {
    script: Arc<Mutex<Script>>,
}

impl MockNative {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `call` fail with `message` as the error text.
    pub(crate) fn fail(&self, call: &'static str, message: &str) {
        self.lock().failures.insert(call, message.to_string());
    }

    /// Panic inside `call`, like a native trap.
    pub(crate) fn panic_on(&self, call: &'static str) {
        self.lock().trap = Some(call);
    }

    pub(crate) fn push_event(&self, event: RawEvent) {
        self.lock().events.push_back(event);
    }

    pub(crate) fn set_poll_delay(&self, delay: Duration) {
        self.lock().poll_delay = delay;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Record `call`; true when it is scripted to fail.
    fn enter(&self, call: Call, name: &'static str) -> bool {
        let mut script = self.lock();
        script.calls.push(call);
        let trapped = script.trap == Some(name);
        let failure = script.failures.remove(name);
        if let Some(message) = &failure {
            script.error = Some(message.clone());
        }
        drop(script);

        if trapped {
            panic!("native trap in {}", name);
        }
        failure.is_some()
    }

    fn status(&self, call: Call, name: &'static str) -> Status {
        if self.enter(call, name) { -1 } else { 0 }
    }
}

impl EventSource for MockNative {
    fn poll_event(&mut self, event: &mut RawEvent) -> bool {
        let delay = {
            let mut script = self.lock();
            script.calls.push(Call::PollEvent);
            script.poll_delay
        };
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        match self.lock().events.pop_front() {
            Some(next) => {
                *event = next;
                true
            }
            None => false,
        }
    }
}

impl NativeAdapter for MockNative {
    fn init(&mut self, flags: u32) -> Status {
        self.status(Call::Init(flags), "init")
    }

    fn quit(&mut self) {
        self.enter(Call::Quit, "quit");
    }

    fn last_error(&mut self) -> Option<String> {
        self.lock().error.clone()
    }

    fn clear_error(&mut self) {
        self.lock().error = None;
    }

    fn version(&mut self) -> Version {
        self.enter(Call::Version, "version");
        Version {
            major: 2,
            minor: 0,
            patch: 20,
        }
    }

    fn create_window_and_renderer(
        &mut self,
        size: Size,
    ) -> Option<(WindowHandle, RendererHandle)> {
        if self.enter(
            Call::CreateWindowAndRenderer(size),
            "create_window_and_renderer",
        ) {
            return None;
        }
        Some((
            WindowHandle::from_raw(WINDOW)?,
            RendererHandle::from_raw(RENDERER)?,
        ))
    }

    fn destroy_renderer(&mut self, _renderer: RendererHandle) {
        self.enter(Call::DestroyRenderer, "destroy_renderer");
    }

    fn destroy_window(&mut self, _window: WindowHandle) {
        self.enter(Call::DestroyWindow, "destroy_window");
    }

    fn set_logical_size(&mut self, _renderer: RendererHandle, size: Size) -> Status {
        self.status(Call::SetLogicalSize(size), "set_logical_size")
    }

    fn window_flags(&mut self, _window: WindowHandle) -> u32 {
        self.enter(Call::WindowFlags, "window_flags");
        self.lock().window_flags
    }

    fn set_window_fullscreen(&mut self, _window: WindowHandle, flags: u32) -> Status {
        let status = self.status(Call::SetWindowFullscreen(flags), "set_window_fullscreen");
        if status == 0 {
            self.lock().window_flags = flags;
        }
        status
    }

    fn create_texture(
        &mut self,
        _renderer: RendererHandle,
        format: u32,
        access: i32,
        size: Size,
    ) -> Option<TextureHandle> {
        let call = Call::CreateTexture {
            format,
            access,
            size,
        };
        if self.enter(call, "create_texture") {
            return None;
        }
        TextureHandle::from_raw(TEXTURE)
    }

    fn destroy_texture(&mut self, _texture: TextureHandle) {
        self.enter(Call::DestroyTexture, "destroy_texture");
    }

    fn update_texture(&mut self, _texture: TextureHandle, pixels: &[u8], pitch: usize) -> Status {
        let call = Call::UpdateTexture {
            len: pixels.len(),
            pitch,
        };
        self.status(call, "update_texture")
    }

    fn render_copy(&mut self, _renderer: RendererHandle, _texture: TextureHandle) -> Status {
        self.status(Call::RenderCopy, "render_copy")
    }

    fn render_present(&mut self, _renderer: RendererHandle) {
        self.enter(Call::RenderPresent, "render_present");
    }
}

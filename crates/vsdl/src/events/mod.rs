//! Native event decoding.
//!
//! The decoder polls the native queue into pooled buffers and wraps each
//! recognized record in a typed view. Views own their buffer; releasing or
//! dropping one returns the buffer for the next poll.

mod pool;
mod views;

pub use pool::{EVENT_SIZE, EventPool, PooledEvent, RawEvent};
pub use views::{
    EventView, KeyboardEvent, MouseButtonEvent, MouseMotionEvent, MouseWheelEvent, QuitEvent,
    WindowEvent, WindowEventId,
};

use crossbeam_channel::Receiver;
use log::trace;

// SDL_EventType discriminants
pub const QUIT: u32 = 0x100;
pub const WINDOWEVENT: u32 = 0x200;
pub const KEYDOWN: u32 = 0x300;
pub const KEYUP: u32 = 0x301;
pub const MOUSEMOTION: u32 = 0x400;
pub const MOUSEBUTTONDOWN: u32 = 0x401;
pub const MOUSEBUTTONUP: u32 = 0x402;
pub const MOUSEWHEEL: u32 = 0x403;

/// Anything that can fill an event record, the way SDL_PollEvent does.
pub trait EventSource {
    /// Write the next pending event into `event`. False when none is pending.
    fn poll_event(&mut self, event: &mut RawEvent) -> bool;
}

/// A decoded event. Each variant owns one pooled buffer.
#[derive(Debug)]
pub enum Event {
    Quit(QuitEvent),
    Window(WindowEvent),
    KeyDown(KeyboardEvent),
    KeyUp(KeyboardEvent),
    MouseMotion(MouseMotionEvent),
    /// Press and release share one view; see [`MouseButtonEvent::is_pressed`].
    MouseButton(MouseButtonEvent),
    MouseWheel(MouseWheelEvent),
}

impl Event {
    /// Wrap a filled buffer. Unknown kinds hand the buffer back.
    pub fn decode(raw: PooledEvent) -> Result<Event, PooledEvent> {
        let event = match raw.kind() {
            QUIT => Event::Quit(QuitEvent::new(raw)),
            WINDOWEVENT => Event::Window(WindowEvent::new(raw)),
            KEYDOWN => Event::KeyDown(KeyboardEvent::new(raw)),
            KEYUP => Event::KeyUp(KeyboardEvent::new(raw)),
            MOUSEMOTION => Event::MouseMotion(MouseMotionEvent::new(raw)),
            MOUSEBUTTONDOWN | MOUSEBUTTONUP => Event::MouseButton(MouseButtonEvent::new(raw)),
            MOUSEWHEEL => Event::MouseWheel(MouseWheelEvent::new(raw)),
            _ => return Err(raw),
        };
        Ok(event)
    }

    fn view(&self) -> &dyn EventView {
        match self {
            Event::Quit(e) => e,
            Event::Window(e) => e,
            Event::KeyDown(e) | Event::KeyUp(e) => e,
            Event::MouseMotion(e) => e,
            Event::MouseButton(e) => e,
            Event::MouseWheel(e) => e,
        }
    }

    pub fn kind(&self) -> u32 {
        self.view().kind()
    }

    pub fn timestamp(&self) -> u32 {
        self.view().timestamp()
    }

    /// Return the buffer to its pool. Dropping the event does the same.
    pub fn release(self) {
        drop(self);
    }
}

/// Polls a source into pooled buffers.
#[derive(Debug, Clone, Default)]
pub struct EventDecoder {
    pool: EventPool,
}

impl EventDecoder {
    pub fn new(pool: EventPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &EventPool {
        &self.pool
    }

    /// Next recognized event, or `None` when the queue is empty.
    ///
    /// An unrecognized kind also yields `None`, ending the current drain.
    /// Its buffer goes back to the pool either way.
    pub fn poll_next<S: EventSource + ?Sized>(&self, source: &mut S) -> Option<Event> {
        let mut raw = self.pool.acquire();
        if !source.poll_event(&mut raw) {
            return None;
        }
        match Event::decode(raw) {
            Ok(event) => Some(event),
            Err(unknown) => {
                trace!("unhandled event kind {:#x}, ending drain", unknown.kind());
                None
            }
        }
    }
}

/// Events from one drain, in native order.
///
/// Iteration ends when the drain has finished and every event was taken.
/// Events left unread go back to the pool when the stream is dropped.
#[derive(Debug)]
pub struct EventStream {
    events: Receiver<Event>,
}

impl EventStream {
    pub(crate) fn new(events: Receiver<Event>) -> Self {
        Self { events }
    }

    /// Next event if one is already decoded, without waiting for the drain.
    pub fn try_next(&self) -> Option<Event> {
        self.events.try_recv().ok()
    }
}

impl Iterator for EventStream {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.events.recv().ok()
    }
}

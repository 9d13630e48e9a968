//! Typed views over a pooled native event.
//!
//! Each view reads its fields straight out of the pooled buffer at the
//! offsets of the matching SDL2 struct. Padding and reserved bytes are left
//! as the library wrote them and are never read.

use super::pool::{EVENT_SIZE, PooledEvent, RawEvent};
use crate::keys::{Keycode, Keysym, Modifiers};
use std::fmt;

mod offset {
    pub const TIMESTAMP: usize = 4;
    pub const WINDOW_ID: usize = 8;

    // SDL_WindowEvent
    pub const WINDOW_EVENT: usize = 12;
    pub const WINDOW_DATA1: usize = 16;
    pub const WINDOW_DATA2: usize = 20;

    // SDL_KeyboardEvent, keysym at 16
    pub const KEY_STATE: usize = 12;
    pub const KEY_REPEAT: usize = 13;
    pub const KEY_SCANCODE: usize = 16;
    pub const KEY_SYM: usize = 20;
    pub const KEY_MOD: usize = 24;

    // SDL_MouseMotionEvent
    pub const MOTION_WHICH: usize = 12;
    pub const MOTION_STATE: usize = 16;
    pub const MOTION_X: usize = 20;
    pub const MOTION_Y: usize = 24;
    pub const MOTION_XREL: usize = 28;
    pub const MOTION_YREL: usize = 32;

    // SDL_MouseButtonEvent
    pub const BUTTON_WHICH: usize = 12;
    pub const BUTTON_BUTTON: usize = 16;
    pub const BUTTON_STATE: usize = 17;
    pub const BUTTON_CLICKS: usize = 18;
    pub const BUTTON_X: usize = 20;
    pub const BUTTON_Y: usize = 24;

    // SDL_MouseWheelEvent
    pub const WHEEL_WHICH: usize = 12;
    pub const WHEEL_X: usize = 16;
    pub const WHEEL_Y: usize = 20;
    pub const WHEEL_DIRECTION: usize = 24;
}

// Every field read must stay inside the record.
const _: () = assert!(offset::MOTION_YREL + 4 <= EVENT_SIZE);
const _: () = assert!(offset::WHEEL_DIRECTION + 4 <= EVENT_SIZE);
const _: () = assert!(offset::KEY_MOD + 2 <= EVENT_SIZE);

/// Button state byte for "pressed".
const PRESSED: u8 = 1;

/// Fields common to every event.
pub trait EventView {
    fn raw(&self) -> &RawEvent;

    fn kind(&self) -> u32 {
        self.raw().kind()
    }

    /// Milliseconds since library initialization.
    fn timestamp(&self) -> u32 {
        self.raw().u32_at(offset::TIMESTAMP)
    }
}

macro_rules! event_view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name {
            raw: PooledEvent,
        }

        impl $name {
            pub(crate) fn new(raw: PooledEvent) -> Self {
                Self { raw }
            }

            /// Return the buffer to its pool.
            pub fn release(self) {
                self.raw.release();
            }
        }

        impl EventView for $name {
            fn raw(&self) -> &RawEvent {
                &self.raw
            }
        }
    };
}

event_view!(
    /// The user asked to close the application.
    QuitEvent
);

impl fmt::Debug for QuitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuitEvent")
            .field("timestamp", &self.timestamp())
            .finish()
    }
}

event_view!(
    /// Window state change (SDL_WindowEvent).
    WindowEvent
);

impl WindowEvent {
    pub fn window_id(&self) -> u32 {
        self.raw.u32_at(offset::WINDOW_ID)
    }

    pub fn event(&self) -> WindowEventId {
        WindowEventId::from(self.raw.u8_at(offset::WINDOW_EVENT))
    }

    /// Event dependent: position for moves, size for resizes.
    pub fn data1(&self) -> i32 {
        self.raw.i32_at(offset::WINDOW_DATA1)
    }

    pub fn data2(&self) -> i32 {
        self.raw.i32_at(offset::WINDOW_DATA2)
    }
}

impl fmt::Debug for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowEvent")
            .field("timestamp", &self.timestamp())
            .field("window_id", &self.window_id())
            .field("event", &self.event())
            .field("data1", &self.data1())
            .field("data2", &self.data2())
            .finish()
    }
}

/// Sub-event carried by a [`WindowEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowEventId {
    Shown,
    Hidden,
    Exposed,
    Moved,
    Resized,
    SizeChanged,
    Minimized,
    Maximized,
    Restored,
    Enter,
    Leave,
    FocusGained,
    FocusLost,
    Close,
    Other(u8),
}

impl From<u8> for WindowEventId {
    fn from(id: u8) -> Self {
        match id {
            1 => WindowEventId::Shown,
            2 => WindowEventId::Hidden,
            3 => WindowEventId::Exposed,
            4 => WindowEventId::Moved,
            5 => WindowEventId::Resized,
            6 => WindowEventId::SizeChanged,
            7 => WindowEventId::Minimized,
            8 => WindowEventId::Maximized,
            9 => WindowEventId::Restored,
            10 => WindowEventId::Enter,
            11 => WindowEventId::Leave,
            12 => WindowEventId::FocusGained,
            13 => WindowEventId::FocusLost,
            14 => WindowEventId::Close,
            other => WindowEventId::Other(other),
        }
    }
}

event_view!(
    /// Key press or release (SDL_KeyboardEvent).
    KeyboardEvent
);

impl KeyboardEvent {
    pub fn window_id(&self) -> u32 {
        self.raw.u32_at(offset::WINDOW_ID)
    }

    pub fn is_pressed(&self) -> bool {
        self.raw.u8_at(offset::KEY_STATE) == PRESSED
    }

    /// True for auto-repeat presses.
    pub fn is_repeat(&self) -> bool {
        self.raw.u8_at(offset::KEY_REPEAT) != 0
    }

    pub fn keysym(&self) -> Keysym {
        Keysym {
            scancode: self.raw.u32_at(offset::KEY_SCANCODE),
            sym: Keycode(self.raw.i32_at(offset::KEY_SYM)),
            modifiers: Modifiers(self.raw.u16_at(offset::KEY_MOD)),
        }
    }
}

impl fmt::Debug for KeyboardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardEvent")
            .field("timestamp", &self.timestamp())
            .field("window_id", &self.window_id())
            .field("pressed", &self.is_pressed())
            .field("repeat", &self.is_repeat())
            .field("keysym", &self.keysym())
            .finish()
    }
}

event_view!(
    /// Pointer movement (SDL_MouseMotionEvent).
    MouseMotionEvent
);

impl MouseMotionEvent {
    pub fn window_id(&self) -> u32 {
        self.raw.u32_at(offset::WINDOW_ID)
    }

    /// Mouse instance id.
    pub fn which(&self) -> u32 {
        self.raw.u32_at(offset::MOTION_WHICH)
    }

    /// Held buttons, one bit per button.
    pub fn state(&self) -> u32 {
        self.raw.u32_at(offset::MOTION_STATE)
    }

    pub fn x(&self) -> i32 {
        self.raw.i32_at(offset::MOTION_X)
    }

    pub fn y(&self) -> i32 {
        self.raw.i32_at(offset::MOTION_Y)
    }

    pub fn xrel(&self) -> i32 {
        self.raw.i32_at(offset::MOTION_XREL)
    }

    pub fn yrel(&self) -> i32 {
        self.raw.i32_at(offset::MOTION_YREL)
    }
}

impl fmt::Debug for MouseMotionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MouseMotionEvent")
            .field("timestamp", &self.timestamp())
            .field("which", &self.which())
            .field("state", &self.state())
            .field("x", &self.x())
            .field("y", &self.y())
            .field("xrel", &self.xrel())
            .field("yrel", &self.yrel())
            .finish()
    }
}

event_view!(
    /// Button press or release (SDL_MouseButtonEvent). Both share this view.
    MouseButtonEvent
);

impl MouseButtonEvent {
    pub const LEFT: u8 = 1;
    pub const MIDDLE: u8 = 2;
    pub const RIGHT: u8 = 3;
    pub const X1: u8 = 4;
    pub const X2: u8 = 5;

    pub fn window_id(&self) -> u32 {
        self.raw.u32_at(offset::WINDOW_ID)
    }

    pub fn which(&self) -> u32 {
        self.raw.u32_at(offset::BUTTON_WHICH)
    }

    pub fn button(&self) -> u8 {
        self.raw.u8_at(offset::BUTTON_BUTTON)
    }

    pub fn is_pressed(&self) -> bool {
        self.raw.u8_at(offset::BUTTON_STATE) == PRESSED
    }

    /// 1 for single-click, 2 for double-click, ...
    pub fn clicks(&self) -> u8 {
        self.raw.u8_at(offset::BUTTON_CLICKS)
    }

    pub fn x(&self) -> i32 {
        self.raw.i32_at(offset::BUTTON_X)
    }

    pub fn y(&self) -> i32 {
        self.raw.i32_at(offset::BUTTON_Y)
    }
}

impl fmt::Debug for MouseButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MouseButtonEvent")
            .field("timestamp", &self.timestamp())
            .field("which", &self.which())
            .field("button", &self.button())
            .field("pressed", &self.is_pressed())
            .field("clicks", &self.clicks())
            .field("x", &self.x())
            .field("y", &self.y())
            .finish()
    }
}

event_view!(
    /// Scroll wheel (SDL_MouseWheelEvent).
    MouseWheelEvent
);

impl MouseWheelEvent {
    pub fn window_id(&self) -> u32 {
        self.raw.u32_at(offset::WINDOW_ID)
    }

    pub fn which(&self) -> u32 {
        self.raw.u32_at(offset::WHEEL_WHICH)
    }

    pub fn x(&self) -> i32 {
        self.raw.i32_at(offset::WHEEL_X)
    }

    pub fn y(&self) -> i32 {
        self.raw.i32_at(offset::WHEEL_Y)
    }

    pub fn direction(&self) -> u32 {
        self.raw.u32_at(offset::WHEEL_DIRECTION)
    }

    /// Natural scrolling: deltas are inverted.
    pub fn is_flipped(&self) -> bool {
        self.direction() == 1
    }
}

impl fmt::Debug for MouseWheelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MouseWheelEvent")
            .field("timestamp", &self.timestamp())
            .field("which", &self.which())
            .field("x", &self.x())
            .field("y", &self.y())
            .field("direction", &self.direction())
            .finish()
    }
}

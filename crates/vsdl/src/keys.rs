//! Key codes and modifier masks.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Virtual key code (SDL_Keycode). Printable keys are their character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Keycode(pub i32);

impl Keycode {
    pub const RETURN: Keycode = Keycode('\r' as i32);
    pub const ESCAPE: Keycode = Keycode(0x1b);
    pub const BACKSPACE: Keycode = Keycode(0x08);
    pub const TAB: Keycode = Keycode('\t' as i32);
    pub const SPACE: Keycode = Keycode(' ' as i32);
    pub const DELETE: Keycode = Keycode(0x7f);

    /// The character for printable keys.
    pub fn to_char(self) -> Option<char> {
        u32::try_from(self.0).ok().and_then(char::from_u32)
    }
}

impl From<char> for Keycode {
    fn from(c: char) -> Self {
        Keycode(c as i32)
    }
}

/// Modifier key mask (SDL_Keymod).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(pub u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0x0000);
    pub const LSHIFT: Modifiers = Modifiers(0x0001);
    pub const RSHIFT: Modifiers = Modifiers(0x0002);
    pub const LCTRL: Modifiers = Modifiers(0x0040);
    pub const RCTRL: Modifiers = Modifiers(0x0080);
    pub const LALT: Modifiers = Modifiers(0x0100);
    pub const RALT: Modifiers = Modifiers(0x0200);
    pub const LGUI: Modifiers = Modifiers(0x0400);
    pub const RGUI: Modifiers = Modifiers(0x0800);
    pub const NUM: Modifiers = Modifiers(0x1000);
    pub const CAPS: Modifiers = Modifiers(0x2000);
    pub const MODE: Modifiers = Modifiers(0x4000);

    // Either side
    pub const SHIFT: Modifiers = Modifiers(Self::LSHIFT.0 | Self::RSHIFT.0);
    pub const CTRL: Modifiers = Modifiers(Self::LCTRL.0 | Self::RCTRL.0);
    pub const ALT: Modifiers = Modifiers(Self::LALT.0 | Self::RALT.0);
    pub const GUI: Modifiers = Modifiers(Self::LGUI.0 | Self::RGUI.0);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// All bits of `other` are set.
    pub fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any bit of `other` is set.
    pub fn contains_any(self, other: Modifiers) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;

    fn bitand(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 & rhs.0)
    }
}

/// Key identity carried by a keyboard event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keysym {
    /// Physical key position (SDL_Scancode).
    pub scancode: u32,
    pub sym: Keycode,
    pub modifiers: Modifiers,
}

impl Keysym {
    pub fn is_key(&self, key: Keycode) -> bool {
        self.sym == key
    }

    /// True if any modifier in `mask` is held.
    pub fn is_mod(&self, mask: Modifiers) -> bool {
        self.modifiers.contains_any(mask)
    }
}

impl fmt::Display for Keysym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sym.to_char() {
            Some(c) => write!(f, "{}", c),
            None => write!(f, "{:#x}", self.sym.0),
        }
    }
}

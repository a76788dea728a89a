#![forbid(unsafe_code)]

//! Logical key identifiers and modifier masks.
//!
//! A [`Key`] is the abstract integer a simulation consumes: a printable
//! byte, an arrow, a function key, or a synthesized mouse-button action.
//! The id space is the classic doom-engine layout: printable ASCII and
//! control bytes pass through unchanged, specials occupy the high half.
//! The whole space fits in a `u8`, so a key indexes the held-key bit set
//! directly.

use std::fmt;

use bitflags::bitflags;

/// Logical key id consumed by the input sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(u8);

impl Key {
    pub const TAB: Key = Key(9);
    pub const ENTER: Key = Key(13);
    pub const ESCAPE: Key = Key(27);

    pub const LEFT: Key = Key(0xAC);
    pub const UP: Key = Key(0xAD);
    pub const RIGHT: Key = Key(0xAE);
    pub const DOWN: Key = Key(0xAF);

    pub const CTRL: Key = Key(0x9D);
    pub const SHIFT: Key = Key(0xB6);
    pub const ALT: Key = Key(0xB8);

    pub const F1: Key = Key(0xBB);
    pub const F2: Key = Key(0xBC);
    pub const F3: Key = Key(0xBD);
    pub const F4: Key = Key(0xBE);
    pub const F5: Key = Key(0xBF);
    pub const F6: Key = Key(0xC0);
    pub const F7: Key = Key(0xC1);
    pub const F8: Key = Key(0xC2);
    pub const F9: Key = Key(0xC3);
    pub const F10: Key = Key(0xC4);
    pub const F11: Key = Key(0xD7);
    pub const F12: Key = Key(0xD8);

    /// Primary action, aliased to Ctrl. Bare modifier presses are invisible
    /// to a terminal, so common action letters map here too (see
    /// [`Key::from_ascii`]).
    pub const FIRE: Key = Key::CTRL;
    /// Secondary action, aliased to Space.
    pub const USE: Key = Key(b' ');
    /// Run toggle, aliased to Shift.
    pub const RUN: Key = Key::SHIFT;

    #[must_use]
    pub const fn new(code: u8) -> Self {
        Key(code)
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// Map a raw input byte to its logical key.
    ///
    /// CR and LF both normalize to Enter; terminals disagree about which
    /// byte Enter sends. Space and the letters `f`/`F`/`i`/`I` alias the
    /// fire action. Every other byte is its own id.
    #[must_use]
    pub const fn from_ascii(byte: u8) -> Self {
        match byte {
            b'\r' | b'\n' => Key::ENTER,
            b' ' | b'f' | b'F' | b'i' | b'I' => Key::FIRE,
            _ => Key(byte),
        }
    }

    #[must_use]
    pub const fn is_arrow(self) -> bool {
        matches!(self.0, 0xAC..=0xAF)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Key::TAB => f.write_str("Tab"),
            Key::ENTER => f.write_str("Enter"),
            Key::ESCAPE => f.write_str("Escape"),
            Key::LEFT => f.write_str("Left"),
            Key::UP => f.write_str("Up"),
            Key::RIGHT => f.write_str("Right"),
            Key::DOWN => f.write_str("Down"),
            Key::CTRL => f.write_str("Ctrl"),
            Key::SHIFT => f.write_str("Shift"),
            Key::ALT => f.write_str("Alt"),
            Key::USE => f.write_str("Space"),
            Key(code @ 0xBB..=0xC4) => write!(f, "F{}", code - 0xBA),
            Key::F11 => f.write_str("F11"),
            Key::F12 => f.write_str("F12"),
            Key(code) if code.is_ascii_graphic() => write!(f, "{}", code as char),
            Key(code) => write!(f, "0x{code:02X}"),
        }
    }
}

bitflags! {
    /// Modifier bits decoded from the xterm CSI modifier parameter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const ALT = 1 << 1;
        const CTRL = 1 << 2;
    }
}

impl Modifiers {
    /// xterm encodes the modifier parameter as `1 + bits`; absent, `0`, and
    /// `1` all mean no modifiers.
    #[must_use]
    pub fn from_xterm_param(param: u32) -> Self {
        let bits = param.saturating_sub(1) & 0b111;
        Self::from_bits_truncate(bits as u8)
    }
}

/// Modifier-bit to logical-key pairs, in press order.
pub const MODIFIER_KEYS: [(Modifiers, Key); 3] = [
    (Modifiers::SHIFT, Key::SHIFT),
    (Modifiers::ALT, Key::ALT),
    (Modifiers::CTRL, Key::CTRL),
];

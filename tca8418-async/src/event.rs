//! Decoding of KEY_EVENT_A scan codes.

use crate::register::{KEY_EVENT_CODE_MASK, KEY_EVENT_PRESSED};

/// Number of columns in the IC's linear key numbering.
pub const KEY_STRIDE: u8 = 10;

/// A raw value popped from the KEY_EVENT_A register.
///
/// Bit 7 is the direction (1 = press, 0 = release), bits 6:0 are the key
/// index. A value of 0 means the FIFO was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawScanCode(pub u8);

impl RawScanCode {
    /// The FIFO had no event.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The key index in bits 6:0.
    pub fn code(self) -> u8 {
        self.0 & KEY_EVENT_CODE_MASK
    }

    /// Decodes the scan code into a [`KeyEvent`].
    pub fn decode(self) -> KeyEvent {
        decode(self)
    }
}

impl From<u8> for RawScanCode {
    fn from(val: u8) -> Self {
        Self(val)
    }
}

/// A decoded key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// `true` for a press, `false` for a release.
    pub pressed: bool,
    /// Row of the key, `code / 10`.
    pub row: u8,
    /// Column of the key, `code % 10`.
    pub col: u8,
}

/// Splits a scan code into direction, row and column.
///
/// Row and column come straight from the key index without subtracting one,
/// even though the IC numbers its keys from 1. Key R0C0 (index 1) therefore
/// decodes as row 0, column 1 and key R0C9 (index 10) as row 1, column 0.
pub fn decode(raw: RawScanCode) -> KeyEvent {
    let code = raw.code();
    KeyEvent {
        pressed: raw.0 & KEY_EVENT_PRESSED > 0,
        row: code / KEY_STRIDE,
        col: code % KEY_STRIDE,
    }
}

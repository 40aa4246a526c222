//! Mapping of decoded key positions onto the calculator's inputs.
//!
//! Columns 0-4 of rows 0-5 form the main key matrix. Columns 5-8 carry the
//! bit buttons, one per row 0-7. Everything else is not wired on the board.

use core::ops::RangeInclusive;

use tca8418_async::KeyEvent;

/// Columns of the main key matrix.
pub const MATRIX_COLUMNS: RangeInclusive<u8> = 0..=4;
/// Rows of the main key matrix.
pub const MATRIX_ROWS: RangeInclusive<u8> = 0..=5;
/// Columns of the auxiliary bit buttons.
pub const AUX_COLUMNS: RangeInclusive<u8> = 5..=8;
/// Rows of the auxiliary bit buttons.
pub const AUX_ROWS: RangeInclusive<u8> = 0..=7;

/// Where a key position lives on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDomain {
    /// A key of the main calculator matrix.
    MatrixKey {
        /// Row, 0-5.
        row: u8,
        /// Column, 0-4.
        col: u8,
    },
    /// One of the bit buttons next to the matrix.
    AuxButton {
        /// Row, 0-7.
        row: u8,
        /// Column, 5-8.
        col: u8,
    },
    /// A position with no key behind it.
    Invalid {
        /// Decoded row.
        row: u8,
        /// Decoded column.
        col: u8,
    },
}

impl KeyDomain {
    /// Bit of the 32-bit value that a bit button toggles.
    ///
    /// Column 5 covers bits 0-7, column 8 bits 24-31, one bit per row.
    pub fn bit_index(&self) -> Option<u8> {
        match *self {
            KeyDomain::AuxButton { row, col } => Some((col - AUX_COLUMNS.start()) * 8 + row),
            _ => None,
        }
    }
}

/// Classifies the position of a decoded event.
///
/// The direction of the event is ignored.
pub fn classify(event: &KeyEvent) -> KeyDomain {
    let (row, col) = (event.row, event.col);
    if MATRIX_COLUMNS.contains(&col) && MATRIX_ROWS.contains(&row) {
        KeyDomain::MatrixKey { row, col }
    } else if AUX_COLUMNS.contains(&col) && AUX_ROWS.contains(&row) {
        KeyDomain::AuxButton { row, col }
    } else {
        KeyDomain::Invalid { row, col }
    }
}

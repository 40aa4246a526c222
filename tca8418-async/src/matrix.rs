//! Keypad matrix geometry and the KP_GPIO select masks derived from it.

/// Rows and columns of the keypad matrix assigned to the scanner.
///
/// Lines that are not part of the matrix stay in GPIO mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixGeometry {
    rows: u8,
    columns: u8,
}

impl MatrixGeometry {
    /// Maximum rows the IC can scan.
    pub const MAX_ROWS: u8 = 8;
    /// Maximum columns the IC can scan.
    pub const MAX_COLUMNS: u8 = 10;
    /// Every line in keypad mode.
    pub const FULL: Self = Self {
        rows: Self::MAX_ROWS,
        columns: Self::MAX_COLUMNS,
    };

    /// Returns `None` unless `rows` is in 1..=8 and `columns` in 1..=10.
    pub const fn new(rows: u8, columns: u8) -> Option<Self> {
        if rows == 0 || rows > Self::MAX_ROWS || columns == 0 || columns > Self::MAX_COLUMNS {
            return None;
        }
        Some(Self { rows, columns })
    }

    /// Number of rows.
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    /// Number of columns.
    pub const fn columns(&self) -> u8 {
        self.columns
    }

    /// KP_GPIO1 value, one bit per row starting at ROW0.
    pub const fn row_mask(&self) -> u8 {
        low_bits(self.rows)
    }

    /// KP_GPIO2 value, one bit per column for COL0-COL7.
    pub const fn column_mask(&self) -> u8 {
        if self.columns > 8 {
            low_bits(8)
        } else {
            low_bits(self.columns)
        }
    }

    /// KP_GPIO3 value for COL8-COL9, or `None` when the register is left alone.
    ///
    /// Nine columns also return `None`, so COL8 is never switched to keypad
    /// mode for a 9-column matrix. Only ten columns write the register.
    pub const fn extended_column_mask(&self) -> Option<u8> {
        if self.columns == Self::MAX_COLUMNS {
            Some(0x03)
        } else {
            None
        }
    }
}

impl Default for MatrixGeometry {
    fn default() -> Self {
        Self::FULL
    }
}

const fn low_bits(count: u8) -> u8 {
    if count >= 8 {
        0xFF
    } else {
        (1u8 << count) - 1
    }
}

//! Error types for the TCA8418 driver.

use core::fmt::{self, Debug};

/// The main error type for the TCA8418 driver.
#[derive(PartialEq, Eq)]
pub enum Error<TI2CERR> {
    /// An I2C transaction with the device failed.
    I2c(TI2CERR),
    /// The requested keypad matrix does not fit the IC (1-8 rows, 1-10 columns).
    ///
    /// No register is written when this is returned.
    InvalidGeometry {
        /// Requested number of rows.
        rows: u8,
        /// Requested number of columns.
        columns: u8,
    },
}

impl<TI2CERR: Debug> Debug for Error<TI2CERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c(err) => write!(f, "I2c({err:?})"),
            Self::InvalidGeometry { rows, columns } => {
                write!(f, "InvalidGeometry({rows}x{columns})")
            }
        }
    }
}

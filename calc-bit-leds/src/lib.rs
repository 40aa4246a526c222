//! A `no_std` driver for the calculator's 32 bit-indicator LEDs.
//!
//! The LEDs hang off four cascaded 74HC595-style shift registers that are
//! bit-banged over five GPIOs: serial data (SER), shift clock (SRCLK), shift
//! register clear (SRCLR, active low), storage clock (RCLK) and output enable
//! (OE, active low).
//!
//! # Usage
//!
//! ```ignore
//! use calc_bit_leds::BitLeds;
//!
//! let mut leds = BitLeds::new((ser, srclk, srclr, rclk, oe), embassy_time::Delay);
//! leds.init()?;
//! leds.set(0xDEAD_BEEF)?;
//! ```

#![cfg_attr(not(test), no_std)]

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

type Pins<TSER, TSRCLK, TSRCLR, TRCLK, TOE> = (TSER, TSRCLK, TSRCLR, TRCLK, TOE);

/// Setup and hold time around every clock edge.
const EDGE_DELAY_US: u32 = 1;

/// The shift-register LED bank.
pub struct BitLeds<TSER, TSRCLK, TSRCLR, TRCLK, TOE, D> {
    ser: TSER,
    srclk: TSRCLK,
    srclr: TSRCLR,
    rclk: TRCLK,
    oe: TOE,
    delay: D,
}

impl<TSER, TSRCLK, TSRCLR, TRCLK, TOE, D, TPINERR> BitLeds<TSER, TSRCLK, TSRCLR, TRCLK, TOE, D>
where
    TSER: OutputPin<Error = TPINERR>,
    TSRCLK: OutputPin<Error = TPINERR>,
    TSRCLR: OutputPin<Error = TPINERR>,
    TRCLK: OutputPin<Error = TPINERR>,
    TOE: OutputPin<Error = TPINERR>,
    D: DelayNs,
{
    /// Creates a new `BitLeds`.
    ///
    /// # Arguments
    ///
    /// * `pins` - The control lines: (SER, SRCLK, SRCLR, RCLK, OE).
    /// * `delay` - A delay provider for the clock timing.
    pub fn new(pins: Pins<TSER, TSRCLK, TSRCLR, TRCLK, TOE>, delay: D) -> Self {
        let (ser, srclk, srclr, rclk, oe) = pins;
        Self {
            ser,
            srclk,
            srclr,
            rclk,
            oe,
            delay,
        }
    }

    /// Clears all LEDs, enables the outputs and parks the clock and data lines low.
    pub fn init(&mut self) -> Result<(), TPINERR> {
        self.clear()?;
        self.latch()?;
        self.enable(true)?;
        self.srclk.set_low()?;
        self.ser.set_low()?;
        log::debug!("Bit LEDs initialized.");
        Ok(())
    }

    /// Drives OE, which is active low.
    pub fn enable(&mut self, enable: bool) -> Result<(), TPINERR> {
        self.oe.set_state((!enable).into())
    }

    /// Clears the shift registers with a pulse on SRCLR.
    ///
    /// The outputs keep their value until the next [`BitLeds::latch`].
    pub fn clear(&mut self) -> Result<(), TPINERR> {
        self.srclr.set_high()?;
        self.delay.delay_us(EDGE_DELAY_US);
        self.srclr.set_low()?;
        self.delay.delay_us(EDGE_DELAY_US);
        self.srclr.set_high()?;
        self.delay.delay_us(EDGE_DELAY_US);
        Ok(())
    }

    /// Copies the shift registers to the outputs with a pulse on RCLK.
    pub fn latch(&mut self) -> Result<(), TPINERR> {
        self.rclk.set_low()?;
        self.delay.delay_us(EDGE_DELAY_US);
        self.rclk.set_high()?;
        self.delay.delay_us(EDGE_DELAY_US);
        self.rclk.set_low()?;
        self.delay.delay_us(EDGE_DELAY_US);
        Ok(())
    }

    /// Shows `value` in binary on the LEDs.
    ///
    /// The chain is wired with the least significant byte at the far end, so
    /// bytes go out from 3 down to 0, each one MSB first.
    pub fn set(&mut self, value: u32) -> Result<(), TPINERR> {
        log::trace!("bit leds {value:#010x}");
        for byte in value.to_be_bytes() {
            for bit in (0..8).rev() {
                self.shift_bit((byte >> bit) & 1 == 1)?;
            }
        }
        self.latch()
    }

    fn shift_bit(&mut self, bit: bool) -> Result<(), TPINERR> {
        self.ser.set_state(bit.into())?;
        self.delay.delay_us(EDGE_DELAY_US);
        self.srclk.set_high()?;
        self.delay.delay_us(EDGE_DELAY_US);
        self.srclk.set_low()?;
        self.delay.delay_us(EDGE_DELAY_US);
        Ok(())
    }
}

//! Core implementation of the TCA8418 keypad scanner driver.

use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::err::Error;
use crate::event::RawScanCode;
use crate::matrix::MatrixGeometry;
use crate::register::*;
use crate::transport::RegisterTransport;

/// A driver for the TCA8418 I2C keypad scan IC.
///
/// The driver is the only writer of the scanner's registers. It does not keep
/// a copy of the event FIFO; every event is popped from the IC on demand.
pub struct Tca8418<
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
> {
    regs: RegisterTransport<I2cType, ErrorType>,
}

impl<
        I2cType: I2c<SevenBitAddress, Error = ErrorType>,
        ErrorType: embedded_hal_async::i2c::Error,
    > Tca8418<I2cType, ErrorType>
{
    /// Creates a new driver at the default address (`0x34`).
    ///
    /// # Arguments
    ///
    /// * `i2c` - An I2C peripheral that implements `embedded-hal-async::i2c::I2c`,
    ///   already configured for the bus speed (400 kHz max).
    pub fn new(i2c: I2cType) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Creates a new driver for a device at `address`.
    pub fn with_address(i2c: I2cType, address: SevenBitAddress) -> Self {
        Self {
            regs: RegisterTransport::new(i2c, address),
        }
    }

    /// Releases the I2C peripheral.
    pub fn release(self) -> I2cType {
        self.regs.release()
    }

    /// Reads a raw register.
    pub async fn read_register(&mut self, register: u8) -> Result<u8, Error<ErrorType>> {
        self.regs.read(register).await.map_err(Error::I2c)
    }

    /// Writes a raw register.
    pub async fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), Error<ErrorType>> {
        self.regs.write(register, value).await.map_err(Error::I2c)
    }

    /// Writes the same value to the three registers of a bank.
    async fn write_bank(&mut self, bank: [u8; 3], value: u8) -> Result<(), Error<ErrorType>> {
        for register in bank {
            self.write_register(register, value).await?;
        }
        Ok(())
    }

    /// Sets or clears `mask` in CFG, keeping every other bit.
    async fn update_config(&mut self, mask: u8, enable: bool) -> Result<(), Error<ErrorType>> {
        let cfg = self.read_register(CFG).await?;
        let cfg = if enable { cfg | mask } else { cfg & !mask };
        self.write_register(CFG, cfg).await
    }

    /// Puts every line into a known state.
    ///
    /// All 18 lines become inputs that generate key events and falling-edge
    /// interrupts. Calling it again re-applies the same configuration.
    pub async fn init(&mut self) -> Result<(), Error<ErrorType>> {
        log::debug!("tca8418::init at {:#04x}", self.regs.address());
        self.write_bank(GPIO_DIR, 0x00).await?;
        self.write_bank(GPI_EM, 0xFF).await?;
        self.write_bank(GPIO_INT_LVL, 0x00).await?;
        self.write_bank(GPIO_INT_EN, 0xFF).await?;
        Ok(())
    }

    /// Assigns `rows` x `columns` lines to the keypad matrix.
    ///
    /// Dimensions outside 1-8 rows or 1-10 columns return
    /// [`Error::InvalidGeometry`] without touching the IC.
    pub async fn configure_matrix(&mut self, rows: u8, columns: u8) -> Result<(), Error<ErrorType>> {
        let Some(geometry) = MatrixGeometry::new(rows, columns) else {
            log::warn!("Rejecting keypad matrix of {rows}x{columns}");
            return Err(Error::InvalidGeometry { rows, columns });
        };
        self.apply_geometry(geometry).await
    }

    /// Programs the KP_GPIO registers for an already validated geometry.
    pub async fn apply_geometry(&mut self, geometry: MatrixGeometry) -> Result<(), Error<ErrorType>> {
        log::debug!("tca8418 matrix {}x{}", geometry.rows(), geometry.columns());
        self.write_register(KP_GPIO[0], geometry.row_mask()).await?;
        self.write_register(KP_GPIO[1], geometry.column_mask()).await?;
        if let Some(mask) = geometry.extended_column_mask() {
            self.write_register(KP_GPIO[2], mask).await?;
        }
        Ok(())
    }

    /// Enables or disables the key event interrupt (CFG.KE_IEN).
    pub async fn set_interrupt_enabled(&mut self, enable: bool) -> Result<(), Error<ErrorType>> {
        self.update_config(CFG_KE_IEN, enable).await
    }

    /// Enables or disables the FIFO overflow interrupt together with overflow mode.
    ///
    /// In overflow mode a full FIFO drops its oldest event instead of the newest.
    pub async fn set_overflow_enabled(&mut self, enable: bool) -> Result<(), Error<ErrorType>> {
        self.update_config(CFG_OVR_FLOW_IEN | CFG_OVR_FLOW_M, enable)
            .await
    }

    /// Controls CFG.INT_CFG.
    ///
    /// When set, clearing the key interrupt while events are still queued
    /// releases INT for 50 µs and then asserts it again, which produces a new
    /// falling edge for the remaining events.
    pub async fn set_interrupt_reassert(&mut self, enable: bool) -> Result<(), Error<ErrorType>> {
        self.update_config(CFG_INT_CFG, enable).await
    }

    /// Enables or disables debouncing on every line.
    ///
    /// The DEBOUNCE_DIS registers are inverted: `0x00` keeps debounce on and
    /// `0xFF` turns it off.
    pub async fn set_debounce_enabled(&mut self, enable: bool) -> Result<(), Error<ErrorType>> {
        let value = if enable { 0x00 } else { 0xFF };
        self.write_bank(DEBOUNCE_DIS, value).await
    }

    /// Number of events waiting in the FIFO, 0 to 10.
    pub async fn available_event_count(&mut self) -> Result<u8, Error<ErrorType>> {
        let status = self.read_register(KEY_LCK_EC).await?;
        Ok((status & KEY_LCK_EC_COUNT_MASK).min(FIFO_DEPTH))
    }

    /// Pops the oldest event from the FIFO.
    ///
    /// An empty FIFO reads back as `RawScanCode(0)`.
    pub async fn next_event(&mut self) -> Result<RawScanCode, Error<ErrorType>> {
        self.read_register(KEY_EVENT_A).await.map(RawScanCode)
    }

    /// Discards every queued event and returns how many were dropped.
    ///
    /// Gives up after [`FLUSH_LIMIT`] pops, which covers a full FIFO plus
    /// events queued while flushing.
    pub async fn flush(&mut self) -> Result<u8, Error<ErrorType>> {
        let mut count: u8 = 0;
        while count < FLUSH_LIMIT {
            if self.next_event().await?.is_empty() {
                if count > 0 {
                    log::debug!("tca8418 flushed {count} events");
                }
                return Ok(count);
            }
            count += 1;
        }
        log::warn!("tca8418 FIFO still not empty after {count} pops");
        Ok(count)
    }

    /// Reads the interrupt flags latched in INT_STAT.
    pub async fn interrupt_status(&mut self) -> Result<InterruptStatus, Error<ErrorType>> {
        let status = InterruptStatus::from(self.read_register(INT_STAT).await?);
        if status.overflow() {
            log::error!("Keypad event FIFO overflow");
        }
        Ok(status)
    }

    /// Clears the given INT_STAT flags so INT can be released.
    pub async fn clear_interrupts(&mut self, flags: InterruptStatus) -> Result<(), Error<ErrorType>> {
        self.write_register(INT_STAT, flags.into()).await
    }
}

//! Single-byte register access over I2C.

use embedded_hal_async::i2c::{I2c, SevenBitAddress};

/// Reads and writes one register per I2C transaction.
///
/// A read is a write of the register address followed by a one byte read,
/// a write is a single `[register, value]` write. Failed transactions are
/// returned to the caller as-is, nothing is retried.
pub struct RegisterTransport<
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
> {
    i2c: I2cType,
    address: SevenBitAddress,
}

impl<
        I2cType: I2c<SevenBitAddress, Error = ErrorType>,
        ErrorType: embedded_hal_async::i2c::Error,
    > RegisterTransport<I2cType, ErrorType>
{
    /// Creates a transport talking to the device at `address`.
    pub fn new(i2c: I2cType, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    /// The 7-bit address of the device.
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Reads the value of `register`.
    pub async fn read(&mut self, register: u8) -> Result<u8, ErrorType> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut value)
            .await
            .map_err(|err| {
                log::warn!("Error reading register {register:#04x}: {err:?}");
                err
            })?;
        log::trace!("read register {register:#04x}={:08b}", value[0]);
        Ok(value[0])
    }

    /// Writes `value` to `register`.
    pub async fn write(&mut self, register: u8, value: u8) -> Result<(), ErrorType> {
        log::trace!("write register {register:#04x}={value:08b}");
        self.i2c
            .write(self.address, &[register, value])
            .await
            .map_err(|err| {
                log::warn!("Error writing register {register:#04x}: {err:?}");
                err
            })
    }

    /// Gives the bus handle back.
    pub fn release(self) -> I2cType {
        self.i2c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    const ADDR: u8 = 0x34;

    #[test]
    fn read_writes_the_address_then_reads_one_byte() {
        let expectations = [Transaction::write_read(ADDR, vec![0x03], vec![0x42])];
        let mut i2c = Mock::new(&expectations);
        let mut transport = RegisterTransport::new(i2c.clone(), ADDR);

        assert_eq!(block_on(transport.read(0x03)), Ok(0x42));
        i2c.done();
    }

    #[test]
    fn write_sends_register_and_value_in_one_transaction() {
        let expectations = [Transaction::write(ADDR, vec![0x29, 0xFF])];
        let mut i2c = Mock::new(&expectations);
        let mut transport = RegisterTransport::new(i2c.clone(), ADDR);

        assert_eq!(block_on(transport.write(0x29, 0xFF)), Ok(()));
        i2c.done();
    }

    #[test]
    fn bus_failures_are_returned_to_the_caller() {
        let expectations = [
            Transaction::write_read(ADDR, vec![0x04], vec![0x00]).with_error(ErrorKind::Other),
            Transaction::write(ADDR, vec![0x01, 0x01]).with_error(ErrorKind::ArbitrationLoss),
        ];
        let mut i2c = Mock::new(&expectations);
        let mut transport = RegisterTransport::new(i2c.clone(), ADDR);

        assert_eq!(block_on(transport.read(0x04)), Err(ErrorKind::Other));
        assert_eq!(
            block_on(transport.write(0x01, 0x01)),
            Err(ErrorKind::ArbitrationLoss)
        );
        i2c.done();
    }
}

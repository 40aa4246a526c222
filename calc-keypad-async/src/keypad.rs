//! The deferred keypad service.
//!
//! [`Keypad`] owns the TCA8418 driver and with it the I2C bus. It is woken
//! once per keypad interrupt, pops events from the scanner FIFO, decodes and
//! classifies them and hands the result to the application.

use core::fmt::{self, Debug};

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Sender, signal::Signal};
use embassy_time::{with_timeout, Duration};
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use heapless::Vec;
use tca8418_async::{register::FIFO_DEPTH, InterruptStatus, MatrixGeometry, RawScanCode, Tca8418};

use crate::classify::{classify, KeyDomain};

/// Events handled by one call of [`Keypad::service`].
pub type KeyBatch = Vec<KeyInput, { FIFO_DEPTH as usize }>;

/// How many events a single interrupt drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// Pop exactly one event per interrupt. Remaining events wait for the
    /// next INT edge.
    Single,
    /// Pop events until the FIFO is empty, at most [`FIFO_DEPTH`] per interrupt.
    All,
}

/// Configuration for the keypad service.
#[derive(Debug, Clone)]
pub struct KeypadConfig {
    /// Lines assigned to the key matrix.
    pub geometry: MatrixGeometry,
    /// IC debouncing on all lines.
    pub debounce: bool,
    /// FIFO overflow interrupt and overflow mode.
    pub overflow_interrupt: bool,
    /// Re-assert INT after it is cleared while events are still queued.
    pub interrupt_reassert: bool,
    /// Events drained per interrupt.
    pub drain_mode: DrainMode,
    /// Upper bound for servicing one interrupt, in milliseconds.
    pub bus_timeout_ms: u64,
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            geometry: MatrixGeometry::FULL,
            debounce: true,
            overflow_interrupt: false,
            interrupt_reassert: true,
            drain_mode: DrainMode::All,
            bus_timeout_ms: 50,
        }
    }
}

/// A key input as seen by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A key went down.
    Pressed(KeyDomain),
    /// A key went up. Releases are not classified and carry no position.
    Released,
}

/// Errors raised while talking to the keypad.
#[derive(PartialEq, Eq)]
pub enum Error<TI2CERR> {
    /// The scanner driver failed.
    Device(tca8418_async::Error<TI2CERR>),
    /// Servicing the scanner took longer than [`KeypadConfig::bus_timeout_ms`].
    Timeout,
}

impl<TI2CERR: Debug> Debug for Error<TI2CERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(err) => write!(f, "Device({err:?})"),
            Self::Timeout => write!(f, "Timeout"),
        }
    }
}

impl<TI2CERR> From<tca8418_async::Error<TI2CERR>> for Error<TI2CERR> {
    fn from(err: tca8418_async::Error<TI2CERR>) -> Self {
        Error::Device(err)
    }
}

/// Decodes and classifies one scan code, logging the result.
pub fn interpret(raw: RawScanCode) -> KeyInput {
    let event = raw.decode();
    if !event.pressed {
        log::debug!("Key released");
        return KeyInput::Released;
    }

    let domain = classify(&event);
    match domain {
        KeyDomain::MatrixKey { row, col } => log::info!("Matrix key ({row},{col}) pressed"),
        KeyDomain::AuxButton { row, col } => log::info!("Bit button ({row},{col}) pressed"),
        KeyDomain::Invalid { row, col } => log::warn!("Invalid keypress ({row},{col})"),
    }
    KeyInput::Pressed(domain)
}

/// Pushes a batch into the application queue.
///
/// Inputs that do not fit are dropped and counted.
pub fn forward<M: RawMutex, const N: usize>(
    batch: KeyBatch,
    queue: &Sender<'_, M, KeyInput, N>,
) -> usize {
    let mut dropped = 0;
    for input in batch {
        if queue.try_send(input).is_err() {
            log::warn!("Key input queue full, dropping {input:?}");
            dropped += 1;
        }
    }
    dropped
}

/// Keypad service on top of the TCA8418 driver.
pub struct Keypad<
    I2cType: I2c<SevenBitAddress, Error = ErrorType>,
    ErrorType: embedded_hal_async::i2c::Error,
> {
    driver: Tca8418<I2cType, ErrorType>,
    config: KeypadConfig,
}

impl<
        I2cType: I2c<SevenBitAddress, Error = ErrorType>,
        ErrorType: embedded_hal_async::i2c::Error,
    > Keypad<I2cType, ErrorType>
{
    /// Creates a new `Keypad`.
    ///
    /// # Arguments
    ///
    /// * `driver` - The scanner driver. The service becomes the only user of its bus.
    /// * `config` - Keypad configuration.
    pub fn new(driver: Tca8418<I2cType, ErrorType>, config: KeypadConfig) -> Self {
        Self { driver, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &KeypadConfig {
        &self.config
    }

    /// Direct access to the scanner driver.
    pub fn driver(&mut self) -> &mut Tca8418<I2cType, ErrorType> {
        &mut self.driver
    }

    /// Configures the scanner and arms its key interrupt.
    ///
    /// Events queued before this call are discarded.
    pub async fn init(&mut self) -> Result<(), Error<ErrorType>> {
        self.driver.init().await?;
        self.driver.apply_geometry(self.config.geometry).await?;
        self.driver
            .set_debounce_enabled(self.config.debounce)
            .await?;
        self.driver
            .set_overflow_enabled(self.config.overflow_interrupt)
            .await?;
        self.driver
            .set_interrupt_reassert(self.config.interrupt_reassert)
            .await?;
        let stale = self.driver.flush().await?;
        if stale > 0 {
            log::debug!("Discarded {stale} stale key events");
        }
        self.driver.clear_interrupts(InterruptStatus::ALL).await?;
        self.driver.set_interrupt_enabled(true).await?;
        log::info!("Keypad initialized.");
        Ok(())
    }

    /// Handles one keypad interrupt, appending the inputs to `batch`.
    ///
    /// Pops one event, or every queued event up to the FIFO depth, depending
    /// on [`DrainMode`], then acknowledges the key interrupt on the IC. INT
    /// stays low until the acknowledge, so it is sent even when a pop fails.
    /// Inputs popped before a failure stay in `batch`.
    pub async fn service(&mut self, batch: &mut KeyBatch) -> Result<(), Error<ErrorType>> {
        let drained = self.drain(batch).await;
        let acked = self.acknowledge().await;
        drained.and(acked)
    }

    async fn drain(&mut self, batch: &mut KeyBatch) -> Result<(), Error<ErrorType>> {
        let limit = match self.config.drain_mode {
            DrainMode::Single => 1,
            DrainMode::All => FIFO_DEPTH,
        };

        for popped in 0..limit {
            if batch.is_full() {
                break;
            }
            let raw = self.driver.next_event().await?;
            if raw.is_empty() {
                if popped == 0 {
                    log::debug!("Keypad interrupt without a queued event");
                }
                break;
            }
            log::trace!("key event {:08b}", raw.0);
            // Cannot fail, the batch was checked for room above.
            let _ = batch.push(interpret(raw));
        }
        Ok(())
    }

    async fn acknowledge(&mut self) -> Result<(), Error<ErrorType>> {
        self.driver
            .clear_interrupts(InterruptStatus::KEY_EVENT)
            .await
            .map_err(Error::from)
    }

    /// [`Keypad::service`] bounded by the configured bus timeout.
    ///
    /// Inputs popped before the timeout stay in `batch`.
    pub async fn service_with_timeout(
        &mut self,
        batch: &mut KeyBatch,
    ) -> Result<(), Error<ErrorType>> {
        let timeout = Duration::from_millis(self.config.bus_timeout_ms);
        with_timeout(timeout, self.service(batch))
            .await
            .map_err(|_| Error::Timeout)?
    }

    /// Services the keypad every time `interrupt` is signalled.
    ///
    /// Inputs are forwarded even when servicing fails. After a failure the
    /// key interrupt is cleared once more so INT can fall again on the next
    /// event.
    pub async fn run<M: RawMutex, const N: usize>(
        &mut self,
        interrupt: &Signal<M, ()>,
        queue: Sender<'_, M, KeyInput, N>,
    ) -> ! {
        loop {
            interrupt.wait().await;
            let mut batch = KeyBatch::new();
            let result = self.service_with_timeout(&mut batch).await;
            forward(batch, &queue);
            if let Err(err) = result {
                log::warn!("Error servicing keypad: {err:?}");
                self.recover().await;
            }
        }
    }

    async fn recover(&mut self) {
        let timeout = Duration::from_millis(self.config.bus_timeout_ms);
        match with_timeout(timeout, self.acknowledge()).await {
            Ok(Ok(())) => log::debug!("Keypad interrupt cleared after failure"),
            Ok(Err(err)) => log::error!("Could not clear keypad interrupt: {err:?}"),
            Err(_) => log::error!("Could not clear keypad interrupt: Timeout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{dispatch, InterruptLine, SignalHandler};
    use embassy_futures::block_on;
    use embassy_futures::select::{select, Either};
    use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
    use embedded_hal_async::i2c::{ErrorKind, Operation};
    use std::collections::VecDeque;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};

    const ADDR: u8 = 0x34;

    fn write(register: u8, value: u8) -> Transaction {
        Transaction::write(ADDR, vec![register, value])
    }

    fn read(register: u8, value: u8) -> Transaction {
        Transaction::write_read(ADDR, vec![register], vec![value])
    }

    fn pop(raw: u8) -> Transaction {
        read(0x04, raw)
    }

    fn ack() -> Transaction {
        write(0x02, 0x01)
    }

    fn keypad(i2c: &Mock, drain_mode: DrainMode) -> Keypad<Mock, ErrorKind> {
        let config = KeypadConfig {
            drain_mode,
            ..KeypadConfig::default()
        };
        Keypad::new(Tca8418::new(i2c.clone()), config)
    }

    fn serviced(keypad: &mut Keypad<Mock, ErrorKind>) -> KeyBatch {
        let mut batch = KeyBatch::new();
        block_on(keypad.service(&mut batch)).unwrap();
        batch
    }

    /// A bus that answers reads from a script and then never completes.
    struct StallingBus {
        replies: VecDeque<u8>,
    }

    impl StallingBus {
        fn new(replies: &[u8]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
            }
        }
    }

    impl embedded_hal_async::i2c::ErrorType for StallingBus {
        type Error = ErrorKind;
    }

    impl I2c<SevenBitAddress> for StallingBus {
        async fn transaction(
            &mut self,
            _address: SevenBitAddress,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            let Some(reply) = self.replies.pop_front() else {
                return core::future::pending().await;
            };
            for operation in operations {
                if let Operation::Read(buffer) = operation {
                    buffer.fill(reply);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn init_configures_and_arms_the_scanner() {
        let mut expectations = vec![];
        for register in [0x23, 0x24, 0x25] {
            expectations.push(write(register, 0x00));
        }
        for register in [0x20, 0x21, 0x22] {
            expectations.push(write(register, 0xFF));
        }
        for register in [0x26, 0x27, 0x28] {
            expectations.push(write(register, 0x00));
        }
        for register in [0x1A, 0x1B, 0x1C] {
            expectations.push(write(register, 0xFF));
        }
        expectations.extend([
            // 8x10 matrix
            write(0x1D, 0xFF),
            write(0x1E, 0xFF),
            write(0x1F, 0x03),
            // debounce on
            write(0x29, 0x00),
            write(0x2A, 0x00),
            write(0x2B, 0x00),
            // overflow off
            read(0x01, 0x00),
            write(0x01, 0x00),
            // INT re-assert on
            read(0x01, 0x00),
            write(0x01, 0x10),
            // flush one stale event
            pop(0x81),
            pop(0x00),
            write(0x02, 0x1F),
            // key event interrupt on
            read(0x01, 0x10),
            write(0x01, 0x11),
        ]);
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        assert_eq!(block_on(keypad.init()), Ok(()));
        i2c.done();
    }

    #[test]
    fn press_is_decoded_and_classified() {
        let expectations = [pop(0x83), pop(0x00), ack()];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        let batch = serviced(&mut keypad);
        assert_eq!(
            batch.as_slice(),
            &[KeyInput::Pressed(KeyDomain::MatrixKey { row: 0, col: 3 })]
        );
        i2c.done();
    }

    #[test]
    fn release_carries_no_position() {
        let expectations = [pop(0x03), pop(0x00), ack()];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        let batch = serviced(&mut keypad);
        assert_eq!(batch.as_slice(), &[KeyInput::Released]);
        i2c.done();
    }

    #[test]
    fn drain_all_empties_the_fifo_in_order() {
        // bit button (1,6) down, invalid (6,4) down, matrix key (0,3) up
        let expectations = [pop(0x80 | 16), pop(0x80 | 64), pop(0x03), pop(0x00), ack()];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        let batch = serviced(&mut keypad);
        assert_eq!(
            batch.as_slice(),
            &[
                KeyInput::Pressed(KeyDomain::AuxButton { row: 1, col: 6 }),
                KeyInput::Pressed(KeyDomain::Invalid { row: 6, col: 4 }),
                KeyInput::Released,
            ]
        );
        i2c.done();
    }

    #[test]
    fn drain_all_stops_at_the_fifo_depth() {
        let mut expectations: std::vec::Vec<Transaction> = (0..10).map(|_| pop(0x81)).collect();
        expectations.push(ack());
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        let batch = serviced(&mut keypad);
        assert_eq!(batch.len(), 10);
        i2c.done();
    }

    #[test]
    fn single_mode_pops_one_event_per_interrupt() {
        let expectations = [pop(0x81), ack(), pop(0x82), ack()];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::Single);

        let first = serviced(&mut keypad);
        assert_eq!(
            first.as_slice(),
            &[KeyInput::Pressed(KeyDomain::MatrixKey { row: 0, col: 1 })]
        );
        let second = serviced(&mut keypad);
        assert_eq!(
            second.as_slice(),
            &[KeyInput::Pressed(KeyDomain::MatrixKey { row: 0, col: 2 })]
        );
        i2c.done();
    }

    #[test]
    fn spurious_interrupt_yields_an_empty_batch() {
        let expectations = [pop(0x00), ack()];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        assert!(serviced(&mut keypad).is_empty());
        i2c.done();
    }

    #[test]
    fn failed_pop_still_acknowledges_and_keeps_earlier_inputs() {
        let expectations = [pop(0x83), pop(0x00).with_error(ErrorKind::Other), ack()];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        let mut batch = KeyBatch::new();
        assert_eq!(
            block_on(keypad.service(&mut batch)),
            Err(Error::Device(tca8418_async::Error::I2c(ErrorKind::Other)))
        );
        assert_eq!(
            batch.as_slice(),
            &[KeyInput::Pressed(KeyDomain::MatrixKey { row: 0, col: 3 })]
        );
        i2c.done();
    }

    #[test]
    fn failed_acknowledge_is_reported() {
        let expectations = [pop(0x81), pop(0x00), ack().with_error(ErrorKind::Other)];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        let mut batch = KeyBatch::new();
        assert_eq!(
            block_on(keypad.service(&mut batch)),
            Err(Error::Device(tca8418_async::Error::I2c(ErrorKind::Other)))
        );
        assert_eq!(batch.len(), 1);
        i2c.done();
    }

    #[test]
    fn stalled_bus_times_out_and_keeps_popped_inputs() {
        let config = KeypadConfig {
            bus_timeout_ms: 5,
            ..KeypadConfig::default()
        };
        let mut keypad = Keypad::new(Tca8418::new(StallingBus::new(&[0x83])), config);

        let mut batch = KeyBatch::new();
        assert_eq!(
            block_on(keypad.service_with_timeout(&mut batch)),
            Err(Error::Timeout)
        );
        assert_eq!(
            batch.as_slice(),
            &[KeyInput::Pressed(KeyDomain::MatrixKey { row: 0, col: 3 })]
        );
    }

    #[test]
    fn service_within_the_timeout_succeeds() {
        let expectations = [pop(0x81), pop(0x00), ack()];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        let mut batch = KeyBatch::new();
        assert_eq!(block_on(keypad.service_with_timeout(&mut batch)), Ok(()));
        assert_eq!(batch.len(), 1);
        i2c.done();
    }

    #[test]
    fn run_forwards_inputs_and_recovers_after_a_failure() {
        let interrupt = Signal::<NoopRawMutex, ()>::new();
        let channel = Channel::<NoopRawMutex, KeyInput, 4>::new();

        let expectations = [
            // first interrupt: one press, then the bus fails
            pop(0x83),
            pop(0x00).with_error(ErrorKind::Other),
            ack(),
            // cleared again after the failure
            ack(),
            // second interrupt is serviced normally
            pop(0x82),
            pop(0x00),
            ack(),
        ];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        interrupt.signal(());
        let received = block_on(async {
            match select(keypad.run(&interrupt, channel.sender()), async {
                let first = channel.receive().await;
                interrupt.signal(());
                let second = channel.receive().await;
                (first, second)
            })
            .await
            {
                Either::First(never) => match never {},
                Either::Second(received) => received,
            }
        });

        assert_eq!(
            received,
            (
                KeyInput::Pressed(KeyDomain::MatrixKey { row: 0, col: 3 }),
                KeyInput::Pressed(KeyDomain::MatrixKey { row: 0, col: 2 }),
            )
        );
        i2c.done();
    }

    #[test]
    fn forward_drops_what_does_not_fit() {
        let channel = Channel::<NoopRawMutex, KeyInput, 2>::new();
        let mut batch = KeyBatch::new();
        for _ in 0..3 {
            batch.push(KeyInput::Released).unwrap();
        }

        assert_eq!(forward(batch, &channel.sender()), 1);
        assert_eq!(channel.try_receive(), Ok(KeyInput::Released));
        assert_eq!(channel.try_receive(), Ok(KeyInput::Released));
        assert!(channel.try_receive().is_err());
    }

    #[test]
    fn keypad_interrupt_end_to_end() {
        let keypad_signal = Signal::<NoopRawMutex, ()>::new();
        let power_signal = Signal::<NoopRawMutex, ()>::new();
        let mut handler = SignalHandler::new(&keypad_signal, &power_signal);

        let expectations = [pop(0x83), pop(0x00), ack()];
        let mut i2c = Mock::new(&expectations);
        let mut keypad = keypad(&i2c, DrainMode::All);

        dispatch(InterruptLine::Keypad, &mut handler);
        assert!(keypad_signal.signaled());
        assert!(!power_signal.signaled());

        let mut batch = KeyBatch::new();
        block_on(async {
            keypad_signal.wait().await;
            keypad.service(&mut batch).await
        })
        .unwrap();
        assert_eq!(
            batch.as_slice(),
            &[KeyInput::Pressed(KeyDomain::MatrixKey { row: 0, col: 3 })]
        );
        i2c.done();
    }

    #[test]
    fn power_button_never_reaches_the_bus() {
        let keypad_signal = Signal::<NoopRawMutex, ()>::new();
        let power_signal = Signal::<NoopRawMutex, ()>::new();
        let mut handler = SignalHandler::new(&keypad_signal, &power_signal);

        let expectations: [Transaction; 0] = [];
        let mut i2c = Mock::new(&expectations);
        let _keypad = keypad(&i2c, DrainMode::All);

        dispatch(InterruptLine::PowerButton, &mut handler);
        assert!(power_signal.signaled());
        assert!(!keypad_signal.signaled());
        i2c.done();
    }
}

//! Routing of the board's two interrupt lines.
//!
//! The keypad scanner's INT output and the power button both signal on a
//! falling edge. A [`Dispatcher`] owns both inputs, so the line that fired is
//! known from which wait completed and never has to be looked up at runtime.

use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
use embassy_time::{Duration, Timer};
use embedded_hal::digital::Error as _;
use embedded_hal_async::digital::Wait;

/// The logical source of an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptLine {
    /// INT of the TCA8418 went low: key events are queued.
    Keypad,
    /// The power button was pressed.
    PowerButton,
}

/// Reacts to a dispatched interrupt.
///
/// Handlers run in the dispatch loop and must return quickly. Bus traffic
/// belongs in a deferred task woken by the handler.
pub trait InterruptHandler {
    /// Called once per falling edge on the keypad line.
    fn on_keypad(&mut self);

    /// Called once per falling edge on the power button line.
    fn on_power_button(&mut self);
}

/// Calls the handler method for `line`.
pub fn dispatch<H: InterruptHandler>(line: InterruptLine, handler: &mut H) {
    log::trace!("dispatch {line:?}");
    match line {
        InterruptLine::Keypad => handler.on_keypad(),
        InterruptLine::PowerButton => handler.on_power_button(),
    }
}

/// Pause after a failed wait before the line is awaited again.
const ERROR_BACKOFF_MS: u64 = 10;

/// Waits for edges on the keypad and power button lines.
///
/// Each line keeps its own wait armed for as long as the dispatcher runs.
/// An edge that only fires while its wait is armed is therefore never lost
/// to an edge on the other line.
pub struct Dispatcher<KeypadInt, PowerButton> {
    keypad_int: KeypadInt,
    power_button: PowerButton,
}

impl<KeypadInt: Wait, PowerButton: Wait> Dispatcher<KeypadInt, PowerButton> {
    /// Creates a new `Dispatcher`.
    ///
    /// # Arguments
    ///
    /// * `keypad_int` - The INT input from the keypad scanner.
    /// * `power_button` - The power button input, pulled up.
    pub fn new(keypad_int: KeypadInt, power_button: PowerButton) -> Self {
        Self {
            keypad_int,
            power_button,
        }
    }

    /// Dispatches every falling edge on either line to `handler`, forever.
    pub async fn run<H: InterruptHandler>(&mut self, handler: &mut H) -> ! {
        let handler = RefCell::new(handler);
        let keypad = watch(&mut self.keypad_int, InterruptLine::Keypad, &handler);
        let power = watch(&mut self.power_button, InterruptLine::PowerButton, &handler);
        match select(keypad, power).await {
            Either::First(never) | Either::Second(never) => never,
        }
    }

    /// Gives the input lines back.
    pub fn release(self) -> (KeypadInt, PowerButton) {
        (self.keypad_int, self.power_button)
    }
}

/// Dispatches each falling edge on `pin` as `line`.
///
/// The handler is only borrowed while it runs, never across an await.
async fn watch<P: Wait, H: InterruptHandler>(
    pin: &mut P,
    line: InterruptLine,
    handler: &RefCell<&mut H>,
) -> ! {
    loop {
        match pin.wait_for_falling_edge().await {
            Ok(()) => dispatch(line, &mut **handler.borrow_mut()),
            Err(err) => {
                log::warn!("Error waiting for {line:?} interrupt: {:?}", err.kind());
                Timer::after(Duration::from_millis(ERROR_BACKOFF_MS)).await;
            }
        }
    }
}

/// Hands interrupts over to deferred tasks through [`Signal`]s.
///
/// The keypad signal wakes the task that drains the scanner FIFO over I2C.
/// The power signal wakes whoever handles the power button.
pub struct SignalHandler<'a, M: RawMutex> {
    keypad: &'a Signal<M, ()>,
    power: &'a Signal<M, ()>,
}

impl<'a, M: RawMutex> SignalHandler<'a, M> {
    /// Creates a handler signalling `keypad` and `power`.
    pub fn new(keypad: &'a Signal<M, ()>, power: &'a Signal<M, ()>) -> Self {
        Self { keypad, power }
    }
}

impl<M: RawMutex> InterruptHandler for SignalHandler<'_, M> {
    fn on_keypad(&mut self) {
        self.keypad.signal(());
    }

    fn on_power_button(&mut self) {
        log::info!("Power button pressed");
        self.power.signal(());
    }
}

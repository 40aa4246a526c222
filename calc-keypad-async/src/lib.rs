//! Keypad input pipeline for the programmer calculator.
//!
//! The calculator's keys are scanned by a TCA8418. Its INT line and the power
//! button share one dispatch loop; keypad interrupts are handed to a deferred
//! task that owns the I2C bus, drains the scanner FIFO and publishes
//! [`KeyInput`]s for the application.
//!
//! # Usage
//!
//! ```ignore
//! use calc_keypad_async::{Dispatcher, Keypad, KeypadConfig, SignalHandler};
//! use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal};
//! use tca8418_async::Tca8418;
//!
//! static KEYPAD_IRQ: Signal<CriticalSectionRawMutex, ()> = Signal::new();
//! static POWER_IRQ: Signal<CriticalSectionRawMutex, ()> = Signal::new();
//! static KEYS: Channel<CriticalSectionRawMutex, KeyInput, 16> = Channel::new();
//!
//! #[embassy_executor::task]
//! async fn interrupts(mut dispatcher: Dispatcher<Input<'static>, Input<'static>>) {
//!     dispatcher.run(&mut SignalHandler::new(&KEYPAD_IRQ, &POWER_IRQ)).await
//! }
//!
//! #[embassy_executor::task]
//! async fn keypad(mut keypad: Keypad<I2c<'static, Async>, esp_hal::i2c::master::Error>) {
//!     keypad.run(&KEYPAD_IRQ, KEYS.sender()).await
//! }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod classify;
pub mod dispatch;
pub mod keypad;

pub use classify::{classify, KeyDomain};
pub use dispatch::{dispatch, Dispatcher, InterruptHandler, InterruptLine, SignalHandler};
pub use keypad::{forward, interpret, DrainMode, Error, KeyBatch, KeyInput, Keypad, KeypadConfig};

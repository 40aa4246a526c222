//! An asynchronous, `no_std` driver for the TI TCA8418 keypad scan IC.
//!
//! The TCA8418 scans a matrix of up to 8 rows and 10 columns, debounces the
//! keys and queues up to 10 press/release events in an internal FIFO. It
//! pulls its INT line low while events are pending.
//!
//! This crate provides a `Tca8418` driver built on `embedded-hal-async` I2C,
//! a decoder for the scan codes it produces and the register map.
//!
//! # Usage
//!
//! ```ignore
//! # #![no_std]
//! # #![no_main]
//! # use esp_hal::i2c::master::I2c;
//! # use esp_hal::time::Rate;
//! use tca8418_async::Tca8418;
//!
//! # async fn example(peripherals: esp_hal::peripherals::Peripherals) {
//! let config = esp_hal::i2c::master::Config::default().with_frequency(Rate::from_khz(400));
//! let i2c = I2c::new(peripherals.I2C0, config)
//!     .unwrap()
//!     .with_sda(peripherals.GPIO13)
//!     .with_scl(peripherals.GPIO14)
//!     .into_async();
//!
//! let mut keypad = Tca8418::new(i2c);
//! keypad.init().await.unwrap();
//! keypad.configure_matrix(8, 10).await.unwrap();
//! keypad.set_interrupt_enabled(true).await.unwrap();
//!
//! let raw = keypad.next_event().await.unwrap();
//! if !raw.is_empty() {
//!     let event = raw.decode();
//!     log::info!("key ({}, {}) pressed: {}", event.row, event.col, event.pressed);
//! }
//! # }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod event;
pub mod matrix;
pub mod register;
pub mod transport;

mod device;
mod err;

pub use device::*;
pub use err::Error;
pub use event::{decode, KeyEvent, RawScanCode};
pub use matrix::MatrixGeometry;
pub use register::InterruptStatus;

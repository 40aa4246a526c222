//! Status display for the programmer calculator.
//!
//! `CalculatorDisplay` owns any monochrome `embedded-graphics` draw target
//! (the SSD1322 OLED on the board, a `MockDisplay` in tests) and renders a
//! message line and the last key input onto it. Pushing the frame buffer to
//! the panel is left to the target's own driver.

#![cfg_attr(not(test), no_std)]

use core::fmt::Write;

use calc_keypad_async::{KeyDomain, KeyInput};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use heapless::String;

/// Height of one text line in pixels.
const LINE_HEIGHT: u32 = 10;
/// Left margin of every line.
const MARGIN_X: i32 = 10;
/// Top of the message line.
const MESSAGE_TOP: i32 = 1;
/// Top of the key line.
const KEY_TOP: i32 = MESSAGE_TOP + LINE_HEIGHT as i32 + 1;

/// Text shown for a key input.
pub fn key_label(input: &KeyInput) -> String<32> {
    let mut label = String::new();
    // 32 bytes fit the longest label.
    let _ = match input {
        KeyInput::Pressed(KeyDomain::MatrixKey { row, col }) => write!(label, "Key {row},{col}"),
        KeyInput::Pressed(KeyDomain::AuxButton { row, col }) => write!(label, "Bit {row},{col}"),
        KeyInput::Pressed(KeyDomain::Invalid { row, col }) => write!(label, "Invalid {row},{col}"),
        KeyInput::Released => write!(label, "-"),
    };
    label
}

/// The calculator's display, drawn through an owned target.
pub struct CalculatorDisplay<D> {
    target: D,
}

impl<D: DrawTarget<Color = BinaryColor>> CalculatorDisplay<D> {
    /// Creates a new `CalculatorDisplay` drawing into `target`.
    pub fn new(target: D) -> Self {
        Self { target }
    }

    /// Mutable access to the draw target, e.g. to flush it.
    pub fn target(&mut self) -> &mut D {
        &mut self.target
    }

    /// Gives the draw target back.
    pub fn release(self) -> D {
        self.target
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) -> Result<(), D::Error> {
        self.target.clear(BinaryColor::Off)
    }

    /// Replaces the message line.
    pub fn draw_message(&mut self, message: &str) -> Result<(), D::Error> {
        self.draw_line(MESSAGE_TOP, message)
    }

    /// Replaces the key line with the label of `input`.
    pub fn draw_key(&mut self, input: &KeyInput) -> Result<(), D::Error> {
        self.draw_line(KEY_TOP, &key_label(input))
    }

    fn draw_line(&mut self, top: i32, text: &str) -> Result<(), D::Error> {
        let width = self.target.bounding_box().size.width;
        Rectangle::new(Point::new(0, top), Size::new(width, LINE_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(&mut self.target)?;

        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_baseline(text, Point::new(MARGIN_X, top), style, Baseline::Top)
            .draw(&mut self.target)?;
        Ok(())
    }
}

//! `embedded-hal` pin banks behind the input and output ports.
//!
//! Boards without a word-wide port expose the buttons and LEDs as individual
//! pins; these adapters pack them into the bit-mask view the controller
//! uses. Bit `i` of the mask is pin `i` of the bank.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use log::warn;

use crate::app::ports::{InputPort, OutputPort};

/// Input pins read as one mask.
pub struct InputBank<P, const N: usize> {
    pins: [P; N],
}

impl<P: InputPin, const N: usize> InputBank<P, N> {
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }
}

impl<P: InputPin, const N: usize> InputPort for InputBank<P, N> {
    fn read_input(&mut self) -> u32 {
        let mut value = 0u32;
        for (i, pin) in self.pins.iter_mut().enumerate().take(32) {
            // Buttons are pulled up: an unreadable pin counts as released.
            let high = pin.is_high().unwrap_or_else(|e| {
                warn!("gpio: input pin {} read failed: {:?}", i, e);
                true
            });
            if high {
                value |= 1 << i;
            }
        }
        value
    }
}

/// Output pins written from one mask.
pub struct OutputBank<P, const N: usize> {
    pins: [P; N],
}

impl<P: OutputPin, const N: usize> OutputBank<P, N> {
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }
}

impl<P: OutputPin, const N: usize> OutputPort for OutputBank<P, N> {
    fn write_output(&mut self, mask: u32) {
        for (i, pin) in self.pins.iter_mut().enumerate().take(32) {
            let state = PinState::from((mask >> i) & 0x01 != 0);
            if let Err(e) = pin.set_state(state) {
                warn!("gpio: output pin {} write failed: {:?}", i, e);
            }
        }
    }
}

//! Active-low button decoder for the input port.
//!
//! ## Hardware
//!
//! Momentary switches with pull-ups on individual input-port bits; a
//! pressed button reads 0. The port is edge-triggered on "value differs
//! from the armed baseline", so the decoder only runs when at least one bit
//! changed.
//!
//! ## Event codes
//!
//! | Button | Bit | Code   |
//! |--------|-----|--------|
//! | A      | 0   | `0x01` |
//! | B      | 1   | `0x02` |
//!
//! Every edge emits the code of each button that is down at that moment,
//! so pressing B while A is held emits both codes.

use heapless::Vec;

use crate::config::{ButtonMap, MAX_BUTTONS};

/// Decodes port values into outbound event codes.
#[derive(Debug, Clone)]
pub struct ButtonDecoder {
    buttons: Vec<ButtonMap, MAX_BUTTONS>,
    baseline: u32,
}

impl ButtonDecoder {
    pub fn new(buttons: &[ButtonMap], baseline: u32) -> Self {
        let mut map = Vec::new();
        for b in buttons.iter().take(MAX_BUTTONS) {
            let _ = map.push(*b);
        }
        Self {
            buttons: map,
            baseline,
        }
    }

    /// Value the edge trigger is armed against.
    pub fn baseline(&self) -> u32 {
        self.baseline
    }

    /// Feed a freshly read port value.
    ///
    /// Returns `None` when `value` equals the baseline (no edge). Otherwise
    /// adopts `value` as the new baseline and returns the codes of every
    /// pressed button, in configuration order.
    pub fn on_edge(&mut self, value: u32) -> Option<Vec<u8, MAX_BUTTONS>> {
        if value == self.baseline {
            return None;
        }
        self.baseline = value;

        let mut codes = Vec::new();
        for b in &self.buttons {
            if (value >> b.bit) & 0x01 == 0 {
                let _ = codes.push(b.code);
            }
        }
        Some(codes)
    }

    /// Bits of `value` whose level differs from the baseline.
    pub fn changed_bits(&self, value: u32) -> u32 {
        value ^ self.baseline
    }
}

//! Remote dimmer — the other tile's side of the button/duty exchange.
//!
//! Receives the one-byte button codes the controller emits and answers with
//! a new PWM duty. Button A brightens, button B dims; the level saturates at
//! both ends of the PWM range.

use log::debug;

/// Code sent while button A is down.
pub const CODE_UP: u8 = 0x01;
/// Code sent while button B is down.
pub const CODE_DOWN: u8 = 0x02;

pub struct Dimmer {
    level: u8,
    max: u8,
    step: u8,
}

impl Dimmer {
    /// `total_quanta` is the controller's period length; the level stays
    /// strictly below it so the output always has an off quantum.
    pub fn new(total_quanta: u16, initial: u8, step: u8) -> Self {
        let max = total_quanta.saturating_sub(1).min(u16::from(u8::MAX)) as u8;
        Self {
            level: initial.min(max),
            max,
            step: step.max(1),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Apply one event code. Returns the new duty if the level moved.
    pub fn on_code(&mut self, code: u8) -> Option<u8> {
        let next = match code {
            CODE_UP => self.level.saturating_add(self.step).min(self.max),
            CODE_DOWN => self.level.saturating_sub(self.step),
            other => {
                debug!("dimmer: ignoring code 0x{:02x}", other);
                return None;
            }
        };
        if next == self.level {
            return None;
        }
        self.level = next;
        Some(next)
    }
}

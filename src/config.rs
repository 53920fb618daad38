//! Controller configuration.
//!
//! All tunable parameters of the GPIO/PWM controller. Defaults reproduce the
//! reference explorer board: a 100 MHz reference timer, 128 PWM quanta of
//! 125 µs each and a 0.5 s heartbeat half-period.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of buttons decoded from the input port.
pub const MAX_BUTTONS: usize = 8;

/// What a producer does when it finds a bounded queue full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Stop hard: the push returns [`Error::ChannelFull`] and the consumer
    /// loop treats it as fatal.
    Halt,
    /// Drop the message, log it and keep running (at-most-once delivery).
    DropAndLog,
}

/// One active-low button on the input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMap {
    /// Bit position on the input port.
    pub bit: u8,
    /// Event code sent on the outbound channel while the button is down.
    pub code: u8,
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Timebase ---
    /// Reference timer frequency in ticks per second.
    pub tick_rate_hz: u32,

    // --- Heartbeat ---
    /// Ticks between heartbeat toggles.
    pub heartbeat_ticks: u32,
    /// Output bits owned by the heartbeat handler.
    pub heartbeat_mask: u32,

    // --- PWM ---
    /// Ticks per PWM quantum.
    pub quanta_ticks: u32,
    /// Quanta per PWM period.
    pub total_quanta: u16,
    /// Output bits owned by the PWM handler.
    pub pwm_mask: u32,
    /// Duty in force before the first inbound byte.
    pub initial_duty: u8,

    // --- Input ---
    /// Buttons decoded on every input edge.
    pub buttons: Vec<ButtonMap, MAX_BUTTONS>,

    // --- Queues ---
    /// Policy for producer-side overflow of bounded queues.
    pub overflow_policy: OverflowPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let mut buttons = Vec::new();
        // Capacity is MAX_BUTTONS, two entries always fit.
        let _ = buttons.push(ButtonMap { bit: 0, code: 0x01 });
        let _ = buttons.push(ButtonMap { bit: 1, code: 0x02 });

        Self {
            tick_rate_hz: 100_000_000,

            heartbeat_ticks: 50_000_000, // 0.5 s
            heartbeat_mask: 0x08,

            quanta_ticks: 12_500, // 125 us
            total_quanta: 128,    // 16 ms period, 62.5 Hz
            pwm_mask: 0x07,
            initial_duty: 0,

            buttons,

            overflow_policy: OverflowPolicy::Halt,
        }
    }
}

impl ControllerConfig {
    /// Reject values that would break the dispatch loop invariants.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate_hz == 0 {
            return Err(Error::Config("tick_rate_hz must be non-zero"));
        }
        if self.heartbeat_ticks == 0 || self.quanta_ticks == 0 {
            return Err(Error::Config("timer periods must be non-zero"));
        }
        // Re-arm arithmetic relies on deadlines staying within half the counter.
        if self.heartbeat_ticks > i32::MAX as u32 || self.quanta_ticks > i32::MAX as u32 {
            return Err(Error::Config("timer period exceeds half the counter range"));
        }
        if self.total_quanta == 0 || self.total_quanta > 256 {
            return Err(Error::Config("total_quanta must be in 1..=256"));
        }
        if self.pwm_mask == 0 || self.heartbeat_mask == 0 {
            return Err(Error::Config("output masks must be non-zero"));
        }
        if self.pwm_mask & self.heartbeat_mask != 0 {
            return Err(Error::Config("pwm_mask and heartbeat_mask overlap"));
        }
        let mut seen = 0u32;
        for b in &self.buttons {
            if b.bit >= 32 {
                return Err(Error::Config("button bit out of range"));
            }
            if seen & (1 << b.bit) != 0 {
                return Err(Error::Config("duplicate button bit"));
            }
            seen |= 1 << b.bit;
        }
        Ok(())
    }

    /// Length of one PWM period in ticks.
    pub fn pwm_period_ticks(&self) -> u64 {
        u64::from(self.quanta_ticks) * u64::from(self.total_quanta)
    }

    /// Convert milliseconds to reference-timer ticks, saturating.
    pub fn ms_to_ticks(&self, ms: u32) -> u32 {
        let ticks = u64::from(ms) * u64::from(self.tick_rate_hz) / 1000;
        ticks.min(u64::from(u32::MAX)) as u32
    }
}

//! Ready events returned by the multi-source wait primitive.
//!
//! The wait primitive resolves exactly one ready source per call and
//! reports it as a [`Ready`] value; the dispatch loop matches on it.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Input port  │────▶│              │     │              │
//! │ Inbound ch. │────▶│  Triggers::  │────▶│  Dispatch    │
//! │ PWM timer   │────▶│    wait()    │     │  loop        │
//! │ Heartbeat   │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

/// 32-bit hardware timer value. Wraps; compare with [`tick_reached`].
pub type Tick = u32;

/// Periodic timers the controller owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerId {
    /// Fires once per PWM quantum.
    Pwm = 0,
    /// Fires once per heartbeat half-period.
    Heartbeat = 1,
}

impl TimerId {
    pub const ALL: [TimerId; 2] = [TimerId::Pwm, TimerId::Heartbeat];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The one source that woke the wait primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ready {
    /// The input port no longer equals the armed baseline.
    Input,
    /// One byte arrived on the inbound channel.
    Inbound(u8),
    /// A periodic timer reached its armed time.
    Timer(TimerId),
    /// The primitive returned without a recognised source.
    Spurious,
    /// A bounded wait expired.
    TimedOut,
}

/// `true` once `now` is at or past `deadline`, tolerant of counter wrap.
///
/// Deadlines are never armed more than half the counter range ahead, so a
/// forward distance above `i32::MAX` means the deadline is already behind.
pub const fn tick_reached(now: Tick, deadline: Tick) -> bool {
    deadline.wrapping_sub(now) == 0 || deadline.wrapping_sub(now) > i32::MAX as u32
}

/// Ticks until `deadline`, or 0 if it has passed.
pub const fn ticks_until(now: Tick, deadline: Tick) -> u32 {
    if tick_reached(now, deadline) {
        0
    } else {
        deadline.wrapping_sub(now)
    }
}

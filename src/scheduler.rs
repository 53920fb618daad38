//! Drift-free periodic timer schedules.
//!
//! Each periodic timer keeps the absolute tick of its next fire. After a
//! fire the next deadline is the *previous deadline* plus one period, never
//! `now + period`, so handler latency does not accumulate into phase drift.
//!
//! ```text
//!   armed:   t0        t0+P       t0+2P      t0+3P
//!             │          │          │          │
//!   handled:  └──┐       └────┐     └─┐        └──┐
//!                ▼            ▼       ▼           ▼
//!             (latency varies, deadlines stay on the grid)
//! ```

use crate::events::{Tick, TimerId, tick_reached};

/// Schedule of one periodic timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicSchedule {
    timer: TimerId,
    period: u32,
    next: Tick,
    fires: u64,
}

impl PeriodicSchedule {
    /// Start a schedule whose first fire is one period after `now`.
    pub fn start(timer: TimerId, period: u32, now: Tick) -> Self {
        Self {
            timer,
            period,
            next: now.wrapping_add(period),
            fires: 0,
        }
    }

    pub fn timer(&self) -> TimerId {
        self.timer
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Absolute tick of the next fire.
    pub fn next(&self) -> Tick {
        self.next
    }

    /// Fires consumed since [`start`](Self::start).
    pub fn fires(&self) -> u64 {
        self.fires
    }

    /// Whether the armed deadline has been reached at `now`.
    pub fn is_due(&self, now: Tick) -> bool {
        tick_reached(now, self.next)
    }

    /// Consume one fire and return the deadline to re-arm with.
    pub fn advance(&mut self) -> Tick {
        self.next = self.next.wrapping_add(self.period);
        self.fires += 1;
        self.next
    }

    /// How far behind the grid `now` is, in ticks (0 if on time or early).
    pub fn lag(&self, now: Tick) -> u32 {
        let previous = self.next.wrapping_sub(self.period);
        if tick_reached(now, previous) {
            now.wrapping_sub(previous)
        } else {
            0
        }
    }
}

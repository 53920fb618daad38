//! Port traits — the boundary between the dispatch loop and the board.
//!
//! ```text
//!   Board adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (GPIO banks, timers, channel ends) implement these
//! traits. The [`Controller`](super::controller::Controller) consumes them
//! via generics, so the loop never touches hardware directly and runs
//! unchanged against the simulation board in tests.

use crate::error::Result;
use crate::events::{Ready, Tick, TimerId};

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Fixed-width digital input device.
pub trait InputPort {
    /// Current bit-mask value of the port. Side-effect-free.
    fn read_input(&mut self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Fixed-width digital output device. Writes are assumed to succeed.
pub trait OutputPort {
    fn write_output(&mut self, mask: u32);
}

// ───────────────────────────────────────────────────────────────
// Outbound event channel (domain → other tile)
// ───────────────────────────────────────────────────────────────

/// Sending end of the outbound event channel.
pub trait EventSender {
    /// Send one event code, blocking until delivered.
    ///
    /// A full channel is backpressure, not an error. Returns
    /// [`Error::ChannelClosed`](crate::error::Error::ChannelClosed) if the
    /// transport was torn down.
    fn send_event(&mut self, code: u8) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Triggers (timers + multi-source wait)
// ───────────────────────────────────────────────────────────────

/// Trigger configuration and the single blocking wait point.
///
/// Arming is stateful: an armed trigger stays armed until re-armed or
/// [`disarm_all`](Self::disarm_all) is called. A source that is ready but
/// not reported by one `wait` stays ready for the next.
pub trait Triggers {
    /// Current value of the free-running reference timer.
    fn now(&self) -> Tick;

    /// Fire [`Ready::Input`] while the input port differs from `baseline`.
    fn arm_input(&mut self, baseline: u32);

    /// Fire [`Ready::Timer`] once the reference timer reaches `at`.
    fn arm_timer(&mut self, timer: TimerId, at: Tick);

    /// Report queued inbound bytes as [`Ready::Inbound`] while `enabled`.
    fn enable_inbound(&mut self, enabled: bool);

    /// Clear every trigger.
    fn disarm_all(&mut self);

    /// Block until exactly one armed source is ready, or until `timeout`
    /// ticks elapse when one is given.
    fn wait(&mut self, timeout: Option<u32>) -> Result<Ready>;
}

/// Everything the controller needs from a board, in one bound.
pub trait Board: InputPort + OutputPort + EventSender + Triggers {}

impl<T: InputPort + OutputPort + EventSender + Triggers> Board for T {}

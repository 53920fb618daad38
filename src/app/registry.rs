//! Event source registry.
//!
//! The caller declares the fixed set of event sources before entering the
//! run loop. Each source has exactly one owning handler; registering a
//! source twice is a configuration error. Sources left out are never armed.

use heapless::Vec;
use log::info;

use crate::error::{Error, Result};
use crate::events::TimerId;

/// Maximum number of sources one controller multiplexes.
pub const MAX_SOURCES: usize = 4;

/// A source the dispatch loop can wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Input port, fires when its value differs from the armed baseline.
    EdgeTriggeredInput,
    /// Inbound byte channel carrying the requested PWM duty.
    LevelValueChannel,
    /// Periodic timer with a fixed period in ticks.
    PeriodicTimer { timer: TimerId, period: u32 },
}

/// Handler that owns a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Buttons,
    DutyUpdate,
    Heartbeat,
    Pwm,
}

impl EventSource {
    /// The one handler that owns this source.
    pub fn handler(&self) -> Handler {
        match self {
            Self::EdgeTriggeredInput => Handler::Buttons,
            Self::LevelValueChannel => Handler::DutyUpdate,
            Self::PeriodicTimer {
                timer: TimerId::Heartbeat,
                ..
            } => Handler::Heartbeat,
            Self::PeriodicTimer {
                timer: TimerId::Pwm, ..
            } => Handler::Pwm,
        }
    }

    fn same_source(&self, other: &EventSource) -> bool {
        match (self, other) {
            (Self::PeriodicTimer { timer: a, .. }, Self::PeriodicTimer { timer: b, .. }) => a == b,
            (a, b) => a == b,
        }
    }
}

/// Registered sources, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<EventSource, MAX_SOURCES>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self { sources: Vec::new() }
    }

    /// Register a source. Returns its slot index.
    pub fn register(&mut self, source: EventSource) -> Result<usize> {
        if self.sources.iter().any(|s| s.same_source(&source)) {
            return Err(Error::Config("event source registered twice"));
        }
        if let EventSource::PeriodicTimer { period, .. } = source {
            if period == 0 {
                return Err(Error::Config("periodic timer with zero period"));
            }
            // Deadlines further ahead than half the counter read as already past.
            if period > i32::MAX as u32 {
                return Err(Error::Config("periodic timer period exceeds half the tick range"));
            }
        }
        self.sources
            .push(source)
            .map_err(|_| Error::Config("too many event sources"))?;
        let slot = self.sources.len() - 1;
        info!("registry: {:?} -> {:?} (slot {})", source, source.handler(), slot);
        Ok(slot)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, source: EventSource) -> Result<Self> {
        self.register(source)?;
        Ok(self)
    }

    pub fn has_input(&self) -> bool {
        self.sources.contains(&EventSource::EdgeTriggeredInput)
    }

    pub fn has_inbound(&self) -> bool {
        self.sources.contains(&EventSource::LevelValueChannel)
    }

    /// Period of `timer`, if registered.
    pub fn timer_period(&self, timer: TimerId) -> Option<u32> {
        self.sources.iter().find_map(|s| match s {
            EventSource::PeriodicTimer { timer: t, period } if *t == timer => Some(*period),
            _ => None,
        })
    }

    /// Registered timers in registration order.
    pub fn timers(&self) -> impl Iterator<Item = (TimerId, u32)> + '_ {
        self.sources.iter().filter_map(|s| match s {
            EventSource::PeriodicTimer { timer, period } => Some((*timer, *period)),
            _ => None,
        })
    }

    pub fn sources(&self) -> &[EventSource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

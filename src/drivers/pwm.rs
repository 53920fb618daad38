//! Software PWM phase accumulator.
//!
//! One PWM period is `total_quanta` quanta long. A counter walks the quanta
//! once per PWM-timer event; the output is on while the counter is below
//! the duty. The requested duty is latched at phase 0, so a change made
//! mid-period takes effect at the next period boundary.
//!
//! | phase        | 0 | 1 | … | duty-1 | duty | … | total-1 |
//! |--------------|---|---|---|--------|------|---|---------|
//! | output       | 1 | 1 | 1 | 1      | 0    | 0 | 0       |
//!
//! A duty at or above `total_quanta` never turns off within a period.

/// Phase accumulator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmAccumulator {
    total_quanta: u16,
    phase: u16,
    requested: u8,
    latched: u8,
}

impl PwmAccumulator {
    pub fn new(total_quanta: u16, initial_duty: u8) -> Self {
        Self {
            total_quanta: total_quanta.max(1),
            phase: 0,
            requested: initial_duty,
            latched: initial_duty,
        }
    }

    /// Request a new duty; applied from the next period boundary.
    pub fn set_duty(&mut self, duty: u8) {
        self.requested = duty;
    }

    /// Most recently requested duty.
    pub fn duty(&self) -> u8 {
        self.requested
    }

    /// Duty in force for the current period.
    pub fn active_duty(&self) -> u8 {
        self.latched
    }

    /// Position within the current period.
    pub fn phase(&self) -> u16 {
        self.phase
    }

    pub fn total_quanta(&self) -> u16 {
        self.total_quanta
    }

    /// Process one quantum: returns whether the output is on for it, then
    /// advances the phase modulo `total_quanta`.
    pub fn step(&mut self) -> bool {
        if self.phase == 0 {
            self.latched = self.requested;
        }
        let on = self.phase < u16::from(self.latched);
        self.phase = (self.phase + 1) % self.total_quanta;
        on
    }
}

/// On/off split of one PWM period, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmInfo {
    pub duty: u8,
    /// Percentage of the period the output is on (0..=100).
    pub on_percent: u32,
    /// Percentage of the period the output is off (0..=100).
    pub off_percent: u32,
    pub period_ticks: u64,
}

impl PwmInfo {
    pub fn new(duty: u8, quanta_ticks: u32, total_quanta: u16) -> Self {
        let period_ticks = u64::from(quanta_ticks) * u64::from(total_quanta.max(1));
        let on_ticks = (u64::from(duty) * u64::from(quanta_ticks)).min(period_ticks);
        let on_percent = if period_ticks == 0 {
            0
        } else {
            (100 * on_ticks / period_ticks) as u32
        };
        Self {
            duty,
            on_percent,
            off_percent: 100 - on_percent,
            period_ticks,
        }
    }

    /// PWM frequency in Hz for a timer running at `tick_rate_hz`.
    pub fn frequency_hz(&self, tick_rate_hz: u32) -> f32 {
        if self.period_ticks == 0 {
            return 0.0;
        }
        tick_rate_hz as f32 / self.period_ticks as f32
    }
}

impl core::fmt::Display for PwmInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "PWM input: {} (ON/OFF: {}/{})",
            self.duty, self.on_percent, self.off_percent
        )
    }
}

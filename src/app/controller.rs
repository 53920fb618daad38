//! The dispatch loop — single-threaded event multiplexer driving the LEDs.
//!
//! [`Controller`] owns all mutable state. It waits for exactly one ready
//! source at a time through the [`Triggers`](super::ports::Triggers) port,
//! runs the one handler that owns it, writes the output mask and loops.
//!
//! ```text
//!  InputPort ───┐                        ┌──▶ OutputPort (LED mask)
//!  Inbound ch. ─┤   ┌────────────────┐   │
//!  PWM timer ───┼──▶│   Controller   │───┤
//!  Heartbeat ───┘   │ step() / run() │   └──▶ EventSender (button codes)
//!                   └────────────────┘
//! ```
//!
//! The thread only blocks inside
//! [`Triggers::wait`](super::ports::Triggers::wait); handlers never block
//! except on outbound backpressure.

use heapless::Vec;
use log::{debug, error, info, trace, warn};

use crate::config::{ControllerConfig, MAX_BUTTONS};
use crate::drivers::buttons::ButtonDecoder;
use crate::drivers::led_mask::LedMask;
use crate::drivers::pwm::{PwmAccumulator, PwmInfo};
use crate::error::{Error, Result};
use crate::events::{Ready, TimerId};
use crate::scheduler::PeriodicSchedule;

use super::cancel::CancelToken;
use super::ports::Board;
use super::registry::{EventSource, SourceRegistry};

// ───────────────────────────────────────────────────────────────
// State snapshots
// ───────────────────────────────────────────────────────────────

/// Point-in-time copy of the controller's mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    /// Shadow of the output port.
    pub output_bits: u32,
    /// Most recently requested PWM duty.
    pub pwm_duty: u8,
    /// Position within the current PWM period.
    pub pwm_phase_counter: u16,
    /// Level of the heartbeat bits.
    pub heartbeat_bit: bool,
}

/// What one loop iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Input edge decoded; carries the event codes sent.
    Buttons(Vec<u8, MAX_BUTTONS>),
    /// New duty stored.
    Duty(u8),
    /// Heartbeat toggled to the given level.
    Heartbeat(bool),
    /// PWM quantum processed; carries the PWM bit level.
    Pwm(bool),
    /// Spurious or timed-out wake, nothing dispatched.
    Idle,
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller {
    config: ControllerConfig,
    sources: SourceRegistry,
    leds: LedMask,
    pwm: PwmAccumulator,
    buttons: ButtonDecoder,
    schedules: [Option<PeriodicSchedule>; 2],
    heartbeat_on: bool,
    started: bool,
    dispatched: u64,
}

impl Controller {
    /// Build a controller over an explicit set of sources.
    ///
    /// Does **not** touch the board — [`start`](Self::start) arms the
    /// triggers (and [`step`](Self::step) calls it on first use).
    pub fn new(config: ControllerConfig, sources: SourceRegistry) -> Result<Self> {
        config.validate()?;
        if sources.is_empty() {
            return Err(Error::Config("no event sources registered"));
        }
        let pwm = PwmAccumulator::new(config.total_quanta, config.initial_duty);
        let buttons = ButtonDecoder::new(&config.buttons, 0);
        Ok(Self {
            config,
            sources,
            leds: LedMask::default(),
            pwm,
            buttons,
            schedules: [None, None],
            heartbeat_on: false,
            started: false,
            dispatched: 0,
        })
    }

    /// Build a controller with every source the board offers: buttons,
    /// inbound duty channel, PWM timer and heartbeat timer.
    pub fn with_standard_sources(config: ControllerConfig) -> Result<Self> {
        let sources = standard_sources(&config)?;
        Self::new(config, sources)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Arm every registered source.
    pub fn start(&mut self, hw: &mut impl Board) {
        hw.disarm_all();

        if self.sources.has_input() {
            let baseline = hw.read_input();
            self.buttons = ButtonDecoder::new(&self.config.buttons, baseline);
            hw.arm_input(baseline);
        }

        let now = hw.now();
        self.schedules = [None, None];
        for (timer, period) in self.sources.timers() {
            let schedule = PeriodicSchedule::start(timer, period, now);
            hw.arm_timer(timer, schedule.next());
            self.schedules[timer.index()] = Some(schedule);
        }

        hw.enable_inbound(self.sources.has_inbound());
        self.started = true;

        info!(
            "ctrl: started with {} sources at tick {} ({})",
            self.sources.sources().len(),
            now,
            self.pwm_info()
        );
    }

    /// Run until `cancel` is set. Only returns early on a fatal error.
    pub fn run(&mut self, hw: &mut impl Board, cancel: &CancelToken) -> Result<()> {
        if !self.started {
            self.start(hw);
        }
        loop {
            if cancel.is_cancelled() {
                info!("ctrl: cancelled after {} events", self.dispatched);
                return Ok(());
            }
            if let Err(e) = self.step(hw) {
                error!("ctrl: halting on fatal error: {}", e);
                return Err(e);
            }
        }
    }

    /// Wait for one ready source and run its handler.
    pub fn step(&mut self, hw: &mut impl Board) -> Result<Dispatched> {
        if !self.started {
            self.start(hw);
        }

        let outcome = match hw.wait(None)? {
            Ready::Input if self.sources.has_input() => self.on_input(hw)?,
            Ready::Inbound(duty) if self.sources.has_inbound() => self.on_duty(duty),
            Ready::Timer(TimerId::Heartbeat) if self.schedule(TimerId::Heartbeat).is_some() => {
                self.on_heartbeat(hw)
            }
            Ready::Timer(TimerId::Pwm) if self.schedule(TimerId::Pwm).is_some() => self.on_pwm(hw),
            other => {
                trace!("ctrl: ignoring {:?}", other);
                Dispatched::Idle
            }
        };

        if outcome != Dispatched::Idle {
            self.dispatched += 1;
        }
        Ok(outcome)
    }

    // ── Handlers ──────────────────────────────────────────────

    fn on_input(&mut self, hw: &mut impl Board) -> Result<Dispatched> {
        let value = hw.read_input();
        let Some(codes) = self.buttons.on_edge(value) else {
            trace!("ctrl: input wake without change (0x{:x})", value);
            return Ok(Dispatched::Idle);
        };
        hw.arm_input(value);

        for &code in &codes {
            debug!("ctrl: button code 0x{:02x}", code);
            hw.send_event(code)?;
        }
        Ok(Dispatched::Buttons(codes))
    }

    fn on_duty(&mut self, duty: u8) -> Dispatched {
        self.pwm.set_duty(duty);
        if u16::from(duty) >= self.config.total_quanta {
            debug!(
                "ctrl: duty {} >= {} quanta, output stays on",
                duty, self.config.total_quanta
            );
        }
        debug!("ctrl: {}", self.pwm_info());
        Dispatched::Duty(duty)
    }

    fn on_heartbeat(&mut self, hw: &mut impl Board) -> Dispatched {
        let Some(schedule) = self.schedules[TimerId::Heartbeat.index()].as_mut() else {
            return Dispatched::Idle;
        };
        let next = schedule.advance();
        hw.arm_timer(TimerId::Heartbeat, next);

        self.heartbeat_on = self.leds.toggle(self.config.heartbeat_mask);
        hw.write_output(self.leds.bits());
        debug!("ctrl: heartbeat {}", if self.heartbeat_on { "on" } else { "off" });
        Dispatched::Heartbeat(self.heartbeat_on)
    }

    fn on_pwm(&mut self, hw: &mut impl Board) -> Dispatched {
        let Some(schedule) = self.schedules[TimerId::Pwm.index()].as_mut() else {
            return Dispatched::Idle;
        };
        let lag = schedule.lag(hw.now());
        if lag >= schedule.period() {
            warn!("ctrl: pwm quantum overrun by {} ticks", lag);
        }
        let next = schedule.advance();
        hw.arm_timer(TimerId::Pwm, next);

        let on = self.pwm.step();
        self.leds.update(on, self.config.pwm_mask);
        hw.write_output(self.leds.bits());
        Dispatched::Pwm(on)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        ControllerState {
            output_bits: self.leds.bits(),
            pwm_duty: self.pwm.duty(),
            pwm_phase_counter: self.pwm.phase(),
            heartbeat_bit: self.heartbeat_on,
        }
    }

    /// Schedule of `timer`, if it is registered and the loop has started.
    pub fn schedule(&self, timer: TimerId) -> Option<&PeriodicSchedule> {
        self.schedules[timer.index()].as_ref()
    }

    /// On/off split of the requested duty, timed by the registered PWM
    /// period (falls back to the configured quantum when no PWM timer is
    /// registered).
    pub fn pwm_info(&self) -> PwmInfo {
        let quanta_ticks = self
            .sources
            .timer_period(TimerId::Pwm)
            .unwrap_or(self.config.quanta_ticks);
        PwmInfo::new(self.pwm.duty(), quanta_ticks, self.config.total_quanta)
    }

    /// Duty in force for the current PWM period.
    pub fn active_duty(&self) -> u8 {
        self.pwm.active_duty()
    }

    /// Handlers run since start (idle wakes excluded).
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

/// Registry with all four board sources, periods taken from `config`.
pub fn standard_sources(config: &ControllerConfig) -> Result<SourceRegistry> {
    SourceRegistry::new()
        .with(EventSource::EdgeTriggeredInput)?
        .with(EventSource::LevelValueChannel)?
        .with(EventSource::PeriodicTimer {
            timer: TimerId::Pwm,
            period: config.quanta_ticks,
        })?
        .with(EventSource::PeriodicTimer {
            timer: TimerId::Heartbeat,
            period: config.heartbeat_ticks,
        })
}

/// Build a controller over `sources` and run it until `cancel` is set.
pub fn run(
    config: ControllerConfig,
    sources: SourceRegistry,
    hw: &mut impl Board,
    cancel: &CancelToken,
) -> Result<()> {
    let mut ctrl = Controller::new(config, sources)?;
    ctrl.run(hw, cancel)
}

//! Virtual-clock simulation board.
//!
//! Implements every controller port against a discrete-event clock, so the
//! dispatch loop runs unchanged on the host at full speed and
//! deterministically:
//!
//! - `wait()` jumps the clock straight to the next scripted stimulus or armed
//!   timer deadline instead of sleeping.
//! - Input changes and inbound bytes are scripted at absolute ticks.
//! - An optional per-wait latency models time spent in handlers.
//! - A horizon stops the run by setting the cancellation token.
//!
//! Readiness order within one instant: input, inbound, then due timers by
//! earliest deadline (ties in [`TimerId`] order).

use std::cmp::Reverse;
use std::collections::VecDeque;

use log::trace;

use crate::app::cancel::CancelToken;
use crate::app::ports::{EventSender, InputPort, OutputPort, Triggers};
use crate::config::{ControllerConfig, OverflowPolicy};
use crate::error::{Error, Result};
use crate::events::{Ready, Tick, TimerId, ticks_until};
use crate::link::queue::{BoundedQueue, Pushed};

/// Inbound channel depth of the simulated board.
pub const INBOUND_DEPTH: usize = 8;

/// Something the outside world does to the board at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stimulus {
    /// Input port takes this value.
    Input(u32),
    /// One byte is pushed onto the inbound channel.
    Inbound(u8),
}

pub struct SimBoard {
    now: u64,
    latency: u32,
    horizon: Option<u64>,
    cancel: Option<CancelToken>,

    input: u32,
    input_armed: Option<u32>,
    timers: [Option<Tick>; 2],
    inbound_enabled: bool,
    inbound: BoundedQueue<u8, INBOUND_DEPTH>,
    script: VecDeque<(u64, Stimulus)>,

    output: u32,
    outbound_closed: bool,

    /// Every output write as `(tick, mask)`.
    pub writes: Vec<(Tick, u32)>,
    /// Every timer arm as `(timer, deadline)`.
    pub arms: Vec<(TimerId, Tick)>,
    /// Every event code sent on the outbound channel.
    pub sent: Vec<u8>,
}

impl SimBoard {
    pub fn new(initial_input: u32, policy: OverflowPolicy) -> Self {
        Self {
            now: 0,
            latency: 0,
            horizon: None,
            cancel: None,
            input: initial_input,
            input_armed: None,
            timers: [None, None],
            inbound_enabled: false,
            inbound: BoundedQueue::new(policy),
            script: VecDeque::new(),
            output: 0,
            outbound_closed: false,
            writes: Vec::new(),
            arms: Vec::new(),
            sent: Vec::new(),
        }
    }

    /// Board whose inbound channel follows `config.overflow_policy`.
    pub fn from_config(initial_input: u32, config: &ControllerConfig) -> Self {
        Self::new(initial_input, config.overflow_policy)
    }

    /// Start the clock at `tick` instead of 0.
    pub fn starting_at(mut self, tick: u64) -> Self {
        self.now = tick;
        self
    }

    /// Advance the clock by `ticks` at the start of every wait.
    pub fn with_latency(mut self, ticks: u32) -> Self {
        self.latency = ticks;
        self
    }

    /// Cancel `token` instead of running past `tick`.
    pub fn with_horizon(mut self, tick: u64, token: CancelToken) -> Self {
        self.horizon = Some(tick);
        self.cancel = Some(token);
        self
    }

    /// Schedule `stimulus` at absolute tick `at`.
    pub fn schedule(&mut self, at: u64, stimulus: Stimulus) {
        let pos = self.script.partition_point(|(t, _)| *t <= at);
        self.script.insert(pos, (at, stimulus));
    }

    /// Push a byte onto the inbound channel right now.
    pub fn push_inbound(&self, byte: u8) -> Result<Pushed> {
        self.inbound.push(byte)
    }

    /// Change the input port value right now.
    pub fn set_input(&mut self, value: u32) {
        self.input = value;
    }

    /// Tear down the inbound channel.
    pub fn close_inbound(&self) {
        self.inbound.close();
    }

    /// Tear down the outbound channel.
    pub fn close_outbound(&mut self) {
        self.outbound_closed = true;
    }

    /// Drain the event codes sent so far.
    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.sent)
    }

    pub fn clock(&self) -> u64 {
        self.now
    }

    pub fn output(&self) -> u32 {
        self.output
    }

    pub fn armed_timer(&self, timer: TimerId) -> Option<Tick> {
        self.timers[timer.index()]
    }

    // ── Internal ──────────────────────────────────────────────

    fn tick32(&self) -> Tick {
        self.now as Tick
    }

    fn apply_due_stimuli(&mut self) -> Result<()> {
        while let Some(&(at, stimulus)) = self.script.front() {
            if at > self.now {
                break;
            }
            self.script.pop_front();
            match stimulus {
                Stimulus::Input(v) => self.input = v,
                Stimulus::Inbound(b) => {
                    self.inbound.push(b)?;
                }
            }
        }
        Ok(())
    }

    fn ready_now(&mut self) -> Result<Option<Ready>> {
        if let Some(baseline) = self.input_armed {
            if self.input != baseline {
                return Ok(Some(Ready::Input));
            }
        }
        if self.inbound_enabled {
            if let Some(b) = self.inbound.try_recv()? {
                return Ok(Some(Ready::Inbound(b)));
            }
        }
        let now = self.tick32();
        let due = TimerId::ALL
            .iter()
            .filter_map(|&t| self.timers[t.index()].map(|at| (t, at)))
            .filter(|&(_, at)| ticks_until(now, at) == 0)
            .min_by_key(|&(_, at)| Reverse(now.wrapping_sub(at)));
        Ok(due.map(|(t, _)| Ready::Timer(t)))
    }

    /// Absolute time of the next thing that could make a source ready.
    fn next_event_at(&self) -> Option<u64> {
        let now32 = self.tick32();
        let timer = self
            .timers
            .iter()
            .flatten()
            .map(|&at| self.now + u64::from(ticks_until(now32, at)))
            .min();
        let stimulus = self.script.front().map(|&(at, _)| at);
        match (timer, stimulus) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

impl InputPort for SimBoard {
    fn read_input(&mut self) -> u32 {
        self.input
    }
}

impl OutputPort for SimBoard {
    fn write_output(&mut self, mask: u32) {
        self.output = mask;
        self.writes.push((self.tick32(), mask));
    }
}

impl EventSender for SimBoard {
    fn send_event(&mut self, code: u8) -> Result<()> {
        if self.outbound_closed {
            return Err(Error::ChannelClosed);
        }
        self.sent.push(code);
        Ok(())
    }
}

impl Triggers for SimBoard {
    fn now(&self) -> Tick {
        self.tick32()
    }

    fn arm_input(&mut self, baseline: u32) {
        self.input_armed = Some(baseline);
    }

    fn arm_timer(&mut self, timer: TimerId, at: Tick) {
        self.timers[timer.index()] = Some(at);
        self.arms.push((timer, at));
    }

    fn enable_inbound(&mut self, enabled: bool) {
        self.inbound_enabled = enabled;
    }

    fn disarm_all(&mut self) {
        self.input_armed = None;
        self.timers = [None, None];
        self.inbound_enabled = false;
    }

    fn wait(&mut self, timeout: Option<u32>) -> Result<Ready> {
        self.now += u64::from(self.latency);
        let limit = timeout.map(|t| self.now + u64::from(t));

        loop {
            self.apply_due_stimuli()?;
            if let Some(ready) = self.ready_now()? {
                // Timers are one-shot; the handler re-arms the next period.
                if let Ready::Timer(t) = ready {
                    self.timers[t.index()] = None;
                }
                trace!("sim: {:?} at {}", ready, self.now);
                return Ok(ready);
            }

            let next = match (self.next_event_at(), limit) {
                (Some(n), Some(l)) if l < n => {
                    self.now = l;
                    return Ok(Ready::TimedOut);
                }
                (Some(n), _) => n,
                (None, Some(l)) => {
                    self.now = l;
                    return Ok(Ready::TimedOut);
                }
                (None, None) => {
                    if self.inbound.is_closed() {
                        return Err(Error::ChannelClosed);
                    }
                    if let Some(token) = &self.cancel {
                        token.cancel();
                    }
                    return Ok(Ready::Spurious);
                }
            };

            if let Some(h) = self.horizon {
                if next > h {
                    self.now = h;
                    if let Some(token) = &self.cancel {
                        token.cancel();
                    }
                    return Ok(Ready::Spurious);
                }
            }
            self.now = next;
        }
    }
}

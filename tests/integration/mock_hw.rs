//! Mock board for integration tests.
//!
//! Delivers a scripted sequence of ready events and records every port call
//! so tests can assert on the full command history without a clock.

use std::collections::VecDeque;

use ledmux::Error;
use ledmux::app::cancel::CancelToken;
use ledmux::app::ports::{EventSender, InputPort, OutputPort, Triggers};
use ledmux::events::{Ready, Tick, TimerId};

// ── Board call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BoardCall {
    DisarmAll,
    ArmInput(u32),
    ArmTimer(TimerId, Tick),
    EnableInbound(bool),
    Write(u32),
    Send(u8),
}

/// One scripted wake-up.
#[derive(Debug, Clone, Copy)]
pub enum Wake {
    /// Input port takes this value, then the wait reports `Ready::Input`.
    Input(u32),
    /// The wait reports this event as-is.
    Event(Ready),
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub calls: Vec<BoardCall>,
    pub input: u32,
    pub now: Tick,
    pub send_closed: bool,
    wakes: VecDeque<Wake>,
    cancel: Option<CancelToken>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new(input: u32) -> Self {
        Self {
            calls: Vec::new(),
            input,
            now: 0,
            send_closed: false,
            wakes: VecDeque::new(),
            cancel: None,
        }
    }

    /// Cancel `token` once the script runs dry.
    pub fn cancel_when_empty(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn push(&mut self, wake: Wake) {
        self.wakes.push_back(wake);
    }

    pub fn push_event(&mut self, ready: Ready) {
        self.push(Wake::Event(ready));
    }

    pub fn push_many(&mut self, ready: Ready, n: usize) {
        for _ in 0..n {
            self.push_event(ready);
        }
    }

    pub fn writes(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Write(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Send(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn timer_arms(&self, timer: TimerId) -> Vec<Tick> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::ArmTimer(t, at) if *t == timer => Some(*at),
                _ => None,
            })
            .collect()
    }

    pub fn last_write(&self) -> Option<u32> {
        self.writes().last().copied()
    }
}

impl InputPort for MockBoard {
    fn read_input(&mut self) -> u32 {
        self.input
    }
}

impl OutputPort for MockBoard {
    fn write_output(&mut self, mask: u32) {
        self.calls.push(BoardCall::Write(mask));
    }
}

impl EventSender for MockBoard {
    fn send_event(&mut self, code: u8) -> Result<(), Error> {
        if self.send_closed {
            return Err(Error::ChannelClosed);
        }
        self.calls.push(BoardCall::Send(code));
        Ok(())
    }
}

impl Triggers for MockBoard {
    fn now(&self) -> Tick {
        self.now
    }

    fn arm_input(&mut self, baseline: u32) {
        self.calls.push(BoardCall::ArmInput(baseline));
    }

    fn arm_timer(&mut self, timer: TimerId, at: Tick) {
        self.calls.push(BoardCall::ArmTimer(timer, at));
    }

    fn enable_inbound(&mut self, enabled: bool) {
        self.calls.push(BoardCall::EnableInbound(enabled));
    }

    fn disarm_all(&mut self) {
        self.calls.push(BoardCall::DisarmAll);
    }

    fn wait(&mut self, _timeout: Option<u32>) -> Result<Ready, Error> {
        match self.wakes.pop_front() {
            Some(Wake::Input(v)) => {
                self.input = v;
                Ok(Ready::Input)
            }
            Some(Wake::Event(r)) => Ok(r),
            None => {
                if let Some(token) = &self.cancel {
                    token.cancel();
                }
                Ok(Ready::Spurious)
            }
        }
    }
}

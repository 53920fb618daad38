//! Timed scenarios on the virtual-clock board.

use ledmux::Error;
use ledmux::adapters::sim::{SimBoard, Stimulus};
use ledmux::app::cancel::CancelToken;
use ledmux::app::controller::{Controller, Dispatched};
use ledmux::app::registry::{EventSource, SourceRegistry};
use ledmux::config::{ControllerConfig, OverflowPolicy};
use ledmux::events::TimerId;

const RELEASED: u32 = 0b11;

fn config() -> ControllerConfig {
    ControllerConfig {
        quanta_ticks: 1_000,
        heartbeat_ticks: 4_000,
        total_quanta: 8,
        initial_duty: 0,
        ..ControllerConfig::default()
    }
}

fn pwm_arms(board: &SimBoard) -> Vec<u32> {
    board
        .arms
        .iter()
        .filter(|(t, _)| *t == TimerId::Pwm)
        .map(|(_, at)| *at)
        .collect()
}

fn pwm_only(config: ControllerConfig) -> Controller {
    let r = SourceRegistry::new()
        .with(EventSource::PeriodicTimer {
            timer: TimerId::Pwm,
            period: config.quanta_ticks,
        })
        .unwrap();
    Controller::new(config, r).unwrap()
}

// ── Timing ────────────────────────────────────────────────────

#[test]
fn pwm_deadlines_do_not_drift_under_handler_latency() {
    let token = CancelToken::new();
    let mut board = SimBoard::new(RELEASED, OverflowPolicy::Halt)
        .with_latency(300)
        .with_horizon(10_500, token.clone());
    let mut ctrl = pwm_only(config());

    assert_eq!(ctrl.run(&mut board, &token), Ok(()));
    assert_eq!(ctrl.dispatched(), 10);

    let expected: Vec<u32> = (1..=11).map(|n| n * 1_000).collect();
    assert_eq!(pwm_arms(&board), expected);
    // Every quantum is served exactly on its deadline.
    for (i, (tick, _)) in board.writes.iter().enumerate() {
        assert_eq!(*tick, (i as u32 + 1) * 1_000);
    }
}

#[test]
fn overrunning_handlers_catch_up_without_skipping_quanta() {
    let mut board = SimBoard::new(RELEASED, OverflowPolicy::Halt).with_latency(2_500);
    let mut ctrl = pwm_only(config());

    for _ in 0..20 {
        assert!(matches!(ctrl.step(&mut board), Ok(Dispatched::Pwm(_))));
    }
    let expected: Vec<u32> = (1..=21).map(|n| n * 1_000).collect();
    assert_eq!(pwm_arms(&board), expected);
    assert_eq!(ctrl.state().pwm_phase_counter, 20 % 8);
    // The clock ran ahead of the schedule.
    assert!(board.clock() > 21_000);
}

#[test]
fn coincident_deadlines_are_both_served() {
    let token = CancelToken::new();
    let mut board =
        SimBoard::new(RELEASED, OverflowPolicy::Halt).with_horizon(4_500, token.clone());
    let mut ctrl = Controller::with_standard_sources(config()).unwrap();

    assert_eq!(ctrl.run(&mut board, &token), Ok(()));

    let at_4000: Vec<u32> = board
        .writes
        .iter()
        .filter(|(t, _)| *t == 4_000)
        .map(|(_, m)| *m)
        .collect();
    assert_eq!(at_4000.len(), 2);
    // PWM first, then the heartbeat sets its bit.
    assert_eq!(at_4000[0] & 0x08, 0);
    assert_eq!(at_4000[1] & 0x08, 0x08);
    assert_eq!(board.armed_timer(TimerId::Heartbeat), Some(8_000));
}

#[test]
fn horizon_ends_run_cleanly() {
    let token = CancelToken::new();
    let mut board =
        SimBoard::new(RELEASED, OverflowPolicy::Halt).with_horizon(50_000, token.clone());
    let mut ctrl = Controller::with_standard_sources(config()).unwrap();

    assert_eq!(ctrl.run(&mut board, &token), Ok(()));
    assert!(token.is_cancelled());
    assert_eq!(board.clock(), 50_000);
    // 50 quanta and 12 heartbeat toggles.
    assert_eq!(ctrl.dispatched(), 62);
    assert!(!ctrl.state().heartbeat_bit);
}

#[test]
fn half_range_period_keeps_arithmetic_deadlines() {
    let period = i32::MAX as u32;
    let r = SourceRegistry::new()
        .with(EventSource::PeriodicTimer {
            timer: TimerId::Pwm,
            period,
        })
        .unwrap();
    let mut ctrl = Controller::new(config(), r).unwrap();
    let mut board = SimBoard::new(RELEASED, OverflowPolicy::Halt);

    for _ in 0..3 {
        assert!(matches!(ctrl.step(&mut board), Ok(Dispatched::Pwm(_))));
    }
    let ticks: Vec<u32> = board.writes.iter().map(|(t, _)| *t).collect();
    assert_eq!(
        ticks,
        vec![period, period.wrapping_mul(2), period.wrapping_mul(3)]
    );
    assert_eq!(board.clock(), 3 * u64::from(period));
}

#[test]
fn period_beyond_half_range_cannot_be_registered() {
    let result = SourceRegistry::new().with(EventSource::PeriodicTimer {
        timer: TimerId::Pwm,
        period: 3_000_000_000,
    });
    assert!(matches!(result, Err(Error::Config(_))));
}

// ── Buttons and duty ──────────────────────────────────────────

#[test]
fn button_press_sends_code_once() {
    let token = CancelToken::new();
    let mut board =
        SimBoard::new(RELEASED, OverflowPolicy::Halt).with_horizon(10_000, token.clone());
    board.schedule(5_500, Stimulus::Input(0b10));
    board.schedule(6_000, Stimulus::Input(RELEASED));
    let mut ctrl = Controller::with_standard_sources(config()).unwrap();

    assert_eq!(ctrl.run(&mut board, &token), Ok(()));
    assert_eq!(board.sent, vec![0x01]);
}

#[test]
fn inbound_duty_takes_effect_at_period_boundary() {
    let token = CancelToken::new();
    let mut board =
        SimBoard::new(RELEASED, OverflowPolicy::Halt).with_horizon(16_500, token.clone());
    board.schedule(2_500, Stimulus::Inbound(4));
    let r = SourceRegistry::new()
        .with(EventSource::LevelValueChannel)
        .unwrap()
        .with(EventSource::PeriodicTimer {
            timer: TimerId::Pwm,
            period: 1_000,
        })
        .unwrap();
    let mut ctrl = Controller::new(config(), r).unwrap();

    assert_eq!(ctrl.run(&mut board, &token), Ok(()));
    assert_eq!(ctrl.state().pwm_duty, 4);

    let on: Vec<bool> = board.writes.iter().map(|(_, m)| m & 0x07 != 0).collect();
    assert_eq!(on.len(), 16);
    assert!(on[..8].iter().all(|b| !b));
    assert_eq!(
        &on[8..],
        &[true, true, true, true, false, false, false, false]
    );
}

// ── Channel failures ──────────────────────────────────────────

fn flood(board: &mut SimBoard, at: u64, n: u8) {
    for b in 1..=n {
        board.schedule(at, Stimulus::Inbound(b));
    }
}

#[test]
fn inbound_overflow_halts_under_halt_policy() {
    let token = CancelToken::new();
    let mut board =
        SimBoard::new(RELEASED, OverflowPolicy::Halt).with_horizon(10_000, token.clone());
    flood(&mut board, 2_500, 9);
    let mut ctrl = Controller::with_standard_sources(config()).unwrap();

    assert_eq!(ctrl.run(&mut board, &token), Err(Error::ChannelFull));
    assert!(!token.is_cancelled());
}

#[test]
fn inbound_overflow_drops_under_drop_policy() {
    let token = CancelToken::new();
    let cfg = ControllerConfig {
        overflow_policy: OverflowPolicy::DropAndLog,
        ..config()
    };
    let mut board = SimBoard::from_config(RELEASED, &cfg).with_horizon(10_000, token.clone());
    flood(&mut board, 2_500, 9);
    let mut ctrl = Controller::with_standard_sources(cfg).unwrap();

    assert_eq!(ctrl.run(&mut board, &token), Ok(()));
    // The ninth byte never made it into the queue.
    assert_eq!(ctrl.state().pwm_duty, 8);
}

#[test]
fn closed_inbound_channel_is_fatal() {
    let token = CancelToken::new();
    let mut board =
        SimBoard::new(RELEASED, OverflowPolicy::Halt).with_horizon(10_000, token.clone());
    board.close_inbound();
    let mut ctrl = Controller::with_standard_sources(config()).unwrap();

    assert_eq!(ctrl.run(&mut board, &token), Err(Error::ChannelClosed));
}

#[test]
fn closed_outbound_channel_is_fatal_on_first_press() {
    let token = CancelToken::new();
    let mut board =
        SimBoard::new(RELEASED, OverflowPolicy::Halt).with_horizon(10_000, token.clone());
    board.close_outbound();
    board.schedule(3_500, Stimulus::Input(0b01));
    let mut ctrl = Controller::with_standard_sources(config()).unwrap();

    assert_eq!(ctrl.run(&mut board, &token), Err(Error::ChannelClosed));
    assert_eq!(board.clock(), 3_500);
}

//! ledmux-sim — two-tile host simulation.
//!
//! ```text
//! ┌──────────────── tile 1 ────────────────┐        ┌──────── tile 0 ────────┐
//! │ SimBoard ◀──▶ Controller               │ codes  │                        │
//! │   (buttons, LEDs, timers)  ──────────────────────▶ Dimmer                 │
//! │                            ◀──────────────────────  (duty)                │
//! │                       LinkEndpoint(1)  │  duty  │ LinkEndpoint(0)        │
//! └────────────────────────────────────────┘        └────────────────────────┘
//! ```
//!
//! Usage: `ledmux-sim [config.json] [duration_ms]`
//!
//! Button A is pressed three times and button B once; the dimmer on tile 0
//! answers each code with a new duty that tile 1 applies to its PWM LEDs.

use anyhow::{Context, Result};
use log::info;

use ledmux::adapters::sim::{SimBoard, Stimulus};
use ledmux::app::cancel::CancelToken;
use ledmux::app::controller::Controller;
use ledmux::app::dimmer::Dimmer;
use ledmux::config::ControllerConfig;
use ledmux::link::bridge::{LinkEndpoint, PeerWire};

const TILE0_ID: u8 = 0;
const TILE1_ID: u8 = 1;

/// Port value with no button pressed (active-low, pulled up).
const BUTTONS_RELEASED: u32 = 0b11;

fn load_config(path: Option<&str>) -> Result<ControllerConfig> {
    let Some(path) = path else {
        return Ok(ControllerConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let config: ControllerConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    config.validate()?;
    let duration_ms: u32 = match args.get(2) {
        Some(s) => s.parse().with_context(|| format!("bad duration {s:?}"))?,
        None => 3_000,
    };

    info!("ledmux-sim v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancelToken::new();
    let horizon = u64::from(config.ms_to_ticks(duration_ms));
    let mut board = SimBoard::from_config(BUTTONS_RELEASED, &config)
        .with_horizon(horizon, cancel.clone());

    // Button A three times, then button B once, 200 ms apart.
    let press = u64::from(config.ms_to_ticks(50));
    for (i, value) in [0b10, 0b10, 0b10, 0b01].into_iter().enumerate() {
        let at = u64::from(config.ms_to_ticks(200)) * (i as u64 + 1);
        board.schedule(at, Stimulus::Input(value));
        board.schedule(at + press, Stimulus::Input(BUTTONS_RELEASED));
    }

    let tile0 = LinkEndpoint::new(TILE0_ID, config.overflow_policy);
    let tile1 = LinkEndpoint::new(TILE1_ID, config.overflow_policy);
    let mut dimmer = Dimmer::new(config.total_quanta, config.initial_duty, 16);

    let mut ctrl = Controller::with_standard_sources(config.clone())?;
    ctrl.start(&mut board);

    while !cancel.is_cancelled() {
        ctrl.step(&mut board)?;

        // tile 1 → tile 0: button codes
        for code in board.take_sent() {
            tile1.submit(&[code])?;
        }
        tile1.pump(TILE0_ID, &mut PeerWire::new(&tile0))?;

        // tile 0: dimmer answers with duty
        while let Some(msg) = tile0.try_recv()? {
            for &code in &msg {
                if let Some(duty) = dimmer.on_code(code) {
                    info!("tile0: code 0x{:02x} -> duty {}", code, duty);
                    tile0.submit(&[duty])?;
                }
            }
        }
        tile0.pump(TILE1_ID, &mut PeerWire::new(&tile1))?;

        // tile 0 → tile 1: duty bytes onto the controller's inbound channel
        while let Some(msg) = tile1.try_recv()? {
            for &duty in &msg {
                board.push_inbound(duty)?;
            }
        }
    }

    let state = ctrl.state();
    let pwm_on = board
        .writes
        .iter()
        .filter(|(_, mask)| mask & config.pwm_mask != 0)
        .count();
    info!(
        "done at tick {}: {} events, duty={} phase={} leds=0b{:04b} heartbeat={} ({} of {} writes with PWM on)",
        board.clock(),
        ctrl.dispatched(),
        state.pwm_duty,
        state.pwm_phase_counter,
        state.output_bits,
        state.heartbeat_bit,
        pwm_on,
        board.writes.len(),
    );
    Ok(())
}

//! Two tiles talking over the link bridge.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use ledmux::Error;
use ledmux::adapters::sim::{SimBoard, Stimulus};
use ledmux::app::cancel::CancelToken;
use ledmux::app::controller::Controller;
use ledmux::app::dimmer::{CODE_DOWN, CODE_UP, Dimmer};
use ledmux::config::{ControllerConfig, OverflowPolicy};
use ledmux::error::LinkError;
use ledmux::link::bridge::{LINK_DEPTH, LINK_MTU, LinkEndpoint, LinkTransport, PeerWire};

const TILE0: u8 = 0;
const TILE1: u8 = 1;

/// Transport that records frames instead of delivering them.
#[derive(Default)]
struct Capture {
    frames: Vec<Vec<u8>>,
}

impl LinkTransport for Capture {
    fn send_bytes(&mut self, frame: &[u8]) -> Result<(), Error> {
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

#[test]
fn pump_prefixes_peer_header() {
    let ep = LinkEndpoint::new(TILE1, OverflowPolicy::Halt);
    ep.submit(&[CODE_UP]).unwrap();
    ep.submit(&[CODE_DOWN, CODE_DOWN]).unwrap();

    let mut wire = Capture::default();
    assert_eq!(ep.pump(TILE0, &mut wire), Ok(2));
    assert_eq!(wire.frames, vec![vec![TILE0, CODE_UP], vec![TILE0, CODE_DOWN, CODE_DOWN]]);
    assert_eq!(ep.pump(TILE0, &mut wire), Ok(0));
}

#[test]
fn full_mtu_message_crosses() {
    let tile0 = LinkEndpoint::new(TILE0, OverflowPolicy::Halt);
    let tile1 = LinkEndpoint::new(TILE1, OverflowPolicy::Halt);
    let payload: Vec<u8> = (0..LINK_MTU as u8).collect();

    tile1.submit(&payload).unwrap();
    tile1.pump(TILE0, &mut PeerWire::new(&tile0)).unwrap();
    assert_eq!(tile0.try_recv().unwrap().unwrap().as_slice(), payload.as_slice());
}

#[test]
fn frame_for_wrong_tile_is_rejected() {
    let tile0 = LinkEndpoint::new(TILE0, OverflowPolicy::Halt);
    let tile1 = LinkEndpoint::new(TILE1, OverflowPolicy::Halt);
    tile1.submit(&[CODE_UP]).unwrap();

    // Addressed to itself instead of the peer.
    let result = tile1.pump(TILE1, &mut PeerWire::new(&tile0));
    assert_eq!(result, Err(Error::Link(LinkError::ForeignHeader(TILE1))));
    assert_eq!(tile0.pending_rx(), 0);
}

#[test]
fn closed_endpoint_refuses_traffic() {
    let ep = LinkEndpoint::new(TILE0, OverflowPolicy::Halt);
    ep.on_receive(&[TILE0, 7]).unwrap();
    ep.close();

    assert_eq!(ep.on_receive(&[TILE0, 8]), Err(Error::ChannelClosed));
    assert_eq!(ep.submit(&[1]), Err(Error::ChannelClosed));
    // Already-queued data still drains.
    assert_eq!(ep.try_recv().unwrap().unwrap().as_slice(), &[7]);
    assert_eq!(ep.try_recv(), Err(Error::ChannelClosed));
}

#[test]
fn blocking_receiver_on_other_thread() {
    let tile0 = Arc::new(LinkEndpoint::new(TILE0, OverflowPolicy::Halt));
    let consumer = {
        let tile0 = tile0.clone();
        thread::spawn(move || {
            (0..LINK_DEPTH)
                .map(|_| tile0.recv().unwrap()[0])
                .collect::<Vec<u8>>()
        })
    };

    let tile1 = LinkEndpoint::new(TILE1, OverflowPolicy::Halt);
    for code in 0..LINK_DEPTH as u8 {
        tile1.submit(&[code]).unwrap();
        tile1.pump(TILE0, &mut PeerWire::new(&tile0)).unwrap();
    }

    let got = consumer.join().unwrap();
    assert_eq!(got, (0..LINK_DEPTH as u8).collect::<Vec<u8>>());
}

#[test]
fn close_unblocks_waiting_receiver() {
    let tile0 = Arc::new(LinkEndpoint::new(TILE0, OverflowPolicy::Halt));
    let (done_tx, done_rx) = mpsc::channel();
    {
        let tile0 = tile0.clone();
        thread::spawn(move || {
            let _ = done_tx.send(tile0.recv().map(|msg| msg.len()));
        });
    }

    thread::sleep(Duration::from_millis(100));
    tile0.close();

    let got = done_rx
        .recv_timeout(Duration::from_secs(2))
        .expect("recv still blocked after close");
    assert_eq!(got, Err(Error::ChannelClosed));
}

/// Controller tile plus dimmer tile, relayed through the bridge the way
/// the simulator binary does it.
#[test]
fn buttons_on_one_tile_dim_leds_on_the_other() {
    let config = ControllerConfig {
        quanta_ticks: 1_000,
        heartbeat_ticks: 50_000,
        total_quanta: 16,
        initial_duty: 0,
        ..ControllerConfig::default()
    };
    let token = CancelToken::new();
    let mut board = SimBoard::new(0b11, OverflowPolicy::Halt).with_horizon(200_000, token.clone());
    // A, A, A, B.
    for (i, v) in [0b10u32, 0b10, 0b10, 0b01].into_iter().enumerate() {
        let at = 20_000 * (i as u64 + 1);
        board.schedule(at, Stimulus::Input(v));
        board.schedule(at + 5_000, Stimulus::Input(0b11));
    }

    let tile0 = LinkEndpoint::new(TILE0, OverflowPolicy::Halt);
    let tile1 = LinkEndpoint::new(TILE1, OverflowPolicy::Halt);
    let mut dimmer = Dimmer::new(config.total_quanta, config.initial_duty, 4);
    let mut ctrl = Controller::with_standard_sources(config).unwrap();
    let mut duties = Vec::new();

    while !token.is_cancelled() {
        ctrl.step(&mut board).unwrap();

        for code in board.take_sent() {
            tile1.submit(&[code]).unwrap();
        }
        tile1.pump(TILE0, &mut PeerWire::new(&tile0)).unwrap();

        while let Some(msg) = tile0.try_recv().unwrap() {
            for &code in &msg {
                if let Some(duty) = dimmer.on_code(code) {
                    tile0.submit(&[duty]).unwrap();
                }
            }
        }
        tile0.pump(TILE1, &mut PeerWire::new(&tile1)).unwrap();

        while let Some(msg) = tile1.try_recv().unwrap() {
            for &duty in &msg {
                duties.push(duty);
                board.push_inbound(duty).unwrap();
            }
        }
    }

    assert_eq!(duties, vec![4, 8, 12, 8]);
    assert_eq!(ctrl.state().pwm_duty, 8);
    assert_eq!(dimmer.level(), 8);
}

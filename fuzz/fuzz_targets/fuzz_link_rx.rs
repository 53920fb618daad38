//! Fuzz target: `LinkEndpoint::on_receive`
//!
//! Splits the input into frames and hands each one to the receive callback.
//! Every frame must either be queued intact (header stripped) or rejected
//! with a typed error, and the queue must never exceed its depth.
//!
//! cargo fuzz run fuzz_link_rx

#![no_main]

use ledmux::config::OverflowPolicy;
use ledmux::link::bridge::{LINK_DEPTH, LinkEndpoint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let ep = LinkEndpoint::new(0, OverflowPolicy::DropAndLog);

    // First byte of each chunk is its length, the rest is the frame.
    let mut rest = data;
    while let Some((&len, tail)) = rest.split_first() {
        let n = usize::from(len).min(tail.len());
        let (frame, next) = tail.split_at(n);
        rest = next;

        if let Ok(out) = ep.on_receive(frame) {
            assert!(out.buffer_returned);
        }
        assert!(ep.pending_rx() <= LINK_DEPTH);

        if len & 0x80 != 0 {
            if let Ok(Some(msg)) = ep.try_recv() {
                assert!(msg.len() < 128);
            }
        }
    }
});

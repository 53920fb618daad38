//! Inter-tile message bridge.
//!
//! Each tile owns one [`LinkEndpoint`] holding two message buffers: one for
//! messages received from the peer and one for messages waiting to go out.
//! The DMA receive callback hands whole frames to
//! [`on_receive`](LinkEndpoint::on_receive); a relay task calls
//! [`pump`](LinkEndpoint::pump) to push queued messages onto the wire.
//!
//! ## Frame layout
//!
//! | Offset | Size     | Field                         |
//! |--------|----------|-------------------------------|
//! | 0      | 1        | callback id of the receiver   |
//! | 1      | ≤ MTU    | payload (message boundaries kept) |

use heapless::Vec;
use log::{debug, warn};

use crate::config::OverflowPolicy;
use crate::error::{LinkError, Result};

use super::queue::{BoundedQueue, Pushed};

/// Largest payload one frame carries.
pub const LINK_MTU: usize = 64;

/// Messages each direction buffers.
pub const LINK_DEPTH: usize = 4;

const FRAME_MAX: usize = LINK_MTU + 1;

/// One message, header stripped.
pub type Message = Vec<u8, LINK_MTU>;

/// Raw byte transport to the peer tile.
pub trait LinkTransport {
    /// Send one complete frame (header included).
    fn send_bytes(&mut self, frame: &[u8]) -> Result<()>;
}

/// What the receive callback did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxOutcome {
    /// Payload was queued for the consumer (false if dropped by policy).
    pub delivered: bool,
    /// The DMA buffer may be reused. Always true: the payload is copied.
    pub buffer_returned: bool,
}

/// One tile's end of the link.
pub struct LinkEndpoint {
    callback_id: u8,
    rx: BoundedQueue<Message, LINK_DEPTH>,
    tx: BoundedQueue<Message, LINK_DEPTH>,
}

impl LinkEndpoint {
    pub const fn new(callback_id: u8, policy: OverflowPolicy) -> Self {
        Self {
            callback_id,
            rx: BoundedQueue::new(policy),
            tx: BoundedQueue::new(policy),
        }
    }

    pub fn callback_id(&self) -> u8 {
        self.callback_id
    }

    // ── Receive side ──────────────────────────────────────────

    /// DMA receive callback. Safe to call from interrupt context.
    ///
    /// Validates the header, strips it and queues the payload. Header
    /// errors are reported without queueing anything.
    pub fn on_receive(&self, frame: &[u8]) -> Result<RxOutcome> {
        let (&id, payload) = frame.split_first().ok_or(LinkError::MissingHeader)?;
        if id != self.callback_id {
            return Err(LinkError::ForeignHeader(id).into());
        }
        let msg = Message::from_slice(payload).map_err(|_| LinkError::Oversized(payload.len()))?;

        let delivered = match self.rx.push(msg)? {
            Pushed::Queued => true,
            Pushed::Dropped => {
                warn!("link[{}]: rx buffer full, {} bytes lost", id, payload.len());
                false
            }
        };
        Ok(RxOutcome {
            delivered,
            buffer_returned: true,
        })
    }

    /// Next received message, if any.
    pub fn try_recv(&self) -> Result<Option<Message>> {
        self.rx.try_recv()
    }

    /// Next received message, blocking until one arrives.
    pub fn recv(&self) -> Result<Message> {
        let msg = self.rx.recv_blocking()?;
        debug!("link[{}]: received {} bytes", self.callback_id, msg.len());
        Ok(msg)
    }

    // ── Send side ─────────────────────────────────────────────

    /// Queue `payload` for the peer.
    pub fn submit(&self, payload: &[u8]) -> Result<Pushed> {
        let msg = Message::from_slice(payload).map_err(|_| LinkError::Oversized(payload.len()))?;
        self.tx.push(msg)
    }

    /// Frame every queued message for `peer_id` and hand it to `transport`.
    /// Returns the number of frames sent.
    ///
    /// Stops at the first transport error. The message that failed is lost
    /// (logged at `warn!`); messages behind it stay queued.
    pub fn pump(&self, peer_id: u8, transport: &mut impl LinkTransport) -> Result<usize> {
        let mut sent = 0;
        while let Some(msg) = self.tx.try_recv()? {
            let mut frame: Vec<u8, FRAME_MAX> = Vec::new();
            // Capacity is MTU + 1, header plus any message always fits.
            let _ = frame.push(peer_id);
            let _ = frame.extend_from_slice(&msg);
            if let Err(e) = transport.send_bytes(&frame) {
                warn!(
                    "link[{}]: send to {} failed, {} bytes lost: {}",
                    self.callback_id,
                    peer_id,
                    msg.len(),
                    e
                );
                return Err(e);
            }
            sent += 1;
        }
        if sent > 0 {
            debug!("link[{}]: sent {} frames to {}", self.callback_id, sent, peer_id);
        }
        Ok(sent)
    }

    /// Tear down both directions.
    pub fn close(&self) {
        self.rx.close();
        self.tx.close();
    }

    /// Received messages dropped under [`OverflowPolicy::DropAndLog`].
    pub fn rx_dropped(&self) -> u32 {
        self.rx.dropped()
    }

    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }
}

/// Transport that delivers frames straight into a peer endpoint's receive
/// callback, standing in for the DMA channel between two tiles.
pub struct PeerWire<'a> {
    peer: &'a LinkEndpoint,
}

impl<'a> PeerWire<'a> {
    pub fn new(peer: &'a LinkEndpoint) -> Self {
        Self { peer }
    }
}

impl LinkTransport for PeerWire<'_> {
    fn send_bytes(&mut self, frame: &[u8]) -> Result<()> {
        self.peer.on_receive(frame).map(|_| ())
    }
}

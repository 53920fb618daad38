//! Bounded FIFO queues for ISR → task handoff.
//!
//! Uses an `embassy-sync` bounded channel so the producer side (a DMA
//! receive callback, another tile, a test) and the consumer loop share one
//! queue without heap allocation. What happens when the producer finds the
//! queue full is an explicit [`OverflowPolicy`], never implicit.
//!
//! ```text
//! ┌──────────────┐   push()   ┌──────────────┐  try_recv()  ┌──────────────┐
//! │ ISR / peer   │──────────▶│ BoundedQueue │─────────────▶│ Consumer loop│
//! └──────────────┘  (policy)  └──────────────┘              └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use futures_lite::future::{block_on, or};
use log::{error, warn};

use crate::config::OverflowPolicy;
use crate::error::{Error, Result};

/// Result of a non-blocking push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushed {
    Queued,
    /// Queue was full and the policy is [`OverflowPolicy::DropAndLog`].
    Dropped,
}

/// Bounded multi-producer queue with a close flag and an overflow policy.
pub struct BoundedQueue<T, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, T, N>,
    policy: OverflowPolicy,
    closed: AtomicBool,
    /// Wakes threads parked in the blocking forms when the queue closes.
    close_signal: Signal<CriticalSectionRawMutex, ()>,
    dropped: AtomicU32,
}

impl<T, const N: usize> BoundedQueue<T, N> {
    pub const fn new(policy: OverflowPolicy) -> Self {
        Self {
            channel: Channel::new(),
            policy,
            closed: AtomicBool::new(false),
            close_signal: Signal::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Non-blocking push. Safe to call from interrupt context.
    pub fn push(&self, item: T) -> Result<Pushed> {
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }
        match self.channel.try_send(item) {
            Ok(()) => Ok(Pushed::Queued),
            Err(TrySendError::Full(_)) => match self.policy {
                OverflowPolicy::Halt => {
                    error!("queue: full ({} slots), halting", N);
                    Err(Error::ChannelFull)
                }
                OverflowPolicy::DropAndLog => {
                    let lost = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!("queue: full ({} slots), message dropped ({} total)", N, lost);
                    Ok(Pushed::Dropped)
                }
            },
        }
    }

    /// Push, blocking the calling thread while the queue is full.
    ///
    /// Only meaningful when a different thread drains the queue. Returns
    /// `ChannelClosed` if the queue is closed while waiting for space.
    pub fn send_blocking(&self, item: T) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }
        block_on(or(
            async {
                self.channel.send(item).await;
                Ok(())
            },
            self.closed_wait(),
        ))
    }

    /// Pop the oldest item if one is queued.
    ///
    /// Items queued before [`close`](Self::close) are still delivered;
    /// `ChannelClosed` is reported once the queue is closed *and* empty.
    pub fn try_recv(&self) -> Result<Option<T>> {
        match self.channel.try_receive() {
            Ok(item) => Ok(Some(item)),
            Err(_) if self.is_closed() => Err(Error::ChannelClosed),
            Err(_) => Ok(None),
        }
    }

    /// Pop the oldest item, blocking the calling thread until one arrives.
    ///
    /// Returns `ChannelClosed` if the queue is closed while waiting.
    pub fn recv_blocking(&self) -> Result<T> {
        if let Some(item) = self.try_recv()? {
            return Ok(item);
        }
        // `or` polls the receive side first, so a queued item beats close.
        block_on(or(
            async { Ok(self.channel.receive().await) },
            self.closed_wait(),
        ))
    }

    /// Tear the queue down; producers get `ChannelClosed` from now on and
    /// threads parked in the blocking forms are woken.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.close_signal.signal(());
    }

    /// Resolves once the queue is closed.
    async fn closed_wait<R>(&self) -> Result<R> {
        self.close_signal.wait().await;
        // Waiting consumes the signal; pass it on to any other parked thread.
        self.close_signal.signal(());
        Err(Error::ChannelClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }

    /// Messages lost under [`OverflowPolicy::DropAndLog`].
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }
}

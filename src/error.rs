//! Unified error types for the controller and the inter-tile link.
//!
//! A single `Error` enum that every subsystem converts into, so the dispatch
//! loop has one thing to propagate. All variants are `Copy` so they can be
//! returned out of ISR-side callbacks without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A producer pushed into a full bounded queue under the halt policy.
    ChannelFull,
    /// The transport behind a channel was torn down.
    ChannelClosed,
    /// Configuration or source registration is invalid.
    Config(&'static str),
    /// The inter-tile link rejected a frame.
    Link(LinkError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelFull => write!(f, "channel full"),
            Self::ChannelClosed => write!(f, "channel closed"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Link(e) => write!(f, "link: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Frame was shorter than the one-byte header.
    MissingHeader,
    /// Header names a callback id this endpoint did not register.
    ForeignHeader(u8),
    /// Payload exceeds the link MTU.
    Oversized(usize),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "frame has no header"),
            Self::ForeignHeader(id) => write!(f, "unexpected callback id {id}"),
            Self::Oversized(len) => write!(f, "payload of {len} bytes exceeds MTU"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

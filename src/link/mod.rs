//! Cross-thread and cross-tile message plumbing.
//!
//! - [`queue`] — bounded FIFO with an explicit overflow policy.
//! - [`bridge`] — header-framed message relay between two tiles.

pub mod bridge;
pub mod queue;

//! ledmux — event-multiplexed GPIO/PWM-LED controller.
//!
//! A single-threaded dispatch loop waits on buttons, an inbound duty
//! channel and two periodic timers, and drives a bit-mask LED port: a
//! software-PWM group and a heartbeat. A small header-framed bridge carries
//! bytes between tiles. All hardware access goes through the port traits in
//! [`app::ports`], so the whole crate runs on the host against
//! [`adapters::sim::SimBoard`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod link;
pub mod scheduler;

pub use error::{Error, Result};

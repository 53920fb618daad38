//! Board-level building blocks driven by the dispatch loop.

pub mod buttons;
pub mod led_mask;
pub mod pwm;

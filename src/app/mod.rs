//! Application core — the dispatch loop and its collaborators, zero I/O.
//!
//! All interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod cancel;
pub mod controller;
pub mod dimmer;
pub mod ports;
pub mod registry;

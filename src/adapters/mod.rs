//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter | Implements                               | Connects to            |
//! |---------|------------------------------------------|------------------------|
//! | `gpio`  | InputPort, OutputPort                    | `embedded-hal` pins    |
//! | `sim`   | InputPort, OutputPort, EventSender,      | virtual clock + script |
//! |         | Triggers                                 |                        |

pub mod gpio;
pub mod sim;

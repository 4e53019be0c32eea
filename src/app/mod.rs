//! Application boundary — port traits and outbound events.
//!
//! Everything the duty-cycle core needs from the outside world is named
//! here as a trait in [`ports`], keeping the core testable without a
//! sensor on the bench.

pub mod events;
pub mod ports;

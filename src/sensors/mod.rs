//! Sensor-side logic — sample windows, warm-up filtering and the
//! reporting-mode handshake.
//!
//! Nothing here talks to hardware; the driver is reached only through
//! [`ParticulateDriver`](crate::app::ports::ParticulateDriver).

pub mod filter;
pub mod negotiator;
pub mod window;

pub use filter::filter_window;
pub use negotiator::{Negotiated, ensure_active};
pub use window::{RawSample, Reading, SampleWindow, WINDOW_CAPACITY};

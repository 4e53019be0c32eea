//! PMSD — duty-cycle controller for SDS011-class particulate sensors.
//!
//! Keeps the sensor in standby most of the time, wakes it periodically,
//! drops the warm-up reports, averages the rest and hands the latest
//! reading to consumers without ever blocking them on sensor I/O.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                      │
//! │   external UART driver / SimulatedSds011                     │
//! │   SystemClock   LogEventSink                                 │
//! │  ─────────────── Port Trait Boundary ────────────────────    │
//! │   ┌──────────────────────────────────────────────────────┐   │
//! │   │  DutyCycle (scheduler)                               │   │
//! │   │    negotiator · filter · ReadingStore                │   │
//! │   └──────────────────────────────────────────────────────┘   │
//! │   Controller (background task lifecycle)                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so the crate builds and tests on the host.

#![deny(unused_must_use)]

// Critical-section implementation for the `embassy-sync` mutex in `store`.
#[cfg(target_os = "espidf")]
use esp_idf_hal as _;
#[cfg(not(target_os = "espidf"))]
use critical_section as _;

pub mod adapters;
pub mod app;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod scheduler;
pub mod sensors;
pub mod store;

pub use controller::Controller;
pub use error::{Error, Result};

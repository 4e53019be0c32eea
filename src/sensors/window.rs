//! Raw sample windows and the filtered [`Reading`] they reduce to.
//!
//! The sensor reports concentrations as fixed-point tenths of a µg/m³
//! (`123` = 12.3 µg/m³). A window holds the raw reports collected during
//! one active phase, in arrival order.

use heapless::Vec;
use serde::{Deserialize, Serialize};

/// Hard upper bound on samples collected per active phase.
pub const WINDOW_CAPACITY: usize = 64;

/// One raw report from the sensor, in tenths of a µg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawSample {
    pub pm25: u16,
    pub pm10: u16,
}

impl RawSample {
    pub const fn new(pm25: u16, pm10: u16) -> Self {
        Self { pm25, pm10 }
    }
}

/// Samples collected during one active phase, oldest first.
pub type SampleWindow = Vec<RawSample, WINDOW_CAPACITY>;

/// A filtered PM2.5 / PM10 pair in µg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    pub pm25: f32,
    pub pm10: f32,
}

impl Reading {
    /// Convert averaged raw tenths into physical units.
    pub fn from_tenths(pm25: u16, pm10: u16) -> Self {
        Self {
            pm25: f32::from(pm25) / 10.0,
            pm10: f32::from(pm10) / 10.0,
        }
    }

    /// `true` if either component is not a number.
    pub fn is_nan(&self) -> bool {
        self.pm25.is_nan() || self.pm10.is_nan()
    }
}

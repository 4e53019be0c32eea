//! Host-side SDS011 simulation.
//!
//! Implements [`ParticulateDriver`] without a UART so the duty-cycle task
//! can run on a workstation or in CI. Mirrors the behaviours of the real
//! part that the controller depends on:
//!
//! - powers up awake in passive mode;
//! - ignores commands while in standby (queries time out);
//! - streams one report per `pumps_per_sample` pumps while awake and in
//!   active mode, reading high for the first [`WARMUP_SAMPLES`] reports
//!   after waking;
//! - a query interrupted by standby completes with whatever was collected.

use log::debug;

use crate::app::ports::{ParticulateDriver, QueryDelegate, ReportingMode};
use crate::error::DriverError;
use crate::sensors::window::{RawSample, SampleWindow};

/// Reports emitted before the simulated optics settle.
pub const WARMUP_SAMPLES: u32 = 10;

/// Extra tenths added per remaining warm-up report.
const WARMUP_OVERSHOOT: u16 = 40;

pub struct SimulatedSds011 {
    mode: ReportingMode,
    asleep: bool,
    settled: RawSample,
    pumps_per_sample: u32,
    pumps: u32,
    reports_since_wake: u32,
    query: Option<usize>,
    interrupted: bool,
    window: SampleWindow,
}

impl SimulatedSds011 {
    /// `settled` is what the sensor reports once warmed up.
    pub fn new(settled: RawSample, pumps_per_sample: u32) -> Self {
        Self {
            mode: ReportingMode::Passive,
            asleep: false,
            settled,
            pumps_per_sample: pumps_per_sample.max(1),
            pumps: 0,
            reports_since_wake: 0,
            query: None,
            interrupted: false,
            window: SampleWindow::new(),
        }
    }

    pub fn mode(&self) -> ReportingMode {
        self.mode
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    fn next_report(&mut self) -> RawSample {
        let remaining = WARMUP_SAMPLES.saturating_sub(self.reports_since_wake) as u16;
        self.reports_since_wake += 1;
        let overshoot = remaining.saturating_mul(WARMUP_OVERSHOOT);
        RawSample::new(
            self.settled.pm25.saturating_add(overshoot),
            self.settled.pm10.saturating_add(overshoot),
        )
    }

    fn complete(&mut self, delegate: &mut dyn QueryDelegate) {
        self.query = None;
        self.interrupted = false;
        if self.window.is_empty() {
            delegate.on_query_completed(Err(DriverError::InvalidWindow));
        } else {
            delegate.on_query_completed(Ok(&self.window));
        }
    }
}

impl ParticulateDriver for SimulatedSds011 {
    fn reporting_mode(&mut self) -> Result<ReportingMode, DriverError> {
        if self.asleep {
            return Err(DriverError::Timeout);
        }
        Ok(self.mode)
    }

    fn set_reporting_mode(&mut self, mode: ReportingMode) -> Result<(), DriverError> {
        if self.asleep {
            return Err(DriverError::Timeout);
        }
        self.mode = mode;
        Ok(())
    }

    fn set_sleep(&mut self, sleep: bool) {
        if sleep && self.query.is_some() {
            self.interrupted = true;
        }
        if !sleep && self.asleep {
            self.reports_since_wake = 0;
        }
        self.asleep = sleep;
    }

    fn start_query(&mut self, max_samples: usize) {
        debug!("SimSds011: query for {} samples", max_samples);
        self.window.clear();
        self.interrupted = false;
        self.query = Some(max_samples.min(self.window.capacity()));
    }

    fn perform_work(&mut self, delegate: &mut dyn QueryDelegate) {
        if self.interrupted {
            self.complete(delegate);
            return;
        }
        if self.asleep || self.mode != ReportingMode::Active {
            return;
        }

        self.pumps += 1;
        if self.pumps % self.pumps_per_sample != 0 {
            return;
        }

        let report = self.next_report();
        let Some(max) = self.query else {
            return;
        };
        // Capacity is bounded by `start_query`, so the push cannot fail.
        let _ = self.window.push(report);
        if self.window.len() >= max {
            self.complete(delegate);
        }
    }
}

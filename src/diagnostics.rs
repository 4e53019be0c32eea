//! Runtime counters for the duty-cycle task.
//!
//! Written by the duty-cycle task, read from any context. Counters are
//! independent relaxed atomics; a snapshot is not a consistent cut across
//! all of them, which is fine for telemetry.

use core::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct CycleStats {
    cycles: AtomicU32,
    readings_accepted: AtomicU32,
    windows_rejected: AtomicU32,
    negotiation_failures: AtomicU32,
    mode_corrections: AtomicU32,
}

/// Point-in-time copy of [`CycleStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStatsSnapshot {
    /// Completed sleep + sample cycles.
    pub cycles: u32,
    pub readings_accepted: u32,
    /// Windows dropped by the filter or reported invalid by the driver.
    pub windows_rejected: u32,
    pub negotiation_failures: u32,
    /// Negotiation passes that had to switch the sensor to active mode.
    pub mode_corrections: u32,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycles: AtomicU32::new(0),
            readings_accepted: AtomicU32::new(0),
            windows_rejected: AtomicU32::new(0),
            negotiation_failures: AtomicU32::new(0),
            mode_corrections: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_accepted(&self) {
        self.readings_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.windows_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_negotiation_failure(&self) {
        self.negotiation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_mode_correction(&self) {
        self.mode_corrections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CycleStatsSnapshot {
        CycleStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            readings_accepted: self.readings_accepted.load(Ordering::Relaxed),
            windows_rejected: self.windows_rejected.load(Ordering::Relaxed),
            negotiation_failures: self.negotiation_failures.load(Ordering::Relaxed),
            mode_corrections: self.mode_corrections.load(Ordering::Relaxed),
        }
    }
}

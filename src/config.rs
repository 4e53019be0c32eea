//! Duty-cycle configuration parameters
//!
//! All tunable parameters for the controller. The defaults reproduce the
//! reference duty cycle: 210 s standby, 30 s running, 20 samples per run
//! with the first 10 (the sensor's 10 s response time) thrown away.
//! Values can be loaded from JSON or from a postcard blob kept in NVS.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sensors::window::WINDOW_CAPACITY;

/// Largest phase duration accepted. Deadlines are compared as a signed
/// difference on a wrapping `u32` millisecond clock, so every duration
/// must stay below half the clock range.
pub const MAX_PHASE_MS: u32 = i32::MAX as u32;

/// Core duty-cycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DutyCycleConfig {
    // --- Timing ---
    /// Time spent with the sensor in standby per cycle (milliseconds)
    pub sleep_duration_ms: u32,
    /// Time spent with the sensor running per cycle (milliseconds)
    pub sample_duration_ms: u32,
    /// Yield between two driver pumps (milliseconds)
    pub pump_interval_ms: u32,

    // --- Sampling ---
    /// Samples requested from the driver per active phase
    pub samples_per_cycle: u8,
    /// Leading samples dropped as warm-up before averaging
    pub discard_samples: u8,

    // --- Mode negotiation ---
    /// Reporting-mode query attempts per negotiation pass
    pub mode_query_attempts: u8,
    /// Wait before a failed negotiation is retried (milliseconds)
    pub negotiation_backoff_ms: u32,
    /// Re-verify the reporting mode after every sampling phase instead of
    /// only when the task starts
    pub renegotiate_every_cycle: bool,

    // --- Background task ---
    /// CPU core the duty-cycle task is pinned to (ESP32 only)
    pub task_core: u8,
    /// FreeRTOS priority of the duty-cycle task (ESP32 only)
    pub task_priority: u8,
    /// Stack size of the duty-cycle task (KiB, ESP32 only)
    pub task_stack_kb: u16,
}

impl Default for DutyCycleConfig {
    fn default() -> Self {
        Self {
            // Timing
            sleep_duration_ms: 210_000,
            sample_duration_ms: 30_000,
            pump_interval_ms: 10,

            // Sampling
            samples_per_cycle: 20,
            discard_samples: 10,

            // Mode negotiation
            mode_query_attempts: 2,
            negotiation_backoff_ms: 1000,
            renegotiate_every_cycle: true,

            // Background task
            task_core: 1,
            task_priority: 5,
            task_stack_kb: 6,
        }
    }
}

impl DutyCycleConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_PHASE_MS).contains(&self.sleep_duration_ms) {
            return Err(Error::Config("sleep_duration_ms out of range"));
        }
        if !(1..=MAX_PHASE_MS).contains(&self.sample_duration_ms) {
            return Err(Error::Config("sample_duration_ms out of range"));
        }
        if !(1..=MAX_PHASE_MS).contains(&self.negotiation_backoff_ms) {
            return Err(Error::Config("negotiation_backoff_ms out of range"));
        }
        if self.pump_interval_ms == 0 || self.pump_interval_ms > self.sample_duration_ms {
            return Err(Error::Config(
                "pump_interval_ms must be non-zero and within the sampling phase",
            ));
        }
        if self.samples_per_cycle == 0 || usize::from(self.samples_per_cycle) > WINDOW_CAPACITY {
            return Err(Error::Config("samples_per_cycle exceeds window capacity"));
        }
        if self.discard_samples >= self.samples_per_cycle {
            return Err(Error::Config(
                "discard_samples must leave at least one sample to average",
            ));
        }
        if self.mode_query_attempts == 0 {
            return Err(Error::Config("mode_query_attempts must be at least 1"));
        }
        if self.task_core > 1 {
            return Err(Error::Config("task_core must be 0 or 1"));
        }
        if self.task_stack_kb < 2 {
            return Err(Error::Config("task_stack_kb too small"));
        }
        Ok(())
    }

    /// Total length of one sleep + sample cycle (milliseconds).
    pub fn cycle_duration_ms(&self) -> u64 {
        u64::from(self.sleep_duration_ms) + u64::from(self.sample_duration_ms)
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Encode as a compact postcard blob for NVS.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("postcard encode failed"))
    }

    /// Decode and validate a postcard blob read back from NVS.
    pub fn from_blob(bytes: &[u8]) -> Result<Self> {
        let cfg: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("corrupted config blob"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

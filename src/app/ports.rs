//! Port traits — the boundary between the duty-cycle core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DutyCycle (domain)
//! ```
//!
//! The sensor-protocol driver, the clock and the event sink implement
//! these traits. The [`DutyCycle`](crate::scheduler::DutyCycle) consumes
//! them via generics, so the core never touches a UART or a timer directly.

use embedded_hal::delay::DelayNs;

use crate::error::DriverError;
use crate::sensors::window::SampleWindow;

// ───────────────────────────────────────────────────────────────
// Sensor driver port (driven adapter: domain ↔ SDS011 protocol driver)
// ───────────────────────────────────────────────────────────────

/// How the sensor emits measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportingMode {
    /// The sensor streams a report every second while awake.
    Active,
    /// The sensor only reports when queried.
    Passive,
}

/// Asynchronous, non-blocking sensor-protocol driver.
///
/// Commands that expect a reply (`reporting_mode`, `set_reporting_mode`)
/// are bounded and return promptly. Everything else makes progress only
/// inside [`perform_work`](Self::perform_work), which must be called often.
pub trait ParticulateDriver {
    /// Ask the sensor for its current reporting mode.
    fn reporting_mode(&mut self) -> Result<ReportingMode, DriverError>;

    /// Switch the sensor's reporting mode.
    fn set_reporting_mode(&mut self, mode: ReportingMode) -> Result<(), DriverError>;

    /// Put the sensor into standby (`true`) or wake it (`false`).
    fn set_sleep(&mut self, sleep: bool);

    /// Begin collecting up to `max_samples` reports. Completion is
    /// signalled through the delegate passed to a later `perform_work`.
    fn start_query(&mut self, max_samples: usize);

    /// Advance the driver's internal state machine. Never blocks.
    fn perform_work(&mut self, delegate: &mut dyn QueryDelegate);
}

/// Completion callback for [`ParticulateDriver::start_query`].
///
/// Invoked from inside `perform_work`, on the duty-cycle task.
pub trait QueryDelegate {
    /// `Ok` carries the collected window; `Err` means the driver judged
    /// the window unusable.
    fn on_query_completed(&mut self, outcome: Result<&SampleWindow, DriverError>);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock plus the delay primitive the duty-cycle
/// task yields through.
///
/// `now_ms` wraps at `u32::MAX`; callers compare deadlines by signed
/// difference.
pub trait Clock: DelayNs {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The duty-cycle core emits structured
/// [`DutyCycleEvent`](super::events::DutyCycleEvent)s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::DutyCycleEvent);
}

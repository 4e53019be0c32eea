//! Reporting-mode handshake run before every duty cycle.
//!
//! The sensor may come back from a brown-out or a foreign tool in passive
//! mode, in which case it never streams reports and the sampling phase
//! would collect nothing. Each pass queries the mode (with a bounded
//! number of attempts) and switches the sensor to active if needed.

use log::{debug, info};

use crate::app::ports::{ParticulateDriver, ReportingMode};
use crate::error::{DriverError, NegotiationError};

/// Result of a successful negotiation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiated {
    /// The sensor was already in active mode.
    AlreadyActive,
    /// The sensor was switched from `from` to active.
    Corrected { from: ReportingMode },
}

/// Query the reporting mode up to `attempts` times, then make sure the
/// sensor is in active mode.
///
/// Exactly `attempts` queries are made before giving up; `attempts` of
/// zero is treated as one.
pub fn ensure_active<D>(driver: &mut D, attempts: u8) -> Result<Negotiated, NegotiationError>
where
    D: ParticulateDriver + ?Sized,
{
    let attempts = attempts.max(1);
    let mut last = DriverError::Timeout;
    let mut mode = None;

    for attempt in 1..=attempts {
        match driver.reporting_mode() {
            Ok(m) => {
                mode = Some(m);
                break;
            }
            Err(e) => {
                debug!("Mode query attempt {}/{} failed: {}", attempt, attempts, e);
                last = e;
            }
        }
    }

    let Some(mode) = mode else {
        return Err(NegotiationError::QueryFailed { attempts, last });
    };

    if mode == ReportingMode::Active {
        return Ok(Negotiated::AlreadyActive);
    }

    driver
        .set_reporting_mode(ReportingMode::Active)
        .map_err(NegotiationError::SetModeFailed)?;
    info!("Sensor reporting mode {:?} -> Active", mode);
    Ok(Negotiated::Corrected { from: mode })
}

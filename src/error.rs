//! Error types for the duty-cycle controller.
//!
//! [`Error`] covers the failures a caller can see: a rejected configuration
//! or a task that could not be started. Sensor-side failures never reach the
//! caller; the duty-cycle loop absorbs them and reports them as
//! [`DutyCycleEvent`](crate::app::events::DutyCycleEvent)s, so the
//! per-subsystem enums are `Copy` to travel without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Failures surfaced to the caller of the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be decoded.
    Config(&'static str),
    /// The background duty-cycle task could not be started.
    Spawn,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn => write!(f, "failed to spawn duty-cycle task"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The sensor did not answer within the driver's reply window.
    Timeout,
    /// A reply frame was malformed or failed its checksum.
    MalformedReply,
    /// The driver flagged the collected sample window as unusable.
    InvalidWindow,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor did not respond"),
            Self::MalformedReply => write!(f, "malformed reply"),
            Self::InvalidWindow => write!(f, "sample window invalid"),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    /// Nothing is left once the warm-up samples are discarded.
    InsufficientSamples { collected: usize, discarded: usize },
    /// An averaged component is not a number.
    NotANumber,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSamples {
                collected,
                discarded,
            } => write!(
                f,
                "{collected} samples collected, {discarded} discarded as warm-up"
            ),
            Self::NotANumber => write!(f, "average is not a number"),
        }
    }
}

// ---------------------------------------------------------------------------
// Negotiation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationError {
    /// Every reporting-mode query attempt failed.
    QueryFailed { attempts: u8, last: DriverError },
    /// The sensor rejected the switch to active reporting.
    SetModeFailed(DriverError),
}

impl fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed { attempts, last } => {
                write!(f, "mode query failed after {attempts} attempts ({last})")
            }
            Self::SetModeFailed(e) => write!(f, "set active mode failed ({e})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

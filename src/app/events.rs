//! Outbound duty-cycle events.
//!
//! The [`DutyCycle`](crate::scheduler::DutyCycle) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to serial, publish, or record in tests.

use crate::error::{DriverError, FilterError, NegotiationError};
use crate::scheduler::Phase;
use crate::sensors::window::Reading;

use super::ports::ReportingMode;

/// Structured events emitted by the duty-cycle core.
#[derive(Debug, Clone, PartialEq)]
pub enum DutyCycleEvent {
    /// The duty-cycle task entered its loop.
    Started,

    /// The state machine moved between phases.
    PhaseChanged { from: Phase, to: Phase },

    /// The sensor was found in another mode and switched to active.
    ModeCorrected { from: ReportingMode },

    /// A negotiation pass failed; a retry follows after the backoff.
    NegotiationFailed(NegotiationError),

    /// A sampling request was issued.
    QueryStarted { max_samples: usize },

    /// A window was filtered and the result stored.
    ReadingAccepted(Reading),

    /// A window could not be reduced; the previous reading stays current.
    ReadingRejected(FilterError),

    /// The driver reported the window itself as unusable.
    QueryFailed(DriverError),

    /// The task observed cancellation and left its loop.
    Stopped,
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl super::ports::EventSink for NullSink {
    fn emit(&mut self, _event: &DutyCycleEvent) {}
}

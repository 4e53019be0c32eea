//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing duty-cycle events to the logger
//! (UART / USB-CDC on target). A future MQTT adapter would implement the
//! same trait.

use log::{debug, info, warn};

use crate::app::events::DutyCycleEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DutyCycleEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DutyCycleEvent) {
        match event {
            DutyCycleEvent::Started => info!("START | duty-cycle task running"),
            DutyCycleEvent::PhaseChanged { from, to } => {
                info!("PHASE | {:?} -> {:?}", from, to);
            }
            DutyCycleEvent::ModeCorrected { from } => {
                info!("NEGOTIATE | reporting mode {:?} -> Active", from);
            }
            DutyCycleEvent::NegotiationFailed(e) => warn!("NEGOTIATE | failed: {}", e),
            DutyCycleEvent::QueryStarted { max_samples } => {
                debug!("QUERY | collecting up to {} samples", max_samples);
            }
            DutyCycleEvent::ReadingAccepted(r) => {
                info!(
                    "READING | PM2.5={:.1}\u{00b5}g/m\u{00b3} PM10={:.1}\u{00b5}g/m\u{00b3}",
                    r.pm25, r.pm10
                );
            }
            DutyCycleEvent::ReadingRejected(e) => warn!("READING | dropped: {}", e),
            DutyCycleEvent::QueryFailed(e) => warn!("QUERY | failed: {}", e),
            DutyCycleEvent::Stopped => info!("STOP | duty-cycle task exiting"),
        }
    }
}

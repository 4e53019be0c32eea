//! Duty-cycle state machine.
//!
//! Keeps the sensor in standby most of the time and wakes it for a short
//! sampling run each cycle, which is what the manufacturer recommends to
//! stretch the laser diode's service life.
//!
//! ```text
//!              ┌──────────── failure: backoff, retry ───────────┐
//!              ▼                                                │
//!   ┌─────────────────┐  ok   ┌──────────┐  sleep_ms  ┌──────────┴┐
//!   │   Negotiating   │─────▶│ Sleeping │──────────▶│  Sampling  │
//!   └─────────────────┘       └──────────┘            └─────┬──────┘
//!              ▲                    ▲        sample_ms      │
//!              │                    └───── (fixed mode) ────┤
//!              └─────────────── (renegotiate) ──────────────┘
//!
//!   any phase boundary or pump tick with cancellation raised ──▶ Stopped
//! ```
//!
//! Both timed phases are bounded loops that pump the driver and yield for
//! `pump_interval_ms` between pumps; the driver is non-blocking and only
//! makes progress inside `perform_work`. A completed sampling request is
//! filtered and written to the [`ReadingStore`] from inside the pump call.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::app::events::DutyCycleEvent;
use crate::app::ports::{Clock, EventSink, ParticulateDriver, QueryDelegate};
use crate::config::DutyCycleConfig;
use crate::diagnostics::CycleStats;
use crate::error::DriverError;
use crate::sensors::filter::filter_window;
use crate::sensors::negotiator::{Negotiated, ensure_active};
use crate::sensors::window::SampleWindow;
use crate::store::ReadingStore;

// ═══════════════════════════════════════════════════════════════
//  Phases and cancellation
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Verifying (and if needed correcting) the reporting mode.
    Negotiating,
    /// Sensor in standby.
    Sleeping,
    /// Sensor awake, sampling request in flight.
    Sampling,
    /// Cancellation observed; terminal.
    Stopped,
}

/// Cooperative stop signal shared between the controller and its task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// `true` while `deadline` lies in the future of `now` on a wrapping
/// millisecond clock.
pub fn deadline_pending(deadline: u32, now: u32) -> bool {
    (deadline.wrapping_sub(now) as i32) > 0
}

// ═══════════════════════════════════════════════════════════════
//  Duty-cycle engine
// ═══════════════════════════════════════════════════════════════

/// Owns the driver and clock for the lifetime of the duty-cycle task.
///
/// Normally driven by [`run`](Self::run) on the controller's background
/// thread; [`step`](Self::step) executes exactly one phase, which lets
/// tests walk the machine against a simulated clock.
pub struct DutyCycle<D, C, S> {
    driver: D,
    clock: C,
    sink: S,
    config: DutyCycleConfig,
    store: Arc<ReadingStore>,
    stats: Arc<CycleStats>,
    phase: Phase,
}

impl<D, C, S> DutyCycle<D, C, S>
where
    D: ParticulateDriver,
    C: Clock,
    S: EventSink,
{
    pub fn new(
        driver: D,
        clock: C,
        sink: S,
        config: DutyCycleConfig,
        store: Arc<ReadingStore>,
        stats: Arc<CycleStats>,
    ) -> Self {
        Self {
            driver,
            clock,
            sink,
            config,
            store,
            stats,
            phase: Phase::Negotiating,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run phases until `cancel` is raised. Returns with the machine in
    /// [`Phase::Stopped`].
    pub fn run(&mut self, cancel: &CancelToken) {
        info!(
            "Duty cycle: {}ms standby / {}ms sampling, {} samples (discard {})",
            self.config.sleep_duration_ms,
            self.config.sample_duration_ms,
            self.config.samples_per_cycle,
            self.config.discard_samples
        );
        self.sink.emit(&DutyCycleEvent::Started);

        while self.step(cancel) != Phase::Stopped {}
    }

    /// Execute the current phase to completion and move to the next one.
    pub fn step(&mut self, cancel: &CancelToken) -> Phase {
        if self.phase == Phase::Stopped {
            return Phase::Stopped;
        }
        if cancel.is_cancelled() {
            self.transition(Phase::Stopped);
            return Phase::Stopped;
        }

        let next = match self.phase {
            Phase::Negotiating => self.negotiate(cancel),
            Phase::Sleeping => self.sleep(cancel),
            Phase::Sampling => self.sample(cancel),
            Phase::Stopped => Phase::Stopped,
        };

        let next = if cancel.is_cancelled() {
            Phase::Stopped
        } else {
            next
        };
        self.transition(next);
        next
    }

    // ───────────────────────────────────────────────────────────
    //  Phases
    // ───────────────────────────────────────────────────────────

    fn negotiate(&mut self, cancel: &CancelToken) -> Phase {
        match ensure_active(&mut self.driver, self.config.mode_query_attempts) {
            Ok(outcome) => {
                self.store.set_health_issue(false);
                if let Negotiated::Corrected { from } = outcome {
                    self.stats.record_mode_correction();
                    self.sink.emit(&DutyCycleEvent::ModeCorrected { from });
                }
                Phase::Sleeping
            }
            Err(e) => {
                warn!(
                    "Negotiation failed: {}, retrying in {}ms",
                    e, self.config.negotiation_backoff_ms
                );
                self.store.set_health_issue(true);
                self.stats.record_negotiation_failure();
                self.sink.emit(&DutyCycleEvent::NegotiationFailed(e));
                self.wait(self.config.negotiation_backoff_ms, cancel, false);
                Phase::Negotiating
            }
        }
    }

    fn sleep(&mut self, cancel: &CancelToken) -> Phase {
        self.driver.set_sleep(true);
        self.wait(self.config.sleep_duration_ms, cancel, true);
        Phase::Sampling
    }

    fn sample(&mut self, cancel: &CancelToken) -> Phase {
        let max_samples = usize::from(self.config.samples_per_cycle);
        self.driver.set_sleep(false);
        self.driver.start_query(max_samples);
        self.sink.emit(&DutyCycleEvent::QueryStarted { max_samples });

        if self.wait(self.config.sample_duration_ms, cancel, true) {
            self.stats.record_cycle();
        }

        if self.config.renegotiate_every_cycle {
            Phase::Negotiating
        } else {
            Phase::Sleeping
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Internal
    // ───────────────────────────────────────────────────────────

    /// Spend `duration_ms` yielding in `pump_interval_ms` slices, pumping
    /// the driver before each yield if `pump` is set. Returns `false` if
    /// cut short by cancellation.
    fn wait(&mut self, duration_ms: u32, cancel: &CancelToken, pump: bool) -> bool {
        let deadline = self.clock.now_ms().wrapping_add(duration_ms);
        while deadline_pending(deadline, self.clock.now_ms()) {
            if cancel.is_cancelled() {
                return false;
            }
            if pump {
                self.pump();
            }
            self.clock.delay_ms(self.config.pump_interval_ms);
        }
        true
    }

    fn pump(&mut self) {
        let mut completion = Completion {
            store: &self.store,
            stats: &self.stats,
            sink: &mut self.sink,
            discard: usize::from(self.config.discard_samples),
        };
        self.driver.perform_work(&mut completion);
    }

    fn transition(&mut self, next: Phase) {
        if next == self.phase {
            return;
        }
        debug!("Duty cycle: {:?} -> {:?}", self.phase, next);
        self.sink.emit(&DutyCycleEvent::PhaseChanged {
            from: self.phase,
            to: next,
        });
        self.phase = next;
        if next == Phase::Stopped {
            info!("Duty cycle stopped");
            self.sink.emit(&DutyCycleEvent::Stopped);
        }
    }
}

/// Query completion handler handed to the driver on every pump.
struct Completion<'a> {
    store: &'a ReadingStore,
    stats: &'a CycleStats,
    sink: &'a mut dyn EventSink,
    discard: usize,
}

impl QueryDelegate for Completion<'_> {
    fn on_query_completed(&mut self, outcome: Result<&SampleWindow, DriverError>) {
        let window = match outcome {
            Ok(window) => window,
            Err(e) => {
                warn!("Sampling query failed: {}", e);
                self.stats.record_rejected();
                self.sink.emit(&DutyCycleEvent::QueryFailed(e));
                return;
            }
        };

        match filter_window(window, self.discard) {
            Ok(reading) => {
                // Values and new-data flag are published together.
                self.store.write(reading);
                self.stats.record_accepted();
                self.sink.emit(&DutyCycleEvent::ReadingAccepted(reading));
            }
            Err(e) => {
                warn!("Dropping sample window: {}", e);
                self.stats.record_rejected();
                self.sink.emit(&DutyCycleEvent::ReadingRejected(e));
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

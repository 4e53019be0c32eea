//! Controller lifecycle — owns the background duty-cycle task.
//!
//! ```text
//!  ┌─────────────────────────┐        ┌──────────────────────────────┐
//!  │  Caller context          │        │  "pmsd" task (core 1)        │
//!  │                          │ spawn  │                              │
//!  │  Controller::start() ────┼──────▶│  DutyCycle::run()            │
//!  │                          │        │    driver · clock · sink     │
//!  │  pm25() / pm10()         │◀──────┤  ReadingStore::write()       │
//!  │  take_new_data()         │  Arc   │                              │
//!  │  has_health_issue()      │        │                              │
//!  │                          │ cancel │                              │
//!  │  stop() / drop ──────────┼──────▶│  leaves loop at next tick    │
//!  └─────────────────────────┘  join  └──────────────────────────────┘
//! ```
//!
//! The driver and clock are moved into the task and never touched from
//! the caller's side. Readers only ever take the store's short lock.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::app::ports::{Clock, EventSink, ParticulateDriver};
use crate::config::DutyCycleConfig;
use crate::diagnostics::{CycleStats, CycleStatsSnapshot};
use crate::drivers::task_pin::{Core, TaskSpec, spawn_on_core};
use crate::error::Error;
use crate::scheduler::{CancelToken, DutyCycle};
use crate::sensors::window::Reading;
use crate::store::ReadingStore;

/// FreeRTOS task name for the duty-cycle thread.
const TASK_NAME: &str = "pmsd\0";

/// Handle to a running duty-cycle task and its read-only surface.
pub struct Controller {
    store: Arc<ReadingStore>,
    stats: Arc<CycleStats>,
    cancel: CancelToken,
    task: Option<JoinHandle<()>>,
}

impl Controller {
    /// Start the duty cycle, logging events to the console.
    pub fn start<D, C>(driver: D, clock: C, config: DutyCycleConfig) -> Result<Self>
    where
        D: ParticulateDriver + Send + 'static,
        C: Clock + Send + 'static,
    {
        Self::start_with_sink(driver, clock, LogEventSink::new(), config)
    }

    /// Start the duty cycle with a custom event sink. Returns as soon as
    /// the background task has been spawned.
    pub fn start_with_sink<D, C, S>(
        driver: D,
        clock: C,
        sink: S,
        config: DutyCycleConfig,
    ) -> Result<Self>
    where
        D: ParticulateDriver + Send + 'static,
        C: Clock + Send + 'static,
        S: EventSink + Send + 'static,
    {
        config.validate().context("invalid duty-cycle configuration")?;

        let store = Arc::new(ReadingStore::new());
        let stats = Arc::new(CycleStats::new());
        let cancel = CancelToken::new();

        let spec = TaskSpec {
            name: TASK_NAME,
            core: Core::from_index(config.task_core),
            priority: config.task_priority,
            stack_kb: usize::from(config.task_stack_kb),
        };

        let mut duty_cycle = DutyCycle::new(
            driver,
            clock,
            sink,
            config,
            Arc::clone(&store),
            Arc::clone(&stats),
        );
        let task_cancel = cancel.clone();
        let task =
            spawn_on_core(spec, move || duty_cycle.run(&task_cancel)).map_err(spawn_failed)?;

        Ok(Self {
            store,
            stats,
            cancel,
            task: Some(task),
        })
    }

    /// Latest PM2.5 concentration (µg/m³); 0.0 until the first reading.
    pub fn pm25(&self) -> f32 {
        self.store.pm25()
    }

    /// Latest PM10 concentration (µg/m³); 0.0 until the first reading.
    pub fn pm10(&self) -> f32 {
        self.store.pm10()
    }

    /// Both components from the same reading.
    pub fn reading(&self) -> Reading {
        self.store.latest()
    }

    /// `true` while the sensor fails the reporting-mode handshake. The
    /// last good reading stays available but is going stale.
    pub fn has_health_issue(&self) -> bool {
        self.store.has_health_issue()
    }

    /// `true` exactly once per new reading.
    pub fn take_new_data(&self) -> bool {
        self.store.take_new_data()
    }

    pub fn stats(&self) -> CycleStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the task to stop and wait for it. Idempotent.
    pub fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.cancel.cancel();
        if task.join().is_err() {
            warn!("Duty-cycle task panicked");
        } else {
            info!("Duty-cycle task joined");
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// [`Error::Spawn`] with the OS error kept as its cause.
fn spawn_failed(e: io::Error) -> anyhow::Error {
    anyhow::Error::new(e).context(Error::Spawn)
}

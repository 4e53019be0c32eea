//! Single-slot handoff between the duty-cycle task and its readers.
//!
//! ```text
//! ┌────────────────┐  write()   ┌─────────────────┐  pm25()/pm10()   ┌──────────┐
//! │ duty-cycle task│──────────▶│  ReadingStore    │◀────────────────│ consumer │
//! │  (producer)    │            │ reading + fresh  │ take_new_data() │          │
//! └────────────────┘            │ health (atomic)  │                 └──────────┘
//!                               └─────────────────┘
//! ```
//!
//! The reading and its new-data flag live under one `embassy-sync` blocking
//! mutex, so a reader that observes the flag also observes the values that
//! raised it. The health flag is independent of the reading and is a plain
//! atomic.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::sensors::window::Reading;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    reading: Reading,
    fresh: bool,
}

/// Latest accepted reading plus the one-shot "new data" and the
/// persistent "health issue" flags.
pub struct ReadingStore {
    slot: Mutex<CriticalSectionRawMutex, Cell<Slot>>,
    health_issue: AtomicBool,
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingStore {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                reading: Reading {
                    pm25: 0.0,
                    pm10: 0.0,
                },
                fresh: false,
            })),
            health_issue: AtomicBool::new(false),
        }
    }

    /// Replace the current reading and raise the new-data flag.
    pub fn write(&self, reading: Reading) {
        self.slot.lock(|slot| {
            slot.set(Slot {
                reading,
                fresh: true,
            });
        });
    }

    /// Both components from one consistent snapshot.
    pub fn latest(&self) -> Reading {
        self.slot.lock(|slot| slot.get().reading)
    }

    pub fn pm25(&self) -> f32 {
        self.latest().pm25
    }

    pub fn pm10(&self) -> f32 {
        self.latest().pm10
    }

    /// Return the new-data flag and clear it. Each write is reported as
    /// new at most once.
    pub fn take_new_data(&self) -> bool {
        self.slot.lock(|slot| {
            let mut s = slot.get();
            let fresh = s.fresh;
            s.fresh = false;
            slot.set(s);
            fresh
        })
    }

    /// `true` while the last negotiation pass failed.
    pub fn has_health_issue(&self) -> bool {
        self.health_issue.load(Ordering::Acquire)
    }

    pub(crate) fn set_health_issue(&self, failed: bool) {
        self.health_issue.store(failed, Ordering::Release);
    }
}

//! Execution-substrate helpers for the background duty-cycle task.

pub mod task_pin;

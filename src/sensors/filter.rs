//! Discard-then-average reduction of a sample window.
//!
//! The sensor needs about 10 s after waking before its readings settle,
//! longer than it takes to collect the first few reports. Those leading
//! samples are dropped and the remainder averaged; both components are
//! produced together or not at all.

use crate::error::FilterError;

use super::window::{RawSample, Reading, SampleWindow};

/// Reduce `window` to a single reading after dropping its first
/// `discard` samples.
pub fn filter_window(window: &SampleWindow, discard: usize) -> Result<Reading, FilterError> {
    let settled = settled_samples(window, discard)?;

    let (pm25, pm10) = average_tenths(settled);
    let reading = Reading::from_tenths(pm25, pm10);
    if reading.is_nan() {
        return Err(FilterError::NotANumber);
    }
    Ok(reading)
}

fn settled_samples(window: &SampleWindow, discard: usize) -> Result<&[RawSample], FilterError> {
    match window.get(discard..) {
        Some(rest) if !rest.is_empty() => Ok(rest),
        _ => Err(FilterError::InsufficientSamples {
            collected: window.len(),
            discarded: discard,
        }),
    }
}

/// Integer mean in tenths, rounded half-up. `samples` must be non-empty.
fn average_tenths(samples: &[RawSample]) -> (u16, u16) {
    let n = samples.len() as u32;
    let (sum25, sum10) = samples.iter().fold((0u32, 0u32), |(a, b), s| {
        (a + u32::from(s.pm25), b + u32::from(s.pm10))
    });
    let mean = |sum: u32| ((sum + n / 2) / n) as u16;
    (mean(sum25), mean(sum10))
}

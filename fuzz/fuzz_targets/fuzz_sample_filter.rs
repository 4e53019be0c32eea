//! Fuzz target: `filter_window`
//!
//! Builds a sample window from arbitrary bytes (first byte is the discard
//! count, then little-endian PM2.5/PM10 pairs) and checks that filtering
//! never panics and that a produced reading is finite and non-negative.
//!
//! cargo fuzz run fuzz_sample_filter

#![no_main]

use libfuzzer_sys::fuzz_target;
use pmsd::sensors::filter::filter_window;
use pmsd::sensors::window::{RawSample, SampleWindow};

fuzz_target!(|data: &[u8]| {
    let Some((&discard, rest)) = data.split_first() else {
        return;
    };

    let mut window = SampleWindow::new();
    for pair in rest.chunks_exact(4) {
        let pm25 = u16::from_le_bytes([pair[0], pair[1]]);
        let pm10 = u16::from_le_bytes([pair[2], pair[3]]);
        if window.push(RawSample::new(pm25, pm10)).is_err() {
            break;
        }
    }

    match filter_window(&window, usize::from(discard)) {
        Ok(reading) => {
            assert!(window.len() > usize::from(discard));
            assert!(reading.pm25.is_finite() && reading.pm25 >= 0.0);
            assert!(reading.pm10.is_finite() && reading.pm10 >= 0.0);
        }
        Err(_) => assert!(window.len() <= usize::from(discard)),
    }
});

//! Duty-cycle state machine walked phase by phase on a simulated clock.

use std::sync::Arc;

use pmsd::app::events::DutyCycleEvent;
use pmsd::app::ports::ReportingMode;
use pmsd::config::DutyCycleConfig;
use pmsd::diagnostics::CycleStats;
use pmsd::error::{DriverError, FilterError, NegotiationError};
use pmsd::scheduler::{CancelToken, DutyCycle, Phase};
use pmsd::sensors::window::Reading;
use pmsd::store::ReadingStore;

use super::mock_sensor::{DriverCall, MockSensor, RecordingSink, SimClock, window};

type Machine = DutyCycle<MockSensor, SimClock, RecordingSink>;

fn make_machine(sensor: MockSensor, clock: SimClock, config: DutyCycleConfig) -> (Machine, RecordingSink) {
    let sink = RecordingSink::new();
    let dc = DutyCycle::new(
        sensor,
        clock,
        sink.clone(),
        config,
        Arc::new(ReadingStore::new()),
        Arc::new(CycleStats::new()),
    );
    (dc, sink)
}

/// Short phases so multi-cycle tests stay quick.
fn fast_config() -> DutyCycleConfig {
    DutyCycleConfig {
        sleep_duration_ms: 2_000,
        sample_duration_ms: 1_000,
        ..DutyCycleConfig::default()
    }
}

// ── End-to-end: passive sensor, one full cycle ───────────────

#[test]
fn passive_sensor_is_corrected_then_one_reading_is_produced() {
    let mut sensor = MockSensor::new();
    sensor.mode_replies.push_back(Ok(ReportingMode::Passive));
    sensor
        .windows
        .push_back(Ok(window(10, (999, 999), 10, (123, 456))));
    // Completes 20 s into the 30 s sampling phase (10 ms pump interval).
    sensor.complete_after_pumps = 2_000;

    let clock = SimClock::starting_at(0);
    let (mut dc, sink) = make_machine(sensor, clock.clone(), DutyCycleConfig::default());
    let cancel = CancelToken::new();

    // Negotiating -> Sleeping
    assert_eq!(dc.step(&cancel), Phase::Sleeping);
    assert!(sink.contains(&DutyCycleEvent::ModeCorrected {
        from: ReportingMode::Passive
    }));
    assert_eq!(
        dc.driver().calls,
        vec![DriverCall::QueryMode, DriverCall::SetMode(ReportingMode::Active)]
    );
    assert!(!dc.store().has_health_issue());

    // Sleeping -> Sampling after the full 210 s standby
    assert_eq!(dc.step(&cancel), Phase::Sampling);
    assert_eq!(clock.now(), 210_000);
    assert_eq!(dc.driver().calls.last(), Some(&DriverCall::Sleep(true)));
    assert!(!dc.store().take_new_data());

    // Sampling -> Negotiating after the 30 s run
    assert_eq!(dc.step(&cancel), Phase::Negotiating);
    assert_eq!(clock.now(), 240_000);
    assert!(dc.driver().calls.ends_with(&[
        DriverCall::Sleep(false),
        DriverCall::StartQuery(20),
    ]));

    assert_eq!(dc.store().latest(), Reading { pm25: 12.3, pm10: 45.6 });
    assert!(dc.store().take_new_data());
    assert!(!dc.store().take_new_data());

    let stats = dc.stats().snapshot();
    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.readings_accepted, 1);
    assert_eq!(stats.mode_corrections, 1);

    assert_eq!(
        sink.count(|e| matches!(e, DutyCycleEvent::PhaseChanged { .. })),
        3
    );
}

// ── Negotiation failures ─────────────────────────────────────

#[test]
fn failed_queries_raise_health_and_block_sleep_sample_alternation() {
    let mut sensor = MockSensor::new();
    for _ in 0..4 {
        sensor.mode_replies.push_back(Err(DriverError::Timeout));
    }
    let clock = SimClock::starting_at(0);
    let (mut dc, sink) = make_machine(sensor, clock.clone(), fast_config());
    let cancel = CancelToken::new();

    assert_eq!(dc.step(&cancel), Phase::Negotiating);
    assert!(dc.store().has_health_issue());
    assert_eq!(dc.driver().mode_queries(), 2, "exactly two attempts per pass");
    assert_eq!(clock.now(), 1_000, "backoff before the next pass");

    assert_eq!(dc.step(&cancel), Phase::Negotiating);
    assert!(dc.store().has_health_issue());
    assert_eq!(dc.driver().mode_queries(), 4);
    assert_eq!(dc.driver().sleep_commands(), 0);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            DutyCycleEvent::NegotiationFailed(NegotiationError::QueryFailed { attempts: 2, .. })
        )),
        2
    );

    // Script exhausted: the sensor answers again and the cycle starts.
    assert_eq!(dc.step(&cancel), Phase::Sleeping);
    assert!(!dc.store().has_health_issue(), "cleared on recovery");
    assert_eq!(dc.stats().snapshot().negotiation_failures, 2);
}

#[test]
fn rejected_mode_switch_is_a_negotiation_failure() {
    let mut sensor = MockSensor::new();
    sensor.fallback_mode = Ok(ReportingMode::Passive);
    sensor.set_mode_result = Err(DriverError::MalformedReply);
    let (mut dc, sink) = make_machine(sensor, SimClock::starting_at(0), fast_config());

    assert_eq!(dc.step(&CancelToken::new()), Phase::Negotiating);
    assert!(dc.store().has_health_issue());
    assert!(sink.contains(&DutyCycleEvent::NegotiationFailed(
        NegotiationError::SetModeFailed(DriverError::MalformedReply)
    )));
}

#[test]
fn stale_reading_survives_negotiation_failure() {
    let mut sensor = MockSensor::new();
    sensor.mode_replies.push_back(Ok(ReportingMode::Active));
    // Stops answering after the first cycle.
    sensor.fallback_mode = Err(DriverError::Timeout);
    sensor.windows.push_back(Ok(window(10, (0, 0), 5, (50, 80))));
    let (mut dc, _sink) = make_machine(sensor, SimClock::starting_at(0), fast_config());
    let cancel = CancelToken::new();

    for _ in 0..3 {
        dc.step(&cancel);
    }
    assert_eq!(dc.store().latest(), Reading { pm25: 5.0, pm10: 8.0 });
    assert!(dc.store().take_new_data());

    assert_eq!(dc.step(&cancel), Phase::Negotiating);
    assert!(dc.store().has_health_issue());
    assert_eq!(dc.store().latest(), Reading { pm25: 5.0, pm10: 8.0 });
    assert!(!dc.store().take_new_data());
}

// ── Filtering failures ───────────────────────────────────────

#[test]
fn window_of_only_warm_up_samples_leaves_store_untouched() {
    let mut sensor = MockSensor::new();
    sensor.windows.push_back(Ok(window(10, (0, 0), 10, (200, 300))));
    sensor.windows.push_back(Ok(window(10, (999, 999), 0, (0, 0))));
    let (mut dc, sink) = make_machine(sensor, SimClock::starting_at(0), fast_config());
    let cancel = CancelToken::new();

    // First cycle: Negotiating, Sleeping, Sampling.
    for _ in 0..3 {
        dc.step(&cancel);
    }
    assert!(dc.store().take_new_data());
    let first = dc.store().latest();

    // Second cycle: the window holds exactly the discard count.
    for _ in 0..3 {
        dc.step(&cancel);
    }
    assert_eq!(dc.store().latest(), first);
    assert!(!dc.store().take_new_data());
    assert!(!dc.store().has_health_issue(), "filter failures do not flag health");
    assert!(sink.contains(&DutyCycleEvent::ReadingRejected(
        FilterError::InsufficientSamples {
            collected: 10,
            discarded: 10
        }
    )));

    let stats = dc.stats().snapshot();
    assert_eq!(stats.cycles, 2);
    assert_eq!(stats.readings_accepted, 1);
    assert_eq!(stats.windows_rejected, 1);
}

#[test]
fn driver_reported_invalid_window_produces_no_reading() {
    let mut sensor = MockSensor::new();
    sensor.windows.push_back(Err(DriverError::InvalidWindow));
    let (mut dc, sink) = make_machine(sensor, SimClock::starting_at(0), fast_config());
    let cancel = CancelToken::new();

    for _ in 0..3 {
        dc.step(&cancel);
    }
    assert!(!dc.store().take_new_data());
    assert_eq!(dc.store().latest(), Reading::default());
    assert!(sink.contains(&DutyCycleEvent::QueryFailed(DriverError::InvalidWindow)));
}

// ── Cycle shape ──────────────────────────────────────────────

#[test]
fn fixed_mode_alternates_without_renegotiating() {
    let mut sensor = MockSensor::new();
    for _ in 0..3 {
        sensor.windows.push_back(Ok(window(10, (0, 0), 10, (10, 10))));
    }
    let config = DutyCycleConfig {
        renegotiate_every_cycle: false,
        ..fast_config()
    };
    let (mut dc, _sink) = make_machine(sensor, SimClock::starting_at(0), config);
    let cancel = CancelToken::new();

    assert_eq!(dc.step(&cancel), Phase::Sleeping);
    for _ in 0..3 {
        assert_eq!(dc.step(&cancel), Phase::Sampling);
        assert_eq!(dc.step(&cancel), Phase::Sleeping);
    }
    assert_eq!(dc.driver().mode_queries(), 1);
    assert_eq!(dc.stats().snapshot().cycles, 3);
}

#[test]
fn renegotiates_before_every_cycle_by_default() {
    let mut sensor = MockSensor::new();
    sensor.windows.push_back(Ok(window(10, (0, 0), 10, (10, 10))));
    sensor.windows.push_back(Ok(window(10, (0, 0), 10, (10, 10))));
    let (mut dc, _sink) = make_machine(sensor, SimClock::starting_at(0), fast_config());
    let cancel = CancelToken::new();

    for _ in 0..6 {
        dc.step(&cancel);
    }
    assert_eq!(dc.phase(), Phase::Negotiating);
    assert_eq!(dc.driver().mode_queries(), 2);
}

#[test]
fn phase_timing_is_correct_across_clock_wraparound() {
    let start = u32::MAX - 500;
    let clock = SimClock::starting_at(start);
    let (mut dc, _sink) = make_machine(MockSensor::new(), clock.clone(), fast_config());
    let cancel = CancelToken::new();

    dc.step(&cancel); // Negotiating, no time spent
    assert_eq!(clock.now(), start);

    assert_eq!(dc.step(&cancel), Phase::Sampling);
    assert_eq!(clock.now().wrapping_sub(start), 2_000);
    assert!(clock.now() < start, "clock wrapped during standby");

    assert_eq!(dc.step(&cancel), Phase::Negotiating);
    assert_eq!(clock.now().wrapping_sub(start), 3_000);
}

#[test]
fn pump_runs_throughout_both_timed_phases() {
    let (mut dc, _sink) = make_machine(MockSensor::new(), SimClock::starting_at(0), fast_config());
    let cancel = CancelToken::new();

    dc.step(&cancel);
    dc.step(&cancel);
    assert_eq!(dc.driver().pumps, 200, "2 s standby at 10 ms per pump");
    dc.step(&cancel);
    assert_eq!(dc.driver().pumps, 300);
}

// ── Cancellation ─────────────────────────────────────────────

#[test]
fn cancellation_before_step_stops_immediately() {
    let (mut dc, sink) = make_machine(MockSensor::new(), SimClock::starting_at(0), fast_config());
    let cancel = CancelToken::new();
    cancel.cancel();

    assert_eq!(dc.step(&cancel), Phase::Stopped);
    assert!(dc.driver().calls.is_empty());
    assert_eq!(
        sink.events(),
        vec![
            DutyCycleEvent::PhaseChanged {
                from: Phase::Negotiating,
                to: Phase::Stopped
            },
            DutyCycleEvent::Stopped,
        ]
    );
    // Terminal.
    assert_eq!(dc.step(&cancel), Phase::Stopped);
}

#[test]
fn cancellation_cuts_standby_short() {
    let cancel = CancelToken::new();
    let mut sensor = MockSensor::new();
    sensor.cancel_on_pump = Some((100, cancel.clone()));
    let clock = SimClock::starting_at(0);
    let (mut dc, _sink) = make_machine(sensor, clock.clone(), DutyCycleConfig::default());

    assert_eq!(dc.step(&cancel), Phase::Sleeping);
    assert_eq!(dc.step(&cancel), Phase::Stopped);
    assert_eq!(clock.now(), 1_000, "left standby one pump after cancel");
    assert_eq!(dc.driver().count(&DriverCall::StartQuery(20)), 0);
}

#[test]
fn cancelled_task_sends_no_mode_queries() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut sensor = MockSensor::new();
    sensor.fallback_mode = Err(DriverError::Timeout);
    let clock = SimClock::starting_at(0);
    let (mut dc, _sink) = make_machine(sensor, clock.clone(), fast_config());

    assert_eq!(dc.step(&cancel), Phase::Stopped);
    assert_eq!(dc.driver().mode_queries(), 0);
    assert_eq!(clock.now(), 0);
}

#[test]
fn run_returns_once_cancelled() {
    let cancel = CancelToken::new();
    let mut sensor = MockSensor::new();
    for _ in 0..4 {
        sensor.windows.push_back(Ok(window(10, (0, 0), 10, (77, 88))));
    }
    // 2.5 cycles worth of pumps at 300 pumps per cycle.
    sensor.cancel_on_pump = Some((750, cancel.clone()));
    let (mut dc, sink) = make_machine(sensor, SimClock::starting_at(0), fast_config());

    dc.run(&cancel);

    assert_eq!(dc.phase(), Phase::Stopped);
    let events = sink.events();
    assert_eq!(events.first(), Some(&DutyCycleEvent::Started));
    assert_eq!(events.last(), Some(&DutyCycleEvent::Stopped));
    assert_eq!(dc.stats().snapshot().cycles, 2);
    assert_eq!(dc.store().latest(), Reading { pm25: 7.7, pm10: 8.8 });
}

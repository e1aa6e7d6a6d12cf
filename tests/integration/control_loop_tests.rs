//! Integration tests for the IrrigationService control loop.
//!
//! Every test drives real service code against `MockHardware` and a
//! virtual clock, so a 5 s pump hold costs nothing.

use crate::mock_hw::{leaked_channels, HwCall, MockClock, MockHardware, RecordingSink, ScriptedAdc, SharedGpio};

use soilguard::adapters::hardware::HardwareAdapter;
use soilguard::app::events::AppEvent;
use soilguard::app::service::IrrigationService;
use soilguard::app::status::Fault;
use soilguard::config::{SensorKind, SystemConfig};
use soilguard::control::{ActivationCause, ActivationState};
use soilguard::drivers::pump::{PumpDriver, RelayLine};
use soilguard::drivers::status_led::StatusLed;
use soilguard::error::ActuatorError;
use soilguard::app::ports::{ActuatorPort, Level};
use soilguard::scheduler::Cadence;
use soilguard::sensors::soil::SoilMoistureSensor;

fn service(cfg: &SystemConfig) -> (IrrigationService<'static>, soilguard::app::service::Channels<'static>) {
    let ch = leaked_channels();
    (IrrigationService::new(cfg, ch).unwrap(), ch)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_forces_pump_off_and_blinks() {
    let cfg = SystemConfig::default();
    let (mut svc, ch) = service(&cfg);
    let mut hw = MockHardware::new();
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.start(&mut hw, &mut clock, &mut sink);

    assert_eq!(hw.calls[0], HwCall::Pump(false));
    assert_eq!(hw.indicator_calls(), usize::from(cfg.startup_blinks) + 1);
    assert_eq!(hw.calls.last(), Some(&HwCall::Indicator(true)));
    assert_eq!(clock.now_ms, u64::from(cfg.startup_blinks) * u64::from(cfg.blink_interval_ms));
    assert_eq!(sink.events, vec![AppEvent::Started { state: ActivationState::Idle }]);
    assert_eq!(ch.status.snapshot().state, ActivationState::Idle);
}

// ── Threshold activation ──────────────────────────────────────

#[test]
fn dry_soil_runs_one_timed_pump_cycle() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);

    assert_eq!(svc.state(), ActivationState::Active);
    assert_eq!(hw.pump_calls(), vec![true, false]);
    assert_eq!(clock.now_ms, 5_000);
    // 50 toggles during the hold, then solid on
    assert_eq!(hw.indicator_calls(), 51);
    assert_eq!(hw.calls.last(), Some(&HwCall::Indicator(true)));

    assert!(sink.events.contains(&AppEvent::StateChanged {
        from: ActivationState::Idle,
        to: ActivationState::Active,
    }));
    assert!(sink.events.contains(&AppEvent::PumpStarted { cause: ActivationCause::Threshold, at_ms: 0 }));
    assert!(sink.events.contains(&AppEvent::PumpStopped { held_ms: 5_000, aborted: false }));

    let snap = ch.status.snapshot();
    assert!(!snap.pump_on);
    assert_eq!(snap.state, ActivationState::Active);
    assert_eq!(snap.activations, 1);
    assert_eq!(snap.last_activation_ms, Some(0));
    assert_eq!(snap.last_cause, Some(ActivationCause::Threshold));
    assert_eq!(snap.cycles, 1);
}

#[test]
fn dead_band_prevents_chatter() {
    let (mut svc, _ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[
        Some(30.0), // activate
        Some(52.0), // dead band, stays Active
        Some(59.9), // still inside
        Some(60.0), // upper edge releases
        Some(52.0), // dead band, stays Idle
        Some(50.0), // lower edge activates again
    ]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let mut states = Vec::new();
    for _ in 0..6 {
        svc.tick(&mut hw, &mut clock, &mut sink);
        states.push(svc.state());
    }

    use ActivationState::{Active, Idle};
    assert_eq!(states, vec![Active, Active, Active, Idle, Idle, Active]);
    assert_eq!(hw.pump_calls(), vec![true, false, true, false]);
}

#[test]
fn raw_reading_flows_through_calibration() {
    let cfg = SystemConfig::default();
    let (mut svc, ch) = service(&cfg);
    let gpio = SharedGpio::default();
    let sensor = SoilMoistureSensor::new(ScriptedAdc::new(&[300, 2300]), 7, cfg.calibration(), cfg.sensor_settle_ms);
    let pump = PumpDriver::new(gpio.clone(), RelayLine::new(27, false)).unwrap();
    let led = StatusLed::new(gpio.clone(), 2).unwrap();
    let mut hw = HardwareAdapter::new(sensor, pump, led);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    // dry endpoint: 0 %
    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(svc.state(), ActivationState::Active);
    assert_eq!(gpio.writes_to(27), vec![Level::Low, Level::High, Level::Low]);
    assert_eq!(clock.now_ms, 1_000 + 5_000);
    assert!(sink.events.contains(&AppEvent::PumpStarted { cause: ActivationCause::Threshold, at_ms: 1_000 }));
    let m = ch.status.measurement().unwrap();
    assert_eq!(m.raw, Some(300));
    assert!(m.percent.abs() < f32::EPSILON);

    // wet endpoint: 100 %, released
    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(svc.state(), ActivationState::Idle);
    assert_eq!(gpio.writes_to(27).len(), 3);
    assert!((ch.status.measurement().unwrap().percent - 100.0).abs() < f32::EPSILON);
    assert_eq!(gpio.level(2), Some(Level::High));
}

#[test]
fn out_of_range_raw_is_clamped_and_reported() {
    let cfg = SystemConfig::default();
    let (mut svc, ch) = service(&cfg);
    let gpio = SharedGpio::default();
    let sensor = SoilMoistureSensor::new(ScriptedAdc::new(&[4095]), 7, cfg.calibration(), 0);
    let pump = PumpDriver::new(gpio.clone(), RelayLine::new(27, false)).unwrap();
    let led = StatusLed::new(gpio.clone(), 2).unwrap();
    let mut hw = HardwareAdapter::new(sensor, pump, led);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);

    assert!(sink.events.contains(&AppEvent::CalibrationClamped { raw: Some(4095) }));
    let m = ch.status.measurement().unwrap();
    assert!(m.clamped);
    assert!((m.percent - 100.0).abs() < f32::EPSILON);
    assert_eq!(svc.state(), ActivationState::Idle);
    assert_eq!(svc.fault(), None);
}

#[test]
fn humidity_mode_triggers_above_band() {
    let cfg = SystemConfig {
        sensor: SensorKind::Humidity,
        threshold_percent: 70.0,
        band_percent: 5.0,
        ..SystemConfig::default()
    };
    let (mut svc, _ch) = service(&cfg);
    let mut hw = MockHardware::with_readings(&[Some(74.9), Some(75.0), Some(66.0), Some(65.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let mut states = Vec::new();
    for _ in 0..4 {
        svc.tick(&mut hw, &mut clock, &mut sink);
        states.push(svc.state());
    }

    use ActivationState::{Active, Idle};
    assert_eq!(states, vec![Idle, Active, Active, Idle]);
    assert_eq!(hw.pump_calls(), vec![true, false]);
}

// ── Manual override ───────────────────────────────────────────

#[test]
fn override_runs_pump_on_wet_soil() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(80.0), Some(80.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    ch.override_request.request();
    ch.override_request.request();
    svc.tick(&mut hw, &mut clock, &mut sink);

    assert_eq!(hw.pump_calls(), vec![true, false]);
    assert_eq!(svc.state(), ActivationState::Active);
    assert!(sink.events.contains(&AppEvent::PumpStarted { cause: ActivationCause::Override, at_ms: 0 }));
    assert!(!ch.override_request.is_pending());
    assert_eq!(ch.status.snapshot().last_cause, Some(ActivationCause::Override));

    // consumed once: wet soil now just releases
    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(svc.state(), ActivationState::Idle);
    assert_eq!(hw.pump_calls(), vec![true, false]);
}

#[test]
fn override_while_active_reruns_pump() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0), Some(40.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);
    ch.override_request.request();
    svc.tick(&mut hw, &mut clock, &mut sink);

    assert_eq!(hw.pump_calls(), vec![true, false, true, false]);
    assert_eq!(ch.status.snapshot().activations, 2);
}

#[test]
fn override_survives_sensor_failure() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[None, Some(80.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    ch.override_request.request();
    svc.tick(&mut hw, &mut clock, &mut sink);
    assert!(hw.calls.is_empty());
    assert!(ch.override_request.is_pending());

    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(hw.pump_calls(), vec![true, false]);
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn sensor_failures_skip_cycles_without_actuation() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[None, None, None, Some(58.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    for _ in 0..3 {
        svc.tick(&mut hw, &mut clock, &mut sink);
    }

    assert_eq!(svc.state(), ActivationState::Idle);
    assert!(hw.calls.is_empty());
    assert_eq!(svc.fault(), Some(Fault::SensorUnavailable));
    let snap = ch.status.snapshot();
    assert_eq!(snap.consecutive_sensor_failures, 3);
    assert_eq!(snap.cycles, 3);
    assert_eq!(snap.measurement, None);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorUnavailable { .. })), 3);
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::SensorUnavailable { consecutive: 3, .. })
    ));

    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(svc.fault(), None);
    assert_eq!(ch.status.snapshot().consecutive_sensor_failures, 0);
    assert!(sink.events.contains(&AppEvent::FaultCleared));
    assert!(hw.calls.is_empty());
}

#[test]
fn sensor_failure_keeps_active_state() {
    let (mut svc, _ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0), None]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);
    svc.tick(&mut hw, &mut clock, &mut sink);

    assert_eq!(svc.state(), ActivationState::Active);
    assert_eq!(hw.pump_calls(), vec![true, false]);
}

// ── Actuator faults ───────────────────────────────────────────

#[test]
fn failed_pump_on_reverts_state_and_retries() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0), Some(30.0)]);
    hw.fail_pump_on = 1;
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(svc.state(), ActivationState::Idle);
    assert!(hw.pump_calls().is_empty());
    assert_eq!(svc.fault(), Some(Fault::ActuatorCommandFailure(ActuatorError::GpioWriteFailed)));
    assert!(sink.events.contains(&AppEvent::ActuatorFault(ActuatorError::GpioWriteFailed)));
    assert_eq!(ch.status.snapshot().activations, 0);

    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(svc.state(), ActivationState::Active);
    assert_eq!(hw.pump_calls(), vec![true, false]);
    assert_eq!(svc.fault(), None);
    assert!(sink.events.contains(&AppEvent::FaultCleared));
}

#[test]
fn failed_pump_off_is_retried_next_cycle() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0), None, Some(52.0)]);
    hw.fail_pump_off = 2;
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);
    assert!(hw.pump_running());
    let snap = ch.status.snapshot();
    assert!(snap.pump_on);
    assert_eq!(snap.fault, Some(Fault::ActuatorCommandFailure(ActuatorError::GpioWriteFailed)));

    // retry fails again; the relay fault outranks the sensor fault
    svc.tick(&mut hw, &mut clock, &mut sink);
    assert!(hw.pump_running());
    assert_eq!(svc.fault(), Some(Fault::ActuatorCommandFailure(ActuatorError::GpioWriteFailed)));

    svc.tick(&mut hw, &mut clock, &mut sink);
    assert!(!hw.pump_running());
    assert_eq!(hw.pump_calls(), vec![true, false]);
    assert_eq!(svc.fault(), None);
    assert!(!ch.status.snapshot().pump_on);
}

#[test]
fn override_is_requeued_when_pump_on_fails() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(80.0), Some(80.0)]);
    hw.fail_pump_on = 1;
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    ch.override_request.request();
    svc.tick(&mut hw, &mut clock, &mut sink);
    assert!(hw.pump_calls().is_empty());
    assert_eq!(svc.state(), ActivationState::Idle);
    assert!(ch.override_request.is_pending());

    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(hw.pump_calls(), vec![true, false]);
    assert_eq!(ch.status.snapshot().last_cause, Some(ActivationCause::Override));
    assert!(!ch.override_request.is_pending());
}

#[test]
fn pump_off_retry_is_sent_after_the_sample() {
    let (mut svc, _ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0), Some(52.0)]);
    hw.fail_pump_off = 1;
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);
    svc.tick(&mut hw, &mut clock, &mut sink);

    assert_eq!(hw.pump_log, vec![(true, 1), (false, 2)]);
    assert_eq!(svc.fault(), None);
}

// ── Emergency stop ────────────────────────────────────────────

#[test]
fn stop_raised_during_settle_cancels_the_run() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0)]);
    hw.settle_ms = 1_000;
    let mut clock = MockClock::new();
    clock.raise_stop_at(500, ch.stop_request);
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);

    assert!(hw.pump_calls().is_empty());
    assert!(sink.events.contains(&AppEvent::PumpStopped { held_ms: 0, aborted: true }));
    assert_eq!(svc.state(), ActivationState::Active);
    assert_eq!(ch.status.snapshot().activations, 0);
    assert!(!ch.stop_request.is_raised());
    assert_eq!(clock.now_ms, 1_000);
}

#[test]
fn stop_request_cuts_hold_short() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0)]);
    let mut clock = MockClock::new();
    clock.raise_stop_at(1_000, ch.stop_request);
    let mut sink = RecordingSink::new();

    svc.tick(&mut hw, &mut clock, &mut sink);

    assert_eq!(clock.now_ms, 1_000);
    assert_eq!(hw.pump_calls(), vec![true, false]);
    assert!(sink.events.contains(&AppEvent::PumpStopped { held_ms: 1_000, aborted: true }));
    assert_eq!(svc.state(), ActivationState::Active);
    assert!(!ch.stop_request.is_raised());
    assert_eq!(hw.calls.last(), Some(&HwCall::Indicator(true)));
}

#[test]
fn stale_stop_is_discarded() {
    let (mut svc, ch) = service(&SystemConfig::default());
    let mut hw = MockHardware::with_readings(&[Some(30.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    ch.stop_request.raise();
    svc.tick(&mut hw, &mut clock, &mut sink);

    assert!(sink.events.contains(&AppEvent::PumpStopped { held_ms: 5_000, aborted: false }));
}

// ── Cadence ───────────────────────────────────────────────────

#[test]
fn cycles_follow_poll_grid_and_reanchor_after_hold() {
    let cfg = SystemConfig::default();
    let (mut svc, ch) = service(&cfg);
    let mut hw = MockHardware::with_readings(&[Some(58.0), Some(58.0), Some(30.0), Some(58.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();
    let mut cadence = Cadence::new(cfg.poll_interval_ms);

    let mut sample_times = Vec::new();
    for _ in 0..4 {
        sample_times.push(clock.now_ms);
        svc.cycle(&mut hw, &mut clock, &mut sink, &mut cadence);
    }

    // third cycle held the pump for 5 s, so the fourth polls straight away
    assert_eq!(sample_times, vec![0, 2_000, 4_000, 9_000]);
    assert_eq!(clock.now_ms, 11_000);
    assert_eq!(cadence.overruns(), 1);
    assert_eq!(ch.status.measurement().unwrap().timestamp_ms, 9_000);
    assert_eq!(svc.cycles(), 4);
}

//! HTTP surface driven end to end against the control loop.
//!
//! The web controller and the service share the same channels, exactly
//! as the firmware statics do; only the transport is skipped.

use crate::mock_hw::{leaked_channels, MockClock, MockHardware, RecordingSink, SharedGpio};

use soilguard::adapters::web::{Route, WebController};
use soilguard::app::ports::Level;
use soilguard::app::service::IrrigationService;
use soilguard::config::SystemConfig;
use soilguard::drivers::pump::{PumpKillSwitch, RelayLine};

#[test]
fn web_override_waters_wet_soil() {
    let ch = leaked_channels();
    let gpio = SharedGpio::default();
    let web = WebController::new(
        ch.override_request,
        ch.status,
        PumpKillSwitch::new(gpio, RelayLine::new(27, false), ch.stop_request),
    );
    let mut svc = IrrigationService::new(&SystemConfig::default(), ch).unwrap();
    let mut hw = MockHardware::with_readings(&[Some(80.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    assert_eq!(web.handle(Route::parse("/get-humidity")).status, 503);
    assert_eq!(web.handle(Route::parse("/custom-button-press")).status, 200);

    svc.tick(&mut hw, &mut clock, &mut sink);
    assert_eq!(hw.pump_calls(), vec![true, false]);

    let r = web.handle(Route::parse("/get-humidity"));
    assert_eq!((r.status, r.body.as_str()), (200, "80.0"));

    let r = web.handle(Route::parse("/api/status"));
    let v: serde_json::Value = serde_json::from_str(&r.body).unwrap();
    assert_eq!(v["last_cause"], "Override");
    assert_eq!(v["activations"], 1);
    assert_eq!(v["state"], "Active");
    assert_eq!(v["pump_on"], false);
    assert_eq!(v["measurement"]["raw"], serde_json::Value::Null);
}

#[test]
fn web_stop_releases_active_low_relay() {
    let ch = leaked_channels();
    let gpio = SharedGpio::default();
    let web = WebController::new(
        ch.override_request,
        ch.status,
        PumpKillSwitch::new(gpio.clone(), RelayLine::new(25, true), ch.stop_request),
    );

    assert_eq!(web.handle(Route::parse("/stop-pump?now=1")).status, 200);
    assert_eq!(gpio.level(25), Some(Level::High));
    assert!(ch.stop_request.is_raised());
}

#[test]
fn stop_before_a_run_does_not_shorten_it() {
    let ch = leaked_channels();
    let web = WebController::new(
        ch.override_request,
        ch.status,
        PumpKillSwitch::new(SharedGpio::default(), RelayLine::new(27, false), ch.stop_request),
    );
    let mut svc = IrrigationService::new(&SystemConfig::default(), ch).unwrap();
    let mut hw = MockHardware::with_readings(&[Some(30.0)]);
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();

    web.handle(Route::StopPump);
    svc.tick(&mut hw, &mut clock, &mut sink);

    assert_eq!(clock.now_ms, 5_000);
}

#[test]
fn index_shows_latest_reading() {
    let ch = leaked_channels();
    let web = WebController::new(
        ch.override_request,
        ch.status,
        PumpKillSwitch::new(SharedGpio::default(), RelayLine::new(27, false), ch.stop_request),
    );
    assert!(web.handle(Route::Index).body.contains("--"));

    let mut svc = IrrigationService::new(&SystemConfig::default(), ch).unwrap();
    let mut hw = MockHardware::with_readings(&[Some(57.5)]);
    svc.tick(&mut hw, &mut MockClock::new(), &mut RecordingSink::new());

    let page = web.handle(Route::parse("/"));
    assert_eq!(page.status, 200);
    assert!(page.content_type.starts_with("text/html"));
    assert!(page.body.contains("57.5%"));
    assert!(page.body.contains("/custom-button-press"));
}

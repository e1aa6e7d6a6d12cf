//! Mock hardware adapter for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching real GPIO/ADC registers.  The clock is
//! virtual: delays advance it instantly.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use soilguard::app::events::AppEvent;
use soilguard::app::ports::{
    ActuatorPort, AdcPort, EventSink, GpioPort, Level, PinMode, SensorPort, TimePort,
};
use soilguard::app::service::Channels;
use soilguard::app::signals::{OverrideRequest, StopRequest};
use soilguard::app::status::StatusPublisher;
use soilguard::error::{ActuatorError, SensorError};
use soilguard::sensors::Measurement;

// ── Channels ──────────────────────────────────────────────────

/// Fresh, leaked channel set so each test gets its own `'static` statics.
pub fn leaked_channels() -> Channels<'static> {
    Channels {
        override_request: Box::leak(Box::new(OverrideRequest::new())),
        stop_request: Box::leak(Box::new(StopRequest::new())),
        status: Box::leak(Box::new(StatusPublisher::new())),
    }
}

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Pump(bool),
    Indicator(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    /// Percent readings handed out one per sample; `None` fails the read.
    pub readings: VecDeque<Option<f32>>,
    pub calls: Vec<HwCall>,
    /// Upcoming pump-ON commands that fail.
    pub fail_pump_on: u32,
    /// Upcoming pump-OFF commands that fail.
    pub fail_pump_off: u32,
    pub samples: u32,
    /// Every accepted pump command with the sample count at that moment.
    pub pump_log: Vec<(bool, u32)>,
    /// Virtual settle delay spent inside each sample.
    pub settle_ms: u32,
    pump: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            readings: VecDeque::new(),
            calls: Vec::new(),
            fail_pump_on: 0,
            fail_pump_off: 0,
            samples: 0,
            pump_log: Vec::new(),
            settle_ms: 0,
            pump: false,
        }
    }

    pub fn with_readings(readings: &[Option<f32>]) -> Self {
        let mut hw = Self::new();
        hw.readings = readings.iter().copied().collect();
        hw
    }

    pub fn push(&mut self, reading: Option<f32>) {
        self.readings.push_back(reading);
    }

    pub fn pump_calls(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Pump(on) => Some(*on),
                HwCall::Indicator(_) => None,
            })
            .collect()
    }

    pub fn indicator_calls(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, HwCall::Indicator(_))).count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn sample(&mut self, clock: &mut impl TimePort) -> Result<Measurement, SensorError> {
        self.samples += 1;
        if self.settle_ms > 0 {
            clock.delay_ms(self.settle_ms);
        }
        match self.readings.pop_front() {
            Some(Some(p)) => Ok(Measurement::new(p, clock.now_ms())),
            Some(None) => Err(SensorError::AdcReadFailed),
            None => Err(SensorError::NoResponse),
        }
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        let failures = if on { &mut self.fail_pump_on } else { &mut self.fail_pump_off };
        if *failures > 0 {
            *failures -= 1;
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.calls.push(HwCall::Pump(on));
        self.pump_log.push((on, self.samples));
        self.pump = on;
        Ok(())
    }

    fn set_indicator(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(HwCall::Indicator(on));
        Ok(())
    }

    fn pump_running(&self) -> bool {
        self.pump
    }
}

// ── Raw I/O mocks for adapter-level tests ─────────────────────

/// ADC returning a scripted sequence, repeating the last value.
pub struct ScriptedAdc {
    values: VecDeque<u16>,
    last: u16,
}

#[allow(dead_code)]
impl ScriptedAdc {
    pub fn new(values: &[u16]) -> Self {
        Self { values: values.iter().copied().collect(), last: 0 }
    }
}

impl AdcPort for ScriptedAdc {
    fn read_analog(&mut self, _channel: u32) -> Result<u16, SensorError> {
        if let Some(v) = self.values.pop_front() {
            self.last = v;
        }
        Ok(self.last)
    }
}

/// GPIO whose write log is shared between clones, so a test can keep a
/// handle while the drivers own theirs.
#[derive(Clone, Default)]
pub struct SharedGpio {
    pub writes: Rc<RefCell<Vec<(i32, Level)>>>,
}

#[allow(dead_code)]
impl SharedGpio {
    pub fn level(&self, pin: i32) -> Option<Level> {
        self.writes.borrow().iter().rev().find(|(p, _)| *p == pin).map(|(_, l)| *l)
    }

    pub fn writes_to(&self, pin: i32) -> Vec<Level> {
        self.writes.borrow().iter().filter(|(p, _)| *p == pin).map(|(_, l)| *l).collect()
    }
}

impl GpioPort for SharedGpio {
    fn set_pin_mode(&mut self, _pin: i32, _mode: PinMode) -> Result<(), ActuatorError> {
        Ok(())
    }

    fn write_pin(&mut self, pin: i32, level: Level) -> Result<(), ActuatorError> {
        self.writes.borrow_mut().push((pin, level));
        Ok(())
    }
}

// ── MockClock ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    pub now_ms: u64,
    pub slept_ms: Vec<u32>,
    sub_ms_ns: u64,
    /// Raise this stop once the clock reaches the given time.
    stop_at: Option<(u64, &'static StopRequest)>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise_stop_at(&mut self, at_ms: u64, stop: &'static StopRequest) {
        self.stop_at = Some((at_ms, stop));
    }

    fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
        if let Some((at, stop)) = self.stop_at {
            if self.now_ms >= at {
                stop.raise();
                self.stop_at = None;
            }
        }
    }
}

impl DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.sub_ms_ns += u64::from(ns);
        let whole = self.sub_ms_ns / 1_000_000;
        self.sub_ms_ns %= 1_000_000;
        self.advance(whole);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.slept_ms.push(ms);
        self.advance(u64::from(ms));
    }
}

impl TimePort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Collects every emitted event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

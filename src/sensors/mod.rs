//! Sensor subsystem: transducer drivers plus the [`SensorHub`] that
//! hands the control loop one normalised [`Measurement`] per cycle.

pub mod calibration;
pub mod dht;
pub mod humidity;
pub mod soil;

use serde::Serialize;

use crate::app::ports::{AdcPort, SensorPort, TimePort};
use crate::error::SensorError;
use dht::DhtBus;
use humidity::HumiditySensor;
use soil::SoilMoistureSensor;

/// One normalised reading.  Superseded every cycle, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// Moisture or relative humidity, always within `0.0..=100.0`.
    pub percent: f32,
    /// Raw ADC value, when the transducer is analog.
    pub raw: Option<u16>,
    /// Milliseconds since boot at capture time.
    pub timestamp_ms: u64,
    /// The raw value fell outside the calibration endpoints and was clamped.
    pub clamped: bool,
}

impl Measurement {
    /// Build a measurement, clamping `percent` into `0..=100`.
    pub fn new(percent: f32, timestamp_ms: u64) -> Self {
        let (percent, clamped) = clamp_percent(percent);
        Self { percent, raw: None, timestamp_ms, clamped }
    }

    pub fn with_raw(mut self, raw: u16) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Clamp into `0..=100`, reporting whether anything was cut off.
/// NaN maps to 0 and counts as clamped.
pub(crate) fn clamp_percent(value: f32) -> (f32, bool) {
    if value.is_nan() {
        return (0.0, true);
    }
    let clamped = value.clamp(0.0, 100.0);
    (clamped, clamped != value)
}

/// The configured transducer.  Exactly one is active per build of the
/// control loop, picked from [`SensorKind`](crate::config::SensorKind).
pub enum SensorHub<A, B> {
    Soil(SoilMoistureSensor<A>),
    Humidity(HumiditySensor<B>),
}

impl<A: AdcPort, B: DhtBus> SensorPort for SensorHub<A, B> {
    fn sample(&mut self, clock: &mut impl TimePort) -> Result<Measurement, SensorError> {
        match self {
            Self::Soil(s) => s.sample(clock),
            Self::Humidity(h) => h.sample(clock),
        }
    }
}

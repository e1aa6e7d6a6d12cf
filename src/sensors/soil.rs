//! Analog soil moisture probe.
//!
//! Powers up with the rest of the board, so each sample just waits a
//! fixed settle delay, takes a one-shot ADC conversion and maps it
//! through the two-point [`Calibration`].
//!
//! ## Dual-target design
//!
//! The probe is generic over [`AdcPort`]; on ESP-IDF that is the oneshot
//! ADC1 unit configured by `hw_init`, on host a simulation stub.

use log::debug;

use super::Measurement;
use super::calibration::Calibration;
use crate::app::ports::{AdcPort, SensorPort, TimePort};
use crate::error::SensorError;

pub struct SoilMoistureSensor<A> {
    adc: A,
    channel: u32,
    calibration: Calibration,
    settle_ms: u32,
}

impl<A: AdcPort> SoilMoistureSensor<A> {
    pub fn new(adc: A, channel: u32, calibration: Calibration, settle_ms: u32) -> Self {
        Self { adc, channel, calibration, settle_ms }
    }
}

impl<A: AdcPort> SensorPort for SoilMoistureSensor<A> {
    fn sample(&mut self, clock: &mut impl TimePort) -> Result<Measurement, SensorError> {
        clock.delay_ms(self.settle_ms);

        let raw = self.adc.read_analog(self.channel)?;
        let n = self.calibration.to_percent(raw);
        debug!("soil: raw={} -> {:.1}%", raw, n.percent);

        Ok(Measurement {
            percent: n.percent,
            raw: Some(raw),
            timestamp_ms: clock.now_ms(),
            clamped: n.clamped,
        })
    }
}

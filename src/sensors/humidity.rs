//! Air humidity variant of the control loop input.
//!
//! Wraps a [`DhtBus`] and reports relative humidity as the loop's
//! percentage.  The part refuses back-to-back conversions, so a request
//! inside [`DhtModel::min_interval_ms`] re-serves the previous reading
//! with a fresh timestamp instead of touching the wire.

use log::debug;

use super::Measurement;
use super::dht::{decode_frame, DhtBus, DhtModel, DhtReading};
use crate::app::ports::{SensorPort, TimePort};
use crate::error::SensorError;

pub struct HumiditySensor<B> {
    bus: B,
    gpio: i32,
    model: DhtModel,
    settle_ms: u32,
    last: Option<(u64, DhtReading)>,
}

impl<B: DhtBus> HumiditySensor<B> {
    pub fn new(bus: B, gpio: i32, model: DhtModel, settle_ms: u32) -> Self {
        Self { bus, gpio, model, settle_ms, last: None }
    }

    fn convert(&mut self, now_ms: u64) -> Result<DhtReading, SensorError> {
        if let Some((at, reading)) = self.last {
            if now_ms.saturating_sub(at) < self.model.min_interval_ms() {
                return Ok(reading);
            }
        }
        let frame = self.bus.read_frame(self.gpio, self.model)?;
        let reading = decode_frame(frame, self.model)?;
        self.last = Some((now_ms, reading));
        Ok(reading)
    }
}

impl<B: DhtBus> SensorPort for HumiditySensor<B> {
    fn sample(&mut self, clock: &mut impl TimePort) -> Result<Measurement, SensorError> {
        clock.delay_ms(self.settle_ms);

        let now = clock.now_ms();
        let reading = self.convert(now)?;
        debug!(
            "dht: {:.1}%RH {:.1}C",
            reading.humidity, reading.temperature_c
        );
        Ok(Measurement::new(reading.humidity, now))
    }
}

//! Hardware adapter: bridges real peripherals to the domain port traits.
//!
//! [`EspGpio`], [`EspAdc`] and [`EspDhtBus`] implement the raw I/O ports
//! on top of `hw_init`.  [`HardwareAdapter`] owns the configured sensor
//! plus the relay and LED drivers and exposes them through
//! [`SensorPort`] and [`ActuatorPort`].  On non-espidf targets the
//! underlying calls hit the `hw_init::sim` stubs.

use log::info;

use crate::app::ports::{ActuatorPort, AdcPort, GpioPort, Level, PinMode, SensorPort, TimePort};
use crate::config::{SensorKind, SystemConfig};
use crate::drivers::hw_init;
use crate::drivers::pump::{PumpDriver, RelayLine};
use crate::drivers::status_led::StatusLed;
use crate::error::{ActuatorError, Error, SensorError};
use crate::sensors::dht::{DhtBus, DhtModel};
use crate::sensors::humidity::HumiditySensor;
use crate::sensors::soil::SoilMoistureSensor;
use crate::sensors::{Measurement, SensorHub};

// ── Raw I/O ports ─────────────────────────────────────────────

/// GPIO through the ESP-IDF driver.  Zero-sized, so every task that
/// needs a pin handle gets its own copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspGpio;

impl GpioPort for EspGpio {
    fn set_pin_mode(&mut self, pin: i32, mode: PinMode) -> Result<(), ActuatorError> {
        hw_init::gpio_configure(pin, mode)
    }

    fn write_pin(&mut self, pin: i32, level: Level) -> Result<(), ActuatorError> {
        hw_init::gpio_write(pin, level)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EspAdc;

impl AdcPort for EspAdc {
    fn read_analog(&mut self, channel: u32) -> Result<u16, SensorError> {
        hw_init::adc1_read(channel)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EspDhtBus;

impl DhtBus for EspDhtBus {
    fn read_frame(&mut self, gpio: i32, model: DhtModel) -> Result<[u8; 5], SensorError> {
        hw_init::dht_read_frame(gpio, model.start_signal_us())
    }
}

pub type BoardSensor = SensorHub<EspAdc, EspDhtBus>;

/// Bring up the configured transducer.
pub fn build_sensor(config: &SystemConfig) -> Result<BoardSensor, Error> {
    match config.sensor {
        SensorKind::SoilMoisture => {
            hw_init::init_adc(config.moisture_adc_channel)?;
            info!(
                "sensor: soil probe on ADC1 CH{} (wet={}, dry={})",
                config.moisture_adc_channel, config.wet_raw, config.dry_raw
            );
            Ok(SensorHub::Soil(SoilMoistureSensor::new(
                EspAdc,
                config.moisture_adc_channel,
                config.calibration(),
                config.sensor_settle_ms,
            )))
        }
        SensorKind::Humidity => {
            hw_init::init_dht_line(config.dht_gpio)?;
            info!("sensor: {:?} on GPIO{}", config.dht_model, config.dht_gpio);
            Ok(SensorHub::Humidity(HumiditySensor::new(
                EspDhtBus,
                config.dht_gpio,
                config.dht_model,
                config.sensor_settle_ms,
            )))
        }
    }
}

// ── HardwareAdapter ───────────────────────────────────────────

/// Concrete adapter that combines the board behind port traits.
pub struct HardwareAdapter<S, G> {
    sensor: S,
    pump: PumpDriver<G>,
    led: StatusLed<G>,
}

impl<S: SensorPort, G: GpioPort> HardwareAdapter<S, G> {
    pub fn new(sensor: S, pump: PumpDriver<G>, led: StatusLed<G>) -> Self {
        Self { sensor, pump, led }
    }
}

impl<S: SensorPort> HardwareAdapter<S, EspGpio> {
    /// Relay and LED from the config's pin bindings.
    pub fn with_board_outputs(sensor: S, config: &SystemConfig) -> Result<Self, Error> {
        let pump = PumpDriver::new(EspGpio, relay_line(config))?;
        let led = StatusLed::new(EspGpio, config.led_gpio)?;
        Ok(Self::new(sensor, pump, led))
    }
}

impl HardwareAdapter<BoardSensor, EspGpio> {
    pub fn from_config(config: &SystemConfig) -> Result<Self, Error> {
        let sensor = build_sensor(config)?;
        Self::with_board_outputs(sensor, config)
    }
}

pub fn relay_line(config: &SystemConfig) -> RelayLine {
    RelayLine::new(config.relay_gpio, config.relay_active_low)
}

// ── Port implementations ──────────────────────────────────────

impl<S: SensorPort, G: GpioPort> SensorPort for HardwareAdapter<S, G> {
    fn sample(&mut self, clock: &mut impl TimePort) -> Result<Measurement, SensorError> {
        self.sensor.sample(clock)
    }
}

impl<S: SensorPort, G: GpioPort> ActuatorPort for HardwareAdapter<S, G> {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.pump.set(on)
    }

    fn set_indicator(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.led.set(on)
    }

    fn pump_running(&self) -> bool {
        self.pump.is_running()
    }
}

//! System configuration parameters
//!
//! All tunable parameters for the SoilGuard controller.  Loaded once at
//! boot (from NVS or defaults) and never mutated afterwards.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::control::hysteresis::{HysteresisConfig, TriggerDirection};
use crate::pins;
use crate::sensors::calibration::Calibration;
use crate::sensors::dht::DhtModel;

const WATCHDOG_MARGIN_MS: u32 = 5_000;

/// Wi-Fi credentials baked in at build time, used when NVS holds none.
pub const BUILD_WIFI_SSID: Option<&str> = option_env!("SOILGUARD_WIFI_SSID");
pub const BUILD_WIFI_PASSWORD: Option<&str> = option_env!("SOILGUARD_WIFI_PASSWORD");

/// Which transducer feeds the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    /// Capacitive/resistive soil probe on an ADC channel.  Dry soil
    /// (low percentage) triggers watering.
    SoilMoisture,
    /// DHT11/DHT22 relative humidity.  High humidity triggers the pump.
    Humidity,
}

impl SensorKind {
    pub fn trigger(self) -> TriggerDirection {
        match self {
            Self::SoilMoisture => TriggerDirection::BelowBand,
            Self::Humidity => TriggerDirection::AboveBand,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sensing ---
    pub sensor: SensorKind,
    /// Settle delay before each capture (milliseconds)
    pub sensor_settle_ms: u32,
    /// ADC reading with the probe in water
    pub wet_raw: u16,
    /// ADC reading with the probe in dry air
    pub dry_raw: u16,
    pub dht_model: DhtModel,

    // --- Hysteresis ---
    /// Centre of the dead band (percent)
    pub threshold_percent: f32,
    /// Half-width of the dead band (percent)
    pub band_percent: f32,

    // --- Pump ---
    /// How long the pump stays on once activated (seconds)
    pub pump_duration_secs: u16,

    // --- Timing ---
    /// Control loop poll interval (milliseconds)
    pub poll_interval_ms: u32,
    /// Indicator toggle period while the pump runs (milliseconds)
    pub blink_interval_ms: u32,
    /// Indicator toggles at boot
    pub startup_blinks: u8,

    // --- Pin / channel bindings ---
    pub relay_gpio: i32,
    /// Relay board energises on a LOW input
    pub relay_active_low: bool,
    pub led_gpio: i32,
    pub moisture_adc_channel: u32,
    pub dht_gpio: i32,
    pub button_gpio: i32,

    // --- Network (empty SSID = standalone, no web surface) ---
    pub wifi_ssid: String<32>,
    pub wifi_password: String<64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sensing
            sensor: SensorKind::SoilMoisture,
            sensor_settle_ms: 1000,
            wet_raw: 2300,
            dry_raw: 300,
            dht_model: DhtModel::Dht22,

            // Hysteresis
            threshold_percent: 55.0,
            band_percent: 5.0,

            // Pump
            pump_duration_secs: 5,

            // Timing
            poll_interval_ms: 2000,
            blink_interval_ms: 100,
            startup_blinks: 10,

            // Pins
            relay_gpio: pins::RELAY_GPIO,
            relay_active_low: false,
            led_gpio: pins::LED_GPIO,
            moisture_adc_channel: pins::MOISTURE_ADC_CHANNEL,
            dht_gpio: pins::DHT_GPIO,
            button_gpio: pins::BUTTON_GPIO,

            wifi_ssid: String::new(),
            wifi_password: String::new(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Called before persisting and at boot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.band_percent.is_finite() || self.band_percent < 0.0 {
            return Err(ConfigError::ValidationFailed("band_percent must be >= 0"));
        }
        if !(0.0..=100.0).contains(&self.threshold_percent) {
            return Err(ConfigError::ValidationFailed(
                "threshold_percent must be 0-100",
            ));
        }
        if self.band_percent >= self.threshold_percent {
            return Err(ConfigError::ValidationFailed(
                "band_percent must be < threshold_percent",
            ));
        }
        if self.threshold_percent + self.band_percent > 100.0 {
            return Err(ConfigError::ValidationFailed(
                "threshold_percent + band_percent must be <= 100",
            ));
        }
        if self.pump_duration_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "pump_duration_secs must be > 0",
            ));
        }
        if !(100..=3_600_000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be 100-3600000",
            ));
        }
        if self.blink_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "blink_interval_ms must be > 0",
            ));
        }
        if self.wet_raw == self.dry_raw {
            return Err(ConfigError::ValidationFailed(
                "wet_raw and dry_raw must differ",
            ));
        }
        if self.wet_raw > pins::ADC_MAX_RAW || self.dry_raw > pins::ADC_MAX_RAW {
            return Err(ConfigError::ValidationFailed(
                "calibration endpoints exceed the 12-bit ADC range",
            ));
        }
        if self.sensor_settle_ms > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "sensor_settle_ms must be <= 10000",
            ));
        }
        Ok(())
    }

    /// Dead-band parameters for the decision engine.
    pub fn hysteresis(&self) -> Result<HysteresisConfig, ConfigError> {
        HysteresisConfig::new(
            self.threshold_percent,
            self.band_percent,
            self.sensor.trigger(),
        )
    }

    pub fn calibration(&self) -> Calibration {
        Calibration::new(self.wet_raw, self.dry_raw)
    }

    pub fn pump_duration_ms(&self) -> u32 {
        u32::from(self.pump_duration_secs) * 1000
    }

    /// Longest a single control cycle can legitimately block.
    pub fn worst_case_cycle_ms(&self) -> u32 {
        self.sensor_settle_ms + self.pump_duration_ms() + self.poll_interval_ms
    }

    /// Task watchdog timeout: one worst-case cycle plus slack.
    pub fn watchdog_timeout_ms(&self) -> u32 {
        self.worst_case_cycle_ms() + WATCHDOG_MARGIN_MS
    }

    pub fn wifi_enabled(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }

    /// Fill in Wi-Fi credentials when none are configured.  Stored
    /// credentials always win.  Returns `true` if the config changed.
    pub fn seed_wifi(&mut self, ssid: Option<&str>, password: Option<&str>) -> bool {
        let Some(ssid) = ssid.filter(|s| !s.is_empty()) else {
            return false;
        };
        if self.wifi_enabled() {
            return false;
        }
        let (Ok(ssid), Ok(password)) = (
            String::<32>::try_from(ssid),
            String::<64>::try_from(password.unwrap_or("")),
        ) else {
            log::warn!("Config: build-time WiFi credentials too long, ignored");
            return false;
        };
        self.wifi_ssid = ssid;
        self.wifi_password = password;
        true
    }
}

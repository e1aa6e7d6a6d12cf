//! Default GPIO / ADC assignments for the SoilGuard board (ESP32 DevKit).
//!
//! These only seed [`SystemConfig::default`](crate::config::SystemConfig);
//! drivers take their pin numbers from the loaded configuration.

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Pump relay input.  HIGH = relay energised (unless `relay_active_low`).
pub const RELAY_GPIO: i32 = 27;

/// On-board status LED.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Soil probe on ADC1 channel 7 (GPIO 35 on the classic ESP32).
pub const MOISTURE_ADC_CHANNEL: u32 = 7;

/// ADC resolution used for the soil probe.
pub const ADC_MAX_RAW: u16 = 4095;

/// DHT11/DHT22 single-wire data line.
pub const DHT_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// User button (active-low with pull-up)
// ---------------------------------------------------------------------------

/// Momentary push-button: short press waters, long press stops the pump.
pub const BUTTON_GPIO: i32 = 0;

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements             | Connects to                 |
//! |------------|------------------------|-----------------------------|
//! | `hardware` | SensorPort             | ESP32 ADC1, DHT line        |
//! |            | ActuatorPort           | relay + status LED GPIOs    |
//! |            | GpioPort, AdcPort      | `drivers::hw_init`          |
//! | `log_sink` | EventSink              | Serial log output           |
//! | `nvs`      | ConfigPort             | NVS / in-memory store       |
//! | `time`     | TimePort               | ESP32 system timer          |
//! | `web`      | (driving adapter)      | ESP-IDF HTTP server         |
//! | `wifi`     | WifiDriver             | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod web;
pub mod wifi;

//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ IrrigationService (domain)
//! ```
//!
//! Two layers of ports live here:
//!
//! - **Hardware I/O** ([`GpioPort`], [`AdcPort`], [`TimePort`]): the raw
//!   pin / channel / clock operations.  Drivers in `crate::drivers` and
//!   `crate::sensors` are written against these, never against a
//!   specific peripheral numbering scheme.
//! - **Domain** ([`SensorPort`], [`ActuatorPort`], [`EventSink`],
//!   [`ConfigPort`]): what the control loop actually consumes.

use embedded_hal::delay::DelayNs;

use crate::config::SystemConfig;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::Measurement;

// ───────────────────────────────────────────────────────────────
// Hardware I/O boundary
// ───────────────────────────────────────────────────────────────

/// Direction a GPIO is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    InputPullUp,
    Output,
}

/// Electrical level of a GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Digital pin operations.
pub trait GpioPort {
    fn set_pin_mode(&mut self, pin: i32, mode: PinMode) -> Result<(), ActuatorError>;

    fn write_pin(&mut self, pin: i32, level: Level) -> Result<(), ActuatorError>;
}

/// One-shot analog conversions.
pub trait AdcPort {
    /// Raw 12-bit conversion result for `channel`.
    fn read_analog(&mut self, channel: u32) -> Result<u16, SensorError>;
}

/// Monotonic clock plus blocking delay.
///
/// The delay half comes from `embedded-hal`, so any HAL delay provider
/// can back it.  Test clocks advance virtual time inside `delay_ns`.
pub trait TimePort: DelayNs {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the control loop calls this once per cycle.
pub trait SensorPort {
    /// Let the transducer settle, capture, and normalise to a percentage.
    ///
    /// An `Err` means "unavailable this cycle"; the caller skips the
    /// decision and retries on the next tick.
    fn sample(&mut self, clock: &mut impl TimePort) -> Result<Measurement, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: pump relay and status indicator.
pub trait ActuatorPort {
    /// Energise (`true`) or release (`false`) the pump relay.
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Drive the status indicator.
    fn set_indicator(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Whether the pump relay was last commanded on.
    fn pump_running(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting; invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations and config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

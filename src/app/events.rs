//! Outbound application events.
//!
//! The [`IrrigationService`](super::service::IrrigationService) emits
//! these through the [`EventSink`](super::ports::EventSink) port.  The
//! log sink renders them as tagged serial lines; tests record them.

use crate::control::{ActivationCause, ActivationState};
use crate::error::{ActuatorError, SensorError};
use crate::sensors::Measurement;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Boot sequence finished; the loop is about to start polling.
    Started { state: ActivationState },

    /// A fresh sample was taken this cycle.
    Measured(Measurement),

    /// The raw value lay beyond a calibration endpoint and was clamped.
    CalibrationClamped { raw: Option<u16> },

    StateChanged { from: ActivationState, to: ActivationState },

    PumpStarted { cause: ActivationCause, at_ms: u64 },

    /// The pump hold ended.  `aborted` is set when an emergency stop cut
    /// it short.
    PumpStopped { held_ms: u64, aborted: bool },

    /// Cycle skipped; the state was left untouched.
    SensorUnavailable { error: SensorError, consecutive: u32 },

    ActuatorFault(ActuatorError),

    /// A previously published fault no longer applies.
    FaultCleared,
}

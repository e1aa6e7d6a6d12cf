//! Control logic: the dead-band decision engine.
//!
//! Timing (pump hold, poll cadence) is not in here; it
//! belongs to the control loop in [`crate::app::service`].

pub mod hysteresis;

pub use hysteresis::{decide, ActivationCause, ActivationState, Decision, HysteresisConfig, TriggerDirection};

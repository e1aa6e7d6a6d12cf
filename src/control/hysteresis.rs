//! Hysteresis decision engine.
//!
//! A two-state Mealy machine keyed on (state, measurement vs. band,
//! override flag):
//!
//! ```text
//!                 m <= lower  (or override)
//!        ┌──────┐ ──────────────────────────▶ ┌────────┐
//!        │ Idle │                             │ Active │ ◀─┐ override
//!        └──────┘ ◀────────────────────────── └────────┘ ──┘
//!                 m >= upper
//! ```
//!
//! shown for [`TriggerDirection::BelowBand`] (soil moisture); the
//! comparisons mirror for [`TriggerDirection::AboveBand`] (humidity).
//! Anything strictly inside `(lower, upper)` leaves the state alone,
//! which is what stops the relay from chattering on sensor noise.

use serde::Serialize;

use crate::app::ports::ConfigError;

/// Whether irrigation is logically engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ActivationState {
    #[default]
    Idle,
    Active,
}

/// Which side of the band asks for water.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDirection {
    /// Activate when the reading drops to `threshold - band` (soil moisture).
    BelowBand,
    /// Activate when the reading rises to `threshold + band` (humidity).
    AboveBand,
}

/// Immutable dead band `[threshold - band, threshold + band]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisConfig {
    threshold: f32,
    band: f32,
    trigger: TriggerDirection,
}

impl HysteresisConfig {
    pub fn new(threshold: f32, band: f32, trigger: TriggerDirection) -> Result<Self, ConfigError> {
        if !threshold.is_finite() || !band.is_finite() {
            return Err(ConfigError::ValidationFailed("threshold and band must be finite"));
        }
        if band < 0.0 {
            return Err(ConfigError::ValidationFailed("band_percent must be >= 0"));
        }
        if band >= threshold {
            return Err(ConfigError::ValidationFailed(
                "band_percent must be < threshold_percent",
            ));
        }
        Ok(Self { threshold, band, trigger })
    }

    pub fn trigger(&self) -> TriggerDirection {
        self.trigger
    }

    pub fn lower(&self) -> f32 {
        self.threshold - self.band
    }

    pub fn upper(&self) -> f32 {
        self.threshold + self.band
    }

    /// Reading is on the "needs water" side of the band.
    fn demands_activation(&self, m: f32) -> bool {
        match self.trigger {
            TriggerDirection::BelowBand => m <= self.lower(),
            TriggerDirection::AboveBand => m >= self.upper(),
        }
    }

    /// Reading is back in the safe zone on the far side of the band.
    fn allows_release(&self, m: f32) -> bool {
        match self.trigger {
            TriggerDirection::BelowBand => m >= self.upper(),
            TriggerDirection::AboveBand => m <= self.lower(),
        }
    }
}

/// What started a pump run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActivationCause {
    Threshold,
    Override,
}

/// Output of one [`decide`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub next_state: ActivationState,
    /// Start a new timed pump run this cycle.
    pub activate_pump: bool,
    /// Set whenever `activate_pump` is.
    pub cause: Option<ActivationCause>,
}

impl Decision {
    fn hold(state: ActivationState) -> Self {
        Self { next_state: state, activate_pump: false, cause: None }
    }

    fn activate(cause: ActivationCause) -> Self {
        Self {
            next_state: ActivationState::Active,
            activate_pump: true,
            cause: Some(cause),
        }
    }
}

/// Map the current measurement and prior state to the next state.
///
/// A pending override always wins.  Releasing to `Idle` never stops a
/// pump run already in progress; it only re-arms the next activation.
pub fn decide(
    measurement: f32,
    current: ActivationState,
    override_pending: bool,
    config: &HysteresisConfig,
) -> Decision {
    if override_pending {
        return Decision::activate(ActivationCause::Override);
    }

    match current {
        ActivationState::Idle if config.demands_activation(measurement) => {
            Decision::activate(ActivationCause::Threshold)
        }
        ActivationState::Active if config.allows_release(measurement) => {
            Decision::hold(ActivationState::Idle)
        }
        state => Decision::hold(state),
    }
}

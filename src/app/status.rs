//! Status publisher.
//!
//! The control loop writes one [`StatusSnapshot`] per cycle; web
//! handlers and the display read it from their own tasks.  The cell is
//! a critical-section mutex around a `Copy` value, so both sides hold it
//! only for a memcpy and the loop is never blocked on a reader.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

use crate::control::{ActivationCause, ActivationState};
use crate::error::ActuatorError;
use crate::sensors::Measurement;

/// Last fault observed by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fault {
    SensorUnavailable,
    ActuatorCommandFailure(#[serde(serialize_with = "ser_display")] ActuatorError),
}

fn ser_display<S: serde::Serializer>(e: &ActuatorError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(e)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// `None` until the first successful sample.
    pub measurement: Option<Measurement>,
    pub state: ActivationState,
    pub pump_on: bool,
    pub fault: Option<Fault>,
    pub consecutive_sensor_failures: u32,
    pub cycles: u64,
    pub activations: u32,
    pub last_activation_ms: Option<u64>,
    pub last_cause: Option<ActivationCause>,
}

impl StatusSnapshot {
    pub const BOOT: Self = Self {
        measurement: None,
        state: ActivationState::Idle,
        pump_on: false,
        fault: None,
        consecutive_sensor_failures: 0,
        cycles: 0,
        activations: 0,
        last_activation_ms: None,
        last_cause: None,
    };
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::BOOT
    }
}

pub struct StatusPublisher {
    cell: Mutex<CriticalSectionRawMutex, Cell<StatusSnapshot>>,
}

impl StatusPublisher {
    pub const fn new() -> Self {
        Self { cell: Mutex::new(Cell::new(StatusSnapshot::BOOT)) }
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.cell.lock(|c| c.set(snapshot));
    }

    /// Most recently published snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.cell.lock(Cell::get)
    }

    pub fn measurement(&self) -> Option<Measurement> {
        self.snapshot().measurement
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

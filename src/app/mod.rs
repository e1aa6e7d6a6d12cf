//! Application core: pure domain logic, zero I/O.
//!
//! This module holds the irrigation control loop, the cross-task
//! signals and the published status.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
pub mod signals;
pub mod status;

//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod button;
pub mod hw_init;
pub mod pump;
pub mod status_led;
pub mod watchdog;

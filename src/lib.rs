//! SoilGuard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod esp_link_shims;
pub mod pins;
pub mod scheduler;
pub mod sensors;

// Hardware-facing modules compile on every target; the ESP-IDF calls
// inside are cfg-gated with host simulation stubs.
pub mod adapters;
pub mod drivers;

//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! tagged line to the ESP-IDF logger (UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { state } => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::Measured(m) => match m.raw {
                Some(raw) => info!("MEAS  | {:.1}% (raw={}) t={}ms", m.percent, raw, m.timestamp_ms),
                None => info!("MEAS  | {:.1}% t={}ms", m.percent, m.timestamp_ms),
            },
            AppEvent::CalibrationClamped { raw } => {
                warn!("MEAS  | raw={:?} outside calibration endpoints, clamped", raw);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::PumpStarted { cause, at_ms } => {
                info!("PUMP  | on ({:?}) at {}ms", cause, at_ms);
            }
            AppEvent::PumpStopped { held_ms, aborted } => {
                if *aborted {
                    warn!("PUMP  | off after {}ms (emergency stop)", held_ms);
                } else {
                    info!("PUMP  | off after {}ms", held_ms);
                }
            }
            AppEvent::SensorUnavailable { error, consecutive } => {
                warn!("FAULT | sensor unavailable: {} (x{})", error, consecutive);
            }
            AppEvent::ActuatorFault(e) => {
                warn!("FAULT | actuator: {}", e);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | cleared");
            }
        }
    }
}

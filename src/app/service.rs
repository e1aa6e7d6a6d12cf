//! Application service: the hexagonal core.
//!
//! [`IrrigationService`] owns the activation state and the cycle
//! bookkeeping.  Sensor, relay, indicator and clock access all arrive as
//! port implementations at call sites, so the whole control loop runs
//! against mocks in tests.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │   IrrigationService       │
//! ActuatorPort ◀──│  decide · pump hold       │ ──▶ StatusPublisher
//!                 └──────────────────────────┘
//!                      ▲ OverrideRequest / StopRequest
//! ```
//!
//! One cycle is strictly ordered: sample, consume override, decide,
//! actuate, publish.  A pending pump-off retry goes out right after the
//! sample, whether or not the sample succeeded.  The pump hold blocks the cycle; nothing is polled
//! while the pump runs.

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::control::{decide, ActivationCause, ActivationState, HysteresisConfig};
use crate::error::ActuatorError;
use crate::scheduler::Cadence;
use crate::sensors::Measurement;

use super::events::AppEvent;
use super::ports::{ActuatorPort, ConfigError, EventSink, SensorPort, TimePort};
use super::signals::{OverrideRequest, StopRequest};
use super::status::{Fault, StatusPublisher, StatusSnapshot};

// ───────────────────────────────────────────────────────────────
// Shared channels
// ───────────────────────────────────────────────────────────────

/// The cross-task state the control loop shares with the web and button
/// tasks.  In firmware these are `static`s.
#[derive(Clone, Copy)]
pub struct Channels<'a> {
    pub override_request: &'a OverrideRequest,
    pub stop_request: &'a StopRequest,
    pub status: &'a StatusPublisher,
}

// ───────────────────────────────────────────────────────────────
// IrrigationService
// ───────────────────────────────────────────────────────────────

pub struct IrrigationService<'a> {
    channels: Channels<'a>,
    hysteresis: HysteresisConfig,
    pump_duration_ms: u64,
    blink_interval_ms: u32,
    startup_blinks: u8,

    state: ActivationState,
    /// A pump-off command failed and must be retried.
    pump_off_pending: bool,
    last_measurement: Option<Measurement>,
    fault: Option<Fault>,
    consecutive_sensor_failures: u32,
    cycles: u64,
    activations: u32,
    last_activation_ms: Option<u64>,
    last_cause: Option<ActivationCause>,
}

impl<'a> IrrigationService<'a> {
    pub fn new(config: &SystemConfig, channels: Channels<'a>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            channels,
            hysteresis: config.hysteresis()?,
            pump_duration_ms: u64::from(config.pump_duration_ms()),
            blink_interval_ms: config.blink_interval_ms,
            startup_blinks: config.startup_blinks,
            state: ActivationState::Idle,
            pump_off_pending: false,
            last_measurement: None,
            fault: None,
            consecutive_sensor_failures: 0,
            cycles: 0,
            activations: 0,
            last_activation_ms: None,
            last_cause: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Force the relay off, play the boot blink sequence and publish the
    /// initial snapshot.
    pub fn start(
        &mut self,
        hw: &mut impl ActuatorPort,
        clock: &mut impl TimePort,
        sink: &mut impl EventSink,
    ) {
        self.command_pump_off(hw, sink);

        let mut lit = false;
        for _ in 0..self.startup_blinks {
            lit = !lit;
            self.indicator(hw, lit);
            clock.delay_ms(self.blink_interval_ms);
        }
        self.indicator(hw, true);

        sink.emit(&AppEvent::Started { state: self.state });
        info!("IrrigationService started in {:?}", self.state);
        self.publish(hw.pump_running());
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one control cycle.
    ///
    /// `hw` satisfies both [`SensorPort`] and [`ActuatorPort`] so a single
    /// adapter owns every pin without a double mutable borrow.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        clock: &mut impl TimePort,
        sink: &mut impl EventSink,
    ) {
        self.cycles += 1;
        // Stops raised while the pump was idle are stale; anything raised
        // from here on belongs to this cycle's hold.
        self.channels.stop_request.clear();

        // 1. Sample
        let sampled = hw.sample(clock);

        if self.pump_off_pending {
            self.command_pump_off(hw, sink);
        }

        let measurement = match sampled {
            Ok(m) => m,
            Err(error) => {
                self.consecutive_sensor_failures += 1;
                warn!(
                    "sensor unavailable ({}), skipping cycle ({} in a row)",
                    error, self.consecutive_sensor_failures
                );
                self.set_fault(Fault::SensorUnavailable);
                sink.emit(&AppEvent::SensorUnavailable {
                    error,
                    consecutive: self.consecutive_sensor_failures,
                });
                self.publish(hw.pump_running());
                return;
            }
        };

        self.consecutive_sensor_failures = 0;
        if self.fault == Some(Fault::SensorUnavailable) {
            self.clear_fault(sink);
        }
        self.last_measurement = Some(measurement);
        sink.emit(&AppEvent::Measured(measurement));
        if measurement.clamped {
            sink.emit(&AppEvent::CalibrationClamped { raw: measurement.raw });
        }

        // 2. Override
        let override_pending = self.channels.override_request.consume();

        // 3. Decide
        let decision = decide(measurement.percent, self.state, override_pending, &self.hysteresis);
        let prev = self.state;
        self.transition(decision.next_state, sink);

        // 4. Actuate
        if decision.activate_pump {
            let cause = decision.cause.unwrap_or(ActivationCause::Threshold);
            self.run_pump(hw, clock, sink, cause, prev);
        }

        // 5. Publish
        self.publish(hw.pump_running());
    }

    /// One tick followed by the sleep to the next poll slot.
    pub fn cycle(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        clock: &mut impl TimePort,
        sink: &mut impl EventSink,
        cadence: &mut Cadence,
    ) {
        self.tick(hw, clock, sink);
        cadence.wait(clock);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    // ── Internal ──────────────────────────────────────────────

    /// Energise the relay, hold it for the configured duration in
    /// blink-sized slices, then release it.
    fn run_pump(
        &mut self,
        hw: &mut impl ActuatorPort,
        clock: &mut impl TimePort,
        sink: &mut impl EventSink,
        cause: ActivationCause,
        prev: ActivationState,
    ) {
        if self.channels.stop_request.take() {
            warn!("emergency stop before pump start, {:?} run skipped", cause);
            sink.emit(&AppEvent::PumpStopped { held_ms: 0, aborted: true });
            return;
        }

        if let Err(e) = hw.set_pump(true) {
            error!("pump ON failed: {}", e);
            self.actuator_fault(e, sink);
            self.transition(prev, sink);
            if cause == ActivationCause::Override {
                self.channels.override_request.request();
            }
            return;
        }

        if matches!(self.fault, Some(Fault::ActuatorCommandFailure(_))) && !self.pump_off_pending {
            self.clear_fault(sink);
        }

        let at_ms = clock.now_ms();
        self.activations += 1;
        self.last_activation_ms = Some(at_ms);
        self.last_cause = Some(cause);
        sink.emit(&AppEvent::PumpStarted { cause, at_ms });
        info!("pump on ({:?}) for {} ms", cause, self.pump_duration_ms);
        self.publish(hw.pump_running());

        let mut held_ms = 0u64;
        let mut aborted = false;
        let mut lit = true;
        while held_ms < self.pump_duration_ms {
            if self.channels.stop_request.take() {
                aborted = true;
                break;
            }
            let slice = (self.pump_duration_ms - held_ms).min(u64::from(self.blink_interval_ms));
            lit = !lit;
            self.indicator(hw, lit);
            clock.delay_ms(slice as u32);
            held_ms += slice;
        }

        self.command_pump_off(hw, sink);
        self.indicator(hw, true);

        if aborted {
            warn!("pump hold aborted by emergency stop after {} ms", held_ms);
        }
        sink.emit(&AppEvent::PumpStopped { held_ms, aborted });
    }

    fn command_pump_off(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        match hw.set_pump(false) {
            Ok(()) => {
                if self.pump_off_pending {
                    info!("pump OFF retry succeeded");
                    self.pump_off_pending = false;
                    self.clear_fault(sink);
                }
            }
            Err(e) => {
                error!("pump OFF failed: {}", e);
                self.pump_off_pending = true;
                self.actuator_fault(e, sink);
            }
        }
    }

    fn indicator(&self, hw: &mut impl ActuatorPort, on: bool) {
        if let Err(e) = hw.set_indicator(on) {
            warn!("indicator write failed: {}", e);
        }
    }

    fn transition(&mut self, to: ActivationState, sink: &mut impl EventSink) {
        if to != self.state {
            sink.emit(&AppEvent::StateChanged { from: self.state, to });
            self.state = to;
        }
    }

    fn actuator_fault(&mut self, e: ActuatorError, sink: &mut impl EventSink) {
        self.fault = Some(Fault::ActuatorCommandFailure(e));
        sink.emit(&AppEvent::ActuatorFault(e));
    }

    fn set_fault(&mut self, fault: Fault) {
        // An outstanding relay fault outranks a flaky sensor.
        if !self.pump_off_pending {
            self.fault = Some(fault);
        }
    }

    fn clear_fault(&mut self, sink: &mut impl EventSink) {
        if self.fault.take().is_some() {
            sink.emit(&AppEvent::FaultCleared);
        }
    }

    fn publish(&self, pump_on: bool) {
        self.channels.status.publish(StatusSnapshot {
            measurement: self.last_measurement,
            state: self.state,
            pump_on,
            fault: self.fault,
            consecutive_sensor_failures: self.consecutive_sensor_failures,
            cycles: self.cycles,
            activations: self.activations,
            last_activation_ms: self.last_activation_ms,
            last_cause: self.last_cause,
        });
    }
}

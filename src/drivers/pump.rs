//! Pump relay driver.
//!
//! On/off only: the relay board switches the pump supply.  Boards differ
//! in polarity, so [`RelayLine`] maps logical on/off to the pin level.
//!
//! ## Emergency stop
//!
//! [`PumpKillSwitch`] is a second handle on the same line for the web and
//! button tasks.  It releases the relay directly and raises the
//! [`StopRequest`] so the control loop ends its hold and re-commands off
//! through its own [`PumpDriver`].

use log::warn;

use crate::app::ports::{GpioPort, Level, PinMode};
use crate::app::signals::StopRequest;
use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayLine {
    pin: i32,
    active_low: bool,
}

impl RelayLine {
    pub const fn new(pin: i32, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    /// Electrical level that puts the relay in the requested state.
    pub fn level_for(&self, on: bool) -> Level {
        Level::from(on != self.active_low)
    }
}

pub struct PumpDriver<G> {
    gpio: G,
    line: RelayLine,
    running: bool,
}

impl<G: GpioPort> PumpDriver<G> {
    /// Claim the pin as an output and drive it to "off" straight away.
    pub fn new(mut gpio: G, line: RelayLine) -> Result<Self, ActuatorError> {
        gpio.set_pin_mode(line.pin, PinMode::Output)?;
        gpio.write_pin(line.pin, line.level_for(false))?;
        Ok(Self { gpio, line, running: false })
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.gpio.write_pin(self.line.pin, self.line.level_for(on))?;
        self.running = on;
        Ok(())
    }

    /// Last successfully commanded state.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

pub struct PumpKillSwitch<'a, G> {
    gpio: G,
    line: RelayLine,
    stop: &'a StopRequest,
}

impl<'a, G: GpioPort> PumpKillSwitch<'a, G> {
    pub fn new(gpio: G, line: RelayLine, stop: &'a StopRequest) -> Self {
        Self { gpio, line, stop }
    }

    /// Release the relay now and tell the control loop to stop holding.
    pub fn trip(&mut self) -> Result<(), ActuatorError> {
        self.stop.raise();
        self.gpio
            .write_pin(self.line.pin, self.line.level_for(false))
            .inspect_err(|e| warn!("kill switch: relay write failed: {}", e))
    }
}

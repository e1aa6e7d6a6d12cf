//! Single-GPIO status LED.
//!
//! Solid while idle, toggled by the control loop while the pump runs.

use crate::app::ports::{GpioPort, Level, PinMode};
use crate::error::ActuatorError;

pub struct StatusLed<G> {
    gpio: G,
    pin: i32,
}

impl<G: GpioPort> StatusLed<G> {
    pub fn new(mut gpio: G, pin: i32) -> Result<Self, ActuatorError> {
        gpio.set_pin_mode(pin, PinMode::Output)?;
        gpio.write_pin(pin, Level::Low)?;
        Ok(Self { gpio, pin })
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.gpio.write_pin(self.pin, Level::from(on))
    }
}

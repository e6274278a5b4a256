//! Single end-stop contact (reed switch or limit switch).
//!
//! ## Hardware
//!
//! Magnetic reed switch between the GPIO and GND with the internal
//! pull-up enabled: the input reads LOW while the magnet is present.
//! `active_low = false` supports normally-open switches wired to 3V3.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::error::SensorError;

pub struct ContactInput<P: InputPin> {
    pin: P,
    active_low: bool,
    name: &'static str,
}

impl<P: InputPin> ContactInput<P> {
    pub fn new(pin: P, active_low: bool, name: &'static str) -> Self {
        Self {
            pin,
            active_low,
            name,
        }
    }

    /// `true` while the door sits on this end-stop.
    pub fn is_engaged(&mut self) -> Result<bool, SensorError> {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        level.map_err(|_| {
            warn!("SENSOR: {} contact read failed", self.name);
            SensorError::GpioReadFailed
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

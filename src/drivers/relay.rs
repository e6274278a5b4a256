//! Door opener relay driver.
//!
//! The relay contacts sit in parallel with the wall button of the door
//! motor controller.  One [`pulse`](RelayDriver::pulse) closes them for
//! `pulse_duration_ms`, which the opener sees as a single button press.
//!
//! ## Pulse contract
//!
//! - Exactly one engage/release pair per call; blocks for the pulse.
//! - No internal retries.  A failed engage leaves the line released and
//!   returns [`ActuatorError::GpioWriteFailed`].
//! - A failed release leaves the driver `Pulsing`: the contacts may still
//!   be closed, so further pulses are refused with
//!   [`ActuatorError::PulseInFlight`] until [`recover`](RelayDriver::recover)
//!   manages to release the line.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, warn};

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Pulsing,
}

pub struct RelayDriver<P: OutputPin, D: DelayNs> {
    pin: P,
    delay: D,
    pulse_ms: u32,
    active_low: bool,
    state: RelayState,
    pulses: u32,
}

impl<P: OutputPin, D: DelayNs> RelayDriver<P, D> {
    /// Build the driver and drive the line to its released level.
    pub fn new(pin: P, delay: D, pulse_ms: u32, active_low: bool) -> Result<Self, ActuatorError> {
        let mut relay = Self {
            pin,
            delay,
            pulse_ms,
            active_low,
            state: RelayState::Idle,
            pulses: 0,
        };
        relay.drive(false)?;
        Ok(relay)
    }

    /// Fire one press-and-release.
    pub fn pulse(&mut self) -> Result<(), ActuatorError> {
        if self.state == RelayState::Pulsing {
            warn!("RELAY: pulse refused, previous pulse still in flight");
            return Err(ActuatorError::PulseInFlight);
        }

        if let Err(e) = self.drive(true) {
            error!("RELAY: engage failed");
            // Best effort: make sure the opener does not see a held button.
            let _ = self.drive(false);
            return Err(e);
        }
        self.state = RelayState::Pulsing;

        self.delay.delay_ms(self.pulse_ms);

        self.drive(false).inspect_err(|_| {
            error!("RELAY: release failed, line may be stuck engaged");
        })?;
        self.state = RelayState::Idle;
        self.pulses = self.pulses.wrapping_add(1);
        debug!("RELAY: pulse #{} ({}ms)", self.pulses, self.pulse_ms);
        Ok(())
    }

    /// Retry releasing a line left engaged by a failed pulse.
    pub fn recover(&mut self) -> Result<(), ActuatorError> {
        self.drive(false)?;
        self.state = RelayState::Idle;
        Ok(())
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Completed pulses since construction.
    pub fn pulse_count(&self) -> u32 {
        self.pulses
    }

    pub fn pulse_ms(&self) -> u32 {
        self.pulse_ms
    }

    fn drive(&mut self, engaged: bool) -> Result<(), ActuatorError> {
        let high = engaged != self.active_low;
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|_| ActuatorError::GpioWriteFailed)
    }
}

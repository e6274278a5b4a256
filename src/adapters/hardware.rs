//! Hardware adapter: bridges the relay and contact drivers to the port traits.
//!
//! The relay and the contacts are owned by different threads at run time
//! (the relay sits behind the controller lock, the contacts move into the
//! poller), so each driver implements its port directly instead of being
//! bundled into one adapter.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::SensorLayout;
use crate::drivers::relay::{RelayDriver, RelayState};
use crate::error::{ActuatorError, SensorError};
use crate::sensors::{DoorSensors, SensorSample};

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin, D: DelayNs> ActuatorPort for RelayDriver<P, D> {
    /// Between calls the driver can only be `Pulsing` if a release failed,
    /// so the line is released again before the next press.
    fn pulse(&mut self) -> Result<(), ActuatorError> {
        if self.state() == RelayState::Pulsing {
            warn!("RELAY: releasing line left engaged by the previous pulse");
            self.recover()?;
        }
        RelayDriver::pulse(self)
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P: InputPin> SensorPort for DoorSensors<P> {
    fn sample(&mut self, now_ms: u64) -> Result<SensorSample, SensorError> {
        self.read(now_ms)
    }

    fn layout(&self) -> SensorLayout {
        DoorSensors::layout(self)
    }
}

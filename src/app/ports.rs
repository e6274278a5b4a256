//! Port traits: the hexagonal boundary between door logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorService (domain)
//! ```
//!
//! Driven adapters (relay, contacts, event sinks, storage, clock) implement
//! these traits.  The [`DoorService`](super::service::DoorService) and
//! [`DoorController`](super::controller::DoorController) consume them via
//! generics, so the domain core never touches hardware directly.
//!
//! All port errors are typed; callers handle every variant explicitly.

use log::{info, warn};

use crate::config::{DoorConfig, SensorLayout};
use crate::error::{ActuatorError, ConfigError, SensorError};
use crate::sensors::SensorSample;

use super::events::DoorEvent;

// ───────────────────────────────────────────────────────────────
// Actuator port (domain → relay)
// ───────────────────────────────────────────────────────────────

/// Write-side port: one simulated button press per call.
pub trait ActuatorPort {
    /// Fire exactly one relay pulse, blocking for its duration.
    /// Overlapping pulses are refused with [`ActuatorError::PulseInFlight`].
    fn pulse(&mut self) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (contacts → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the poller calls this to obtain raw contact readings.
pub trait SensorPort {
    /// Latest raw reading stamped with `now_ms`.  Never blocks longer
    /// than one GPIO read per contact.
    fn sample(&mut self, now_ms: u64) -> Result<SensorSample, SensorError>;

    /// Which contacts this reader has wired.
    fn layout(&self) -> SensorLayout;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → log / bridge)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`DoorEvent`]s through this port.
/// Adapters decide where they go (serial log, bridge characteristic push).
pub trait EventSink {
    fn emit(&mut self, event: &DoorEvent);
}

/// Fan an event out to two sinks, first then second.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &DoorEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the door configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped, so a bad
/// provisioning payload cannot e.g. hold the relay closed for seconds.
pub trait ConfigPort {
    /// Load the stored configuration.  [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<DoorConfig, ConfigError>;

    /// Validate and persist.
    fn save(&self, config: &DoorConfig) -> Result<(), ConfigError>;

    /// Stored config, or defaults when none is stored or it is unusable.
    fn load_or_default(&self) -> DoorConfig {
        match self.load() {
            Ok(cfg) => cfg,
            Err(ConfigError::NotFound) => {
                info!("CONFIG: none stored, using defaults");
                DoorConfig::default()
            }
            Err(e) => {
                warn!("CONFIG: stored config unusable ({}), using defaults", e);
                DoorConfig::default()
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Every timestamp the controller handles
/// (samples, travel deadlines) comes from one of these.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

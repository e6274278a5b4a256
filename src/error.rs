//! Unified error types for the garage door firmware.
//!
//! A single [`DoorError`] is what command callers see.  Hardware-level
//! failures are kept as small `Copy` enums so they can be carried inside
//! outbound events and across the controller lock without allocation.

use core::fmt;

use crate::fsm::DoorState;

// ---------------------------------------------------------------------------
// Top-level command error
// ---------------------------------------------------------------------------

/// Every rejected door command funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorError {
    /// The relay or a contact input could not be driven/read.
    /// The door state was left unchanged.
    HardwareFault(HardwareFault),
    /// A conflicting transition is in flight and the reversal policy
    /// forbids overriding it.  Carries the state at rejection time.
    BusyRejected(DoorState),
    /// The relay is still pulsing from a previous command.
    ActuatorBusy,
    /// Command issued before `start()` or after `shutdown()`.
    NotRunning,
}

impl fmt::Display for DoorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareFault(e) => write!(f, "hardware fault: {e}"),
            Self::BusyRejected(state) => write!(f, "busy: door is {state}"),
            Self::ActuatorBusy => write!(f, "relay pulse already in flight"),
            Self::NotRunning => write!(f, "controller not running"),
        }
    }
}

impl core::error::Error for DoorError {}

// ---------------------------------------------------------------------------
// Hardware faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareFault {
    Actuator(ActuatorError),
    Sensor(SensorError),
}

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
        }
    }
}

impl core::error::Error for HardwareFault {}

impl From<HardwareFault> for DoorError {
    fn from(e: HardwareFault) -> Self {
        Self::HardwareFault(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed while driving the relay line.
    GpioWriteFailed,
    /// A pulse is already in progress; overlapping pulses are refused.
    PulseInFlight,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::PulseInFlight => write!(f, "pulse in flight"),
        }
    }
}

impl core::error::Error for ActuatorError {}

impl From<ActuatorError> for DoorError {
    fn from(e: ActuatorError) -> Self {
        match e {
            ActuatorError::PulseInFlight => Self::ActuatorBusy,
            ActuatorError::GpioWriteFailed => Self::HardwareFault(HardwareFault::Actuator(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO read returned an error.
    GpioReadFailed,
    /// Both end-stop contacts report engaged at the same time.
    ContactsConflict,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::ContactsConflict => write!(f, "open and closed contacts both engaged"),
        }
    }
}

impl core::error::Error for SensorError {}

impl From<SensorError> for DoorError {
    fn from(e: SensorError) -> Self {
        Self::HardwareFault(HardwareFault::Sensor(e))
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from config parsing, validation, and [`ConfigPort`](crate::app::ports::ConfigPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored or supplied config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}

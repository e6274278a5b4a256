//! Outbound door events.
//!
//! The [`DoorService`](super::service::DoorService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log to serial, or hand them to the bridge
//! task for a characteristic push.

use crate::error::{ActuatorError, SensorError};
use crate::fsm::{DoorState, TargetDoorState};

use super::commands::DoorCommand;

/// Structured events emitted by the door core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEvent {
    /// The controller started (carries the initial snapshot).
    Started {
        state: DoorState,
        target: TargetDoorState,
    },

    /// A transition was committed.
    StateChanged {
        from: DoorState,
        to: DoorState,
        target: TargetDoorState,
    },

    /// A command fired the relay.  `count` is the running pulse total.
    PulseFired { command: DoorCommand, count: u32 },

    /// The relay could not be driven; the state was left unchanged.
    PulseFailed {
        command: DoorCommand,
        error: ActuatorError,
    },

    /// A command was refused under the reject-while-busy policy.
    CommandRejected {
        command: DoorCommand,
        state: DoorState,
    },

    /// A contact read failed or was implausible; the last stable
    /// position is kept.
    SensorFault(SensorError),

    /// The controller shut down.
    Stopped,
}

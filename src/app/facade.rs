//! Command/query facade for the smart-home bridge.
//!
//! The only surface the bridge adapter touches.  GETs are served from the
//! controller's lock-free snapshots; the SET forwards to a door command and
//! maps [`DoorError`] onto HAP status codes.  Characteristic values follow
//! the HomeKit `GarageDoorOpener` service:
//!
//! | Characteristic      | Values                                              |
//! |---------------------|-----------------------------------------------------|
//! | CurrentDoorState    | OPEN=0 CLOSED=1 OPENING=2 CLOSING=3 STOPPED=4       |
//! | TargetDoorState     | OPEN=0 CLOSED=1                                     |
//! | ObstructionDetected | bool                                                |
//!
//! HomeKit has no "obstructed" door state; `Obstructed` reports `STOPPED`
//! with ObstructionDetected set.

use std::sync::Arc;

use log::debug;

use crate::config::AccessoryInfo;
use crate::error::DoorError;
use crate::fsm::{DoorState, TargetDoorState};

use super::commands::DoorCommand;
use super::controller::DoorController;
use super::events::DoorEvent;
use super::ports::{ActuatorPort, Clock, EventSink};

// ───────────────────────────────────────────────────────────────
// Characteristic codes
// ───────────────────────────────────────────────────────────────

pub mod current_door_state {
    pub const OPEN: u8 = 0;
    pub const CLOSED: u8 = 1;
    pub const OPENING: u8 = 2;
    pub const CLOSING: u8 = 3;
    pub const STOPPED: u8 = 4;
}

pub mod target_door_state {
    pub const OPEN: u8 = 0;
    pub const CLOSED: u8 = 1;
}

pub fn current_door_state_code(state: DoorState) -> u8 {
    match state {
        DoorState::Open => current_door_state::OPEN,
        DoorState::Closed => current_door_state::CLOSED,
        DoorState::Opening => current_door_state::OPENING,
        DoorState::Closing => current_door_state::CLOSING,
        DoorState::Stopped | DoorState::Obstructed => current_door_state::STOPPED,
    }
}

pub fn target_door_state_code(target: TargetDoorState) -> u8 {
    match target {
        TargetDoorState::Open => target_door_state::OPEN,
        TargetDoorState::Closed => target_door_state::CLOSED,
    }
}

/// HAP status codes returned to the bridge on a failed SET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum HapStatus {
    ServiceCommunicationFailure = -70402,
    ResourceBusy = -70403,
    InvalidValueInRequest = -70410,
}

impl HapStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<DoorError> for HapStatus {
    fn from(e: DoorError) -> Self {
        match e {
            DoorError::HardwareFault(_) | DoorError::NotRunning => {
                Self::ServiceCommunicationFailure
            }
            DoorError::BusyRejected(_) | DoorError::ActuatorBusy => Self::ResourceBusy,
        }
    }
}

/// One characteristic value to push to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicUpdate {
    CurrentDoorState(u8),
    TargetDoorState(u8),
    ObstructionDetected(bool),
}

// ───────────────────────────────────────────────────────────────
// DoorControl: what the facade needs from a controller
// ───────────────────────────────────────────────────────────────

pub trait DoorControl {
    fn current_state(&self) -> DoorState;
    fn target_state(&self) -> TargetDoorState;
    fn is_obstructed(&self) -> bool;
    fn command(&self, cmd: DoorCommand) -> Result<(), DoorError>;
}

impl<A, E, C> DoorControl for DoorController<A, E, C>
where
    A: ActuatorPort,
    E: EventSink,
    C: Clock,
{
    fn current_state(&self) -> DoorState {
        DoorController::current_state(self)
    }

    fn target_state(&self) -> TargetDoorState {
        DoorController::target_state(self)
    }

    fn is_obstructed(&self) -> bool {
        DoorController::is_obstructed(self)
    }

    fn command(&self, cmd: DoorCommand) -> Result<(), DoorError> {
        self.handle_command(cmd)
    }
}

impl<T: DoorControl + ?Sized> DoorControl for Arc<T> {
    fn current_state(&self) -> DoorState {
        (**self).current_state()
    }

    fn target_state(&self) -> TargetDoorState {
        (**self).target_state()
    }

    fn is_obstructed(&self) -> bool {
        (**self).is_obstructed()
    }

    fn command(&self, cmd: DoorCommand) -> Result<(), DoorError> {
        (**self).command(cmd)
    }
}

// ───────────────────────────────────────────────────────────────
// DoorFacade
// ───────────────────────────────────────────────────────────────

pub struct DoorFacade<D: DoorControl> {
    door: D,
    info: AccessoryInfo,
}

impl<D: DoorControl> DoorFacade<D> {
    pub fn new(door: D, info: AccessoryInfo) -> Self {
        Self { door, info }
    }

    pub fn accessory_info(&self) -> &AccessoryInfo {
        &self.info
    }

    /// The wrapped controller.
    pub fn door(&self) -> &D {
        &self.door
    }

    /// GET CurrentDoorState, served from the cached snapshot.
    pub fn get_current_door_state(&self) -> u8 {
        let state = self.door.current_state();
        debug!("FACADE: GET CurrentDoorState -> {}", state);
        current_door_state_code(state)
    }

    /// GET TargetDoorState.  Always defined.
    pub fn get_target_door_state(&self) -> u8 {
        target_door_state_code(self.door.target_state())
    }

    /// SET TargetDoorState.  Blocks for at most one relay pulse.
    pub fn set_target_door_state(&self, value: u8) -> Result<(), HapStatus> {
        debug!("FACADE: SET TargetDoorState {}", value);
        let target = TargetDoorState::from_u8(value).ok_or(HapStatus::InvalidValueInRequest)?;
        self.door
            .command(DoorCommand::from(target))
            .map_err(HapStatus::from)
    }

    /// GET ObstructionDetected.
    pub fn get_obstruction_detected(&self) -> bool {
        self.door.is_obstructed()
    }

    /// Characteristic pushes for one outbound event.  Empty for events
    /// that do not change any characteristic.
    pub fn updates_for(event: &DoorEvent) -> heapless::Vec<CharacteristicUpdate, 3> {
        let updates = match *event {
            DoorEvent::Started { state, target } => [
                Some(CharacteristicUpdate::CurrentDoorState(current_door_state_code(state))),
                Some(CharacteristicUpdate::TargetDoorState(target_door_state_code(target))),
                Some(CharacteristicUpdate::ObstructionDetected(
                    state == DoorState::Obstructed,
                )),
            ],
            DoorEvent::StateChanged { from, to, target } => {
                let was = from == DoorState::Obstructed;
                let is = to == DoorState::Obstructed;
                [
                    Some(CharacteristicUpdate::CurrentDoorState(current_door_state_code(to))),
                    Some(CharacteristicUpdate::TargetDoorState(target_door_state_code(target))),
                    (was != is).then_some(CharacteristicUpdate::ObstructionDetected(is)),
                ]
            }
            DoorEvent::PulseFired { .. }
            | DoorEvent::PulseFailed { .. }
            | DoorEvent::CommandRejected { .. }
            | DoorEvent::SensorFault(_)
            | DoorEvent::Stopped => [None, None, None],
        };
        // One slot per array element, so the collect cannot overflow.
        updates.into_iter().flatten().collect()
    }
}

//! Inbound commands to the door core.
//!
//! These are the actions the bridge (or a local button handler) can ask
//! for.  Everything else the door does is driven by sensor samples and the
//! travel timer.

use core::fmt;

use crate::fsm::{TargetDoorState, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCommand {
    Open,
    Close,
}

impl DoorCommand {
    pub fn trigger(self) -> Trigger {
        match self {
            Self::Open => Trigger::OpenRequested,
            Self::Close => Trigger::CloseRequested,
        }
    }
}

impl From<TargetDoorState> for DoorCommand {
    fn from(target: TargetDoorState) -> Self {
        match target {
            TargetDoorState::Open => Self::Open,
            TargetDoorState::Closed => Self::Close,
        }
    }
}

impl fmt::Display for DoorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Close => f.write_str("close"),
        }
    }
}

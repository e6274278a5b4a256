//! Shared context threaded through every door state handler.
//!
//! `DoorContext` holds the policy knobs the handlers consult, the last
//! accepted (debounced) contact position, the travel timer, and the
//! tracked target position.  Handlers read it to decide; only `on_enter`
//! and `on_exit` actions write to it.

use crate::config::{AssumeSuccess, DoorConfig, ReversalPolicy, SensorLayout};
use crate::sensors::ContactPosition;

use super::TargetDoorState;

// ---------------------------------------------------------------------------
// Travel timer
// ---------------------------------------------------------------------------

/// Deadline for the in-flight travel.  Armed on entering `Opening`/`Closing`,
/// cancelled on leaving them.  Lives inside the serialized state path, so
/// re-arming for a new transition atomically replaces the old deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TravelTimer {
    deadline_ms: Option<u64>,
}

impl TravelTimer {
    pub fn arm(&mut self, now_ms: u64, duration_ms: u32) {
        self.deadline_ms = Some(now_ms.saturating_add(duration_ms as u64));
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// `true` once `now_ms` reaches the armed deadline.
    pub fn expired(&self, now_ms: u64) -> bool {
        self.deadline_ms.is_some_and(|d| now_ms >= d)
    }

    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms.map(|d| d.saturating_sub(now_ms))
    }
}

// ---------------------------------------------------------------------------
// DoorContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct DoorContext {
    // -- Timing --
    /// Monotonic time of the trigger being processed (milliseconds).
    pub now_ms: u64,
    pub travel: TravelTimer,
    pub travel_timeout_ms: u32,

    // -- Policy --
    pub reversal_policy: ReversalPolicy,
    pub assume_success: AssumeSuccess,
    pub layout: SensorLayout,

    // -- Tracking --
    /// Last debounced contact position, `None` until the first stable reading.
    pub position: Option<ContactPosition>,
    /// Where the door was last commanded or seen heading.
    pub target: TargetDoorState,
}

impl DoorContext {
    pub fn new(config: &DoorConfig) -> Self {
        Self {
            now_ms: 0,
            travel: TravelTimer::default(),
            travel_timeout_ms: config.travel_timeout_ms,
            reversal_policy: config.reversal_policy,
            assume_success: config.assume_success,
            layout: config.sensor_layout,
            position: None,
            target: TargetDoorState::Closed,
        }
    }

    /// Whether timeout expiry may stand in for an end-stop with no contact.
    pub fn may_assume(&self, target: TargetDoorState) -> bool {
        if self.assume_success == AssumeSuccess::Disabled {
            return false;
        }
        match target {
            TargetDoorState::Open => {
                !self.layout.has_open_contact()
                    && self.position != Some(ContactPosition::FullyClosed)
            }
            TargetDoorState::Closed => !self.layout.has_closed_contact(),
        }
    }
}

//! Function-pointer finite state machine for the door.
//!
//! Same table-driven pattern as a classic embedded FSM, but event-driven
//! rather than ticked:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌────────────┬───────────┬──────────┬──────────────────────┐ │
//! │  │ DoorState   │ on_enter  │ on_exit  │ on_event             │ │
//! │  ├────────────┼───────────┼──────────┼──────────────────────┤ │
//! │  │ Open        │ fn(ctx)   │ -        │ fn(ctx, trig)->Step  │ │
//! │  │ Closed      │ fn(ctx)   │ -        │ fn(ctx, trig)->Step  │ │
//! │  │ Opening     │ fn(ctx)   │ fn(ctx)  │ fn(ctx, trig)->Step  │ │
//! │  │ Closing     │ fn(ctx)   │ fn(ctx)  │ fn(ctx, trig)->Step  │ │
//! │  │ Stopped     │ fn(ctx)   │ -        │ fn(ctx, trig)->Step  │ │
//! │  │ Obstructed  │ fn(ctx)   │ -        │ fn(ctx, trig)->Step  │ │
//! │  └────────────┴───────────┴──────────┴──────────────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! `on_event` is a pure decision: it reads the context and returns a
//! [`Step`].  The caller (the door service) performs any relay pulse
//! first and only then commits the transition with [`Fsm::transition`],
//! so a failed pulse never moves the state.  Every handler matches every
//! [`Trigger`] variant; there is no catch-all arm.

pub mod context;
pub mod states;

use core::fmt;

use context::DoorContext;
use log::info;
use serde::{Deserialize, Serialize};

use crate::sensors::ContactPosition;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// The authoritative door state.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum DoorState {
    Open = 0,
    Closed = 1,
    Opening = 2,
    Closing = 3,
    Stopped = 4,
    Obstructed = 5,
}

impl DoorState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 6;

    pub const ALL: [DoorState; Self::COUNT] = [
        Self::Open,
        Self::Closed,
        Self::Opening,
        Self::Closing,
        Self::Stopped,
        Self::Obstructed,
    ];

    /// Decode a snapshot byte.  `None` for anything outside the six states.
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Open),
            1 => Some(Self::Closed),
            2 => Some(Self::Opening),
            3 => Some(Self::Closing),
            4 => Some(Self::Stopped),
            5 => Some(Self::Obstructed),
            _ => None,
        }
    }

    /// `true` for `Opening` and `Closing`, the states with an armed travel timer.
    pub fn is_travelling(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Opening => "Opening",
            Self::Closing => "Closing",
            Self::Stopped => "Stopped",
            Self::Obstructed => "Obstructed",
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The end position the door was last asked (or seen) to move towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TargetDoorState {
    Open = 0,
    Closed = 1,
}

impl TargetDoorState {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Open),
            1 => Some(Self::Closed),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs and decisions
// ---------------------------------------------------------------------------

/// Everything that can happen to the door state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// An external open command.
    OpenRequested,
    /// An external close command.
    CloseRequested,
    /// The debounced contact position changed.
    Sensed(ContactPosition),
    /// The armed travel timer expired.
    TravelTimeout,
}

impl Trigger {
    /// Commands may drive the relay; observations never do.
    pub fn is_command(self) -> bool {
        matches!(self, Self::OpenRequested | Self::CloseRequested)
    }
}

/// What a state handler decided for one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do (idempotent command or irrelevant observation).
    Stay,
    /// Commit a transition without touching the relay.
    Move(DoorState),
    /// Fire one relay pulse, then commit the transition.
    PulseThen(DoorState),
    /// Refuse the command: a conflicting transition is in flight.
    Reject,
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut DoorContext);

/// Signature for the per-trigger decision handler.
pub type StateEventFn = fn(&DoorContext, Trigger) -> Step;

/// Static descriptor for a single door state.
pub struct StateDescriptor {
    pub id: DoorState,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_event: StateEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The door state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `DoorState as usize`.
    table: [StateDescriptor; DoorState::COUNT],
    current: DoorState,
    /// Number of committed transitions since construction.
    transitions: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; DoorState::COUNT], initial: DoorState) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial,
            transitions: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut DoorContext) {
        info!("FSM starting in state: {}", self.current);
        if let Some(enter) = self.table[self.current as usize].on_enter {
            enter(ctx);
        }
    }

    /// Ask the current state what `trigger` means.  Does not mutate anything.
    pub fn evaluate(&self, trigger: Trigger, ctx: &DoorContext) -> Step {
        (self.table[self.current as usize].on_event)(ctx, trigger)
    }

    /// Commit a transition: `on_exit(current)` → update → `on_enter(next)`.
    /// A transition to the current state is a no-op.
    pub fn transition(&mut self, next: DoorState, ctx: &mut DoorContext) {
        if next == self.current {
            return;
        }

        info!("FSM transition: {} -> {}", self.current, next);

        if let Some(exit) = self.table[self.current as usize].on_exit {
            exit(ctx);
        }

        self.current = next;
        self.transitions += 1;

        if let Some(enter) = self.table[self.current as usize].on_enter {
            enter(ctx);
        }
    }

    pub fn current_state(&self) -> DoorState {
        self.current
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions
    }
}

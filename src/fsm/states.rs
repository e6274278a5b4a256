//! Concrete state handler functions and table builder.
//!
//! ```text
//!            ┌──────[open contact]──────┐
//!            │                          ▼
//!  CLOSED ──[open cmd / pulse]──▶ OPENING ──[timeout]──▶ OBSTRUCTED
//!    ▲                              │  ▲                     │
//!    │                  [close cmd, │  │ [open cmd,          │
//!    │                   reverse]   ▼  │  reverse]           │
//!    └──────[closed contact]──── CLOSING ──[timeout]─────────┘
//!                                   ▲
//!  OPEN ──[close cmd / pulse]───────┘
//!
//!  STOPPED / OBSTRUCTED ──[either cmd / pulse]──▶ OPENING / CLOSING
//!  any resting state ──[end-stop contact]──▶ OPEN / CLOSED
//! ```
//!
//! Each `*_event` handler enumerates every trigger explicitly.

use log::{info, warn};

use super::context::DoorContext;
use super::{DoorState, StateDescriptor, Step, TargetDoorState, Trigger};
use crate::config::ReversalPolicy;
use crate::sensors::ContactPosition;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; DoorState::COUNT] {
    [
        // 0: Open
        StateDescriptor {
            id: DoorState::Open,
            on_enter: Some(open_enter),
            on_exit: None,
            on_event: open_event,
        },
        // 1: Closed
        StateDescriptor {
            id: DoorState::Closed,
            on_enter: Some(closed_enter),
            on_exit: None,
            on_event: closed_event,
        },
        // 2: Opening
        StateDescriptor {
            id: DoorState::Opening,
            on_enter: Some(opening_enter),
            on_exit: Some(travel_exit),
            on_event: opening_event,
        },
        // 3: Closing
        StateDescriptor {
            id: DoorState::Closing,
            on_enter: Some(closing_enter),
            on_exit: Some(travel_exit),
            on_event: closing_event,
        },
        // 4: Stopped
        StateDescriptor {
            id: DoorState::Stopped,
            on_enter: Some(stopped_enter),
            on_exit: None,
            on_event: resting_event,
        },
        // 5: Obstructed
        StateDescriptor {
            id: DoorState::Obstructed,
            on_enter: Some(obstructed_enter),
            on_exit: None,
            on_event: resting_event,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPEN
// ═══════════════════════════════════════════════════════════════════════════

fn open_enter(ctx: &mut DoorContext) {
    ctx.target = TargetDoorState::Open;
    info!("OPEN: door at open end-stop");
}

fn open_event(ctx: &DoorContext, trigger: Trigger) -> Step {
    match trigger {
        Trigger::OpenRequested => Step::Stay,
        Trigger::CloseRequested => Step::PulseThen(DoorState::Closing),
        Trigger::Sensed(ContactPosition::FullyOpen) => Step::Stay,
        // Closed by the wall button or a remote faster than we saw it leave.
        Trigger::Sensed(ContactPosition::FullyClosed) => Step::Move(DoorState::Closed),
        Trigger::Sensed(ContactPosition::Between) => {
            // With a closed-only layout "between" is the normal open reading.
            if ctx.layout.has_open_contact() {
                Step::Move(DoorState::Closing)
            } else {
                Step::Stay
            }
        }
        Trigger::TravelTimeout => Step::Stay,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOSED
// ═══════════════════════════════════════════════════════════════════════════

fn closed_enter(ctx: &mut DoorContext) {
    ctx.target = TargetDoorState::Closed;
    info!("CLOSED: door at closed end-stop");
}

fn closed_event(_ctx: &DoorContext, trigger: Trigger) -> Step {
    match trigger {
        Trigger::OpenRequested => Step::PulseThen(DoorState::Opening),
        Trigger::CloseRequested => Step::Stay,
        Trigger::Sensed(ContactPosition::FullyClosed) => Step::Stay,
        Trigger::Sensed(ContactPosition::FullyOpen) => Step::Move(DoorState::Open),
        // Door left the closed contact without a command from us.
        Trigger::Sensed(ContactPosition::Between) => Step::Move(DoorState::Opening),
        Trigger::TravelTimeout => Step::Stay,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPENING
// ═══════════════════════════════════════════════════════════════════════════

fn opening_enter(ctx: &mut DoorContext) {
    ctx.target = TargetDoorState::Open;
    ctx.travel.arm(ctx.now_ms, ctx.travel_timeout_ms);
    info!("OPENING: travel timer armed for {}ms", ctx.travel_timeout_ms);
}

fn opening_event(ctx: &DoorContext, trigger: Trigger) -> Step {
    match trigger {
        Trigger::OpenRequested => Step::Stay,
        Trigger::CloseRequested => reverse_or_reject(ctx, DoorState::Closing),
        Trigger::Sensed(ContactPosition::FullyOpen) => Step::Move(DoorState::Open),
        // Left the closed contact and came back: stalled or bounced off something.
        Trigger::Sensed(ContactPosition::FullyClosed) => Step::Move(DoorState::Obstructed),
        Trigger::Sensed(ContactPosition::Between) => Step::Stay,
        Trigger::TravelTimeout => {
            if ctx.may_assume(TargetDoorState::Open) {
                info!("OPENING: timeout, open assumed (no open contact)");
                Step::Move(DoorState::Open)
            } else {
                warn!("OPENING: no open confirmation within {}ms", ctx.travel_timeout_ms);
                Step::Move(DoorState::Obstructed)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLOSING
// ═══════════════════════════════════════════════════════════════════════════

fn closing_enter(ctx: &mut DoorContext) {
    ctx.target = TargetDoorState::Closed;
    ctx.travel.arm(ctx.now_ms, ctx.travel_timeout_ms);
    info!("CLOSING: travel timer armed for {}ms", ctx.travel_timeout_ms);
}

fn closing_event(ctx: &DoorContext, trigger: Trigger) -> Step {
    match trigger {
        Trigger::OpenRequested => reverse_or_reject(ctx, DoorState::Opening),
        Trigger::CloseRequested => Step::Stay,
        Trigger::Sensed(ContactPosition::FullyClosed) => Step::Move(DoorState::Closed),
        // Opener auto-reversed back to the open end-stop.
        Trigger::Sensed(ContactPosition::FullyOpen) => Step::Move(DoorState::Obstructed),
        Trigger::Sensed(ContactPosition::Between) => Step::Stay,
        Trigger::TravelTimeout => {
            if ctx.may_assume(TargetDoorState::Closed) {
                info!("CLOSING: timeout, closed assumed (no closed contact)");
                Step::Move(DoorState::Closed)
            } else {
                warn!("CLOSING: no closed confirmation within {}ms", ctx.travel_timeout_ms);
                Step::Move(DoorState::Obstructed)
            }
        }
    }
}

fn travel_exit(ctx: &mut DoorContext) {
    ctx.travel.cancel();
}

// ═══════════════════════════════════════════════════════════════════════════
//  STOPPED / OBSTRUCTED: door at rest away from a confirmed end-stop
// ═══════════════════════════════════════════════════════════════════════════

fn stopped_enter(_ctx: &mut DoorContext) {
    info!("STOPPED: door position unconfirmed");
}

fn obstructed_enter(ctx: &mut DoorContext) {
    warn!(
        "OBSTRUCTED: travel towards {:?} did not complete (position={:?})",
        ctx.target, ctx.position
    );
}

fn resting_event(_ctx: &DoorContext, trigger: Trigger) -> Step {
    match trigger {
        Trigger::OpenRequested => Step::PulseThen(DoorState::Opening),
        Trigger::CloseRequested => Step::PulseThen(DoorState::Closing),
        Trigger::Sensed(ContactPosition::FullyOpen) => Step::Move(DoorState::Open),
        Trigger::Sensed(ContactPosition::FullyClosed) => Step::Move(DoorState::Closed),
        Trigger::Sensed(ContactPosition::Between) => Step::Stay,
        Trigger::TravelTimeout => Step::Stay,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn reverse_or_reject(ctx: &DoorContext, towards: DoorState) -> Step {
    match ctx.reversal_policy {
        ReversalPolicy::ReverseOnOppositeCommand => Step::PulseThen(towards),
        ReversalPolicy::RejectWhileBusy => Step::Reject,
    }
}

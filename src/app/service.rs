//! Door service, the hexagonal core.
//!
//! [`DoorService`] owns the FSM, its context, and the contact debouncer.
//! It is single-threaded (`&mut self`) and hardware-agnostic: the relay and
//! the event sink are injected at each call site, which keeps the whole
//! state machine testable with mock adapters.  Serialization across
//! threads is the job of [`DoorController`](super::controller::DoorController).
//!
//! ```text
//!  DoorCommand ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  SensorSample ──▶ │      DoorService       │
//!  timer check ───▶ │  FSM · Debouncer       │ ──▶ ActuatorPort
//!                  └────────────────────────┘
//! ```
//!
//! Commands are the only triggers allowed to pulse the relay.  The pulse
//! is fired *before* the transition is committed, so a failed pulse leaves
//! the state untouched.

use log::{debug, info, warn};

use crate::config::{DoorConfig, SensorLayout};
use crate::error::{DoorError, SensorError};
use crate::fsm::context::DoorContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{DoorState, Fsm, Step, TargetDoorState, Trigger};
use crate::sensors::debounce::Debouncer;
use crate::sensors::{ContactPosition, SensorSample};

use super::commands::DoorCommand;
use super::events::DoorEvent;
use super::ports::{ActuatorPort, EventSink};

// ───────────────────────────────────────────────────────────────
// DoorService
// ───────────────────────────────────────────────────────────────

pub struct DoorService {
    fsm: Fsm,
    ctx: DoorContext,
    debouncer: Debouncer,
    default_state: DoorState,
    pulses: u32,
}

impl DoorService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: &DoorConfig) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), config.initial_state),
            ctx: DoorContext::new(config),
            debouncer: Debouncer::new(config.debounce_samples, config.debounce_min_stable_ms),
            default_state: config.initial_state,
            pulses: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Initialise the state from `initial` when it pins the door to an
    /// end-stop, otherwise from the configured default.
    pub fn start(&mut self, initial: Option<SensorSample>, now_ms: u64, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;

        // A sensor-less reader only ever reports "between"; that is not a position.
        let initial = initial.filter(|_| self.ctx.layout != SensorLayout::None);
        let position = match initial.as_ref().map(ContactPosition::from_sample) {
            Some(Ok(p)) => Some(p),
            Some(Err(e)) => {
                warn!("DOOR: startup reading unusable: {}", e);
                sink.emit(&DoorEvent::SensorFault(e));
                None
            }
            None => None,
        };
        if let Some(p) = position {
            self.debouncer.seed(p);
        }
        self.ctx.position = position;

        let state = match position {
            Some(ContactPosition::FullyClosed) => DoorState::Closed,
            Some(ContactPosition::FullyOpen) => DoorState::Open,
            Some(ContactPosition::Between) | None => self.default_state,
        };
        self.fsm = Fsm::new(build_state_table(), state);
        self.fsm.start(&mut self.ctx);

        // Off an end-stop the door is presumed open (it is not closed).
        if state == DoorState::Stopped || state == DoorState::Obstructed {
            self.ctx.target = match position {
                Some(ContactPosition::Between) => TargetDoorState::Open,
                _ => TargetDoorState::Closed,
            };
        }

        sink.emit(&DoorEvent::Started {
            state,
            target: self.ctx.target,
        });
        info!(
            "DOOR: started in {} (target={:?}, position={:?})",
            state, self.ctx.target, position
        );
    }

    // ── Commands ──────────────────────────────────────────────

    /// Apply an external command.
    ///
    /// - no-op when the door is already at or heading to the target
    /// - one relay pulse plus a transition otherwise
    /// - [`DoorError::BusyRejected`] for an opposing command mid-travel
    ///   under the reject-while-busy policy
    pub fn handle_command(
        &mut self,
        cmd: DoorCommand,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<(), DoorError> {
        self.ctx.now_ms = now_ms;
        let state = self.fsm.current_state();

        match self.fsm.evaluate(cmd.trigger(), &self.ctx) {
            Step::Stay => {
                debug!("DOOR: {} ignored, already {}", cmd, state);
                Ok(())
            }
            Step::Reject => {
                info!("DOOR: {} rejected while {}", cmd, state);
                sink.emit(&DoorEvent::CommandRejected {
                    command: cmd,
                    state,
                });
                Err(DoorError::BusyRejected(state))
            }
            Step::Move(next) => {
                self.commit(next, sink);
                Ok(())
            }
            Step::PulseThen(next) => {
                if let Err(e) = hw.pulse() {
                    warn!("DOOR: {} failed, relay error: {}", cmd, e);
                    sink.emit(&DoorEvent::PulseFailed {
                        command: cmd,
                        error: e,
                    });
                    return Err(e.into());
                }
                self.pulses = self.pulses.wrapping_add(1);
                sink.emit(&DoorEvent::PulseFired {
                    command: cmd,
                    count: self.pulses,
                });
                self.commit(next, sink);
                Ok(())
            }
        }
    }

    pub fn request_open(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<(), DoorError> {
        self.handle_command(DoorCommand::Open, now_ms, hw, sink)
    }

    pub fn request_close(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<(), DoorError> {
        self.handle_command(DoorCommand::Close, now_ms, hw, sink)
    }

    // ── Observations ──────────────────────────────────────────

    /// Feed one raw reading through the debouncer.  A change of the
    /// debounced position reaches the state machine, and so does a fresh
    /// reading that confirms the end-stop the current travel is heading to.
    pub fn on_sensor_sample(&mut self, sample: SensorSample, sink: &mut impl EventSink) {
        if self.ctx.layout == SensorLayout::None {
            return;
        }
        let position = match ContactPosition::from_sample(&sample) {
            Ok(p) => p,
            Err(e) => return self.on_sensor_fault(e, sink),
        };
        match self.debouncer.feed(position, sample.timestamp_ms) {
            Some(accepted) => {
                debug!("DOOR: debounced position {:?}", accepted);
                self.ctx.position = Some(accepted);
                self.observe(Trigger::Sensed(accepted), sample.timestamp_ms, sink);
            }
            // Travel entered while already resting on its target end-stop
            // (a reversal that stopped the door there): the debouncer has
            // nothing new to report, so confirm from the steady reading.
            None if self.debouncer.stable() == Some(position) && self.heading_to(position) => {
                debug!("DOOR: travel target {:?} already reached", position);
                self.observe(Trigger::Sensed(position), sample.timestamp_ms, sink);
            }
            None => {}
        }
    }

    /// A read failed: keep the last stable position.  Only the travel
    /// timeout escalates a missing confirmation to `Obstructed`.
    pub fn on_sensor_fault(&mut self, error: SensorError, sink: &mut impl EventSink) {
        warn!("DOOR: sensor fault ({}), keeping last stable position", error);
        sink.emit(&DoorEvent::SensorFault(error));
    }

    /// The travel timer fired.
    pub fn on_travel_timeout(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        self.observe(Trigger::TravelTimeout, now_ms, sink);
    }

    /// Fire the travel timeout if its deadline has passed.  Returns `true`
    /// when it fired.
    pub fn poll_timer(&mut self, now_ms: u64, sink: &mut impl EventSink) -> bool {
        if !self.ctx.travel.expired(now_ms) {
            return false;
        }
        self.on_travel_timeout(now_ms, sink);
        true
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> DoorState {
        self.fsm.current_state()
    }

    pub fn target(&self) -> TargetDoorState {
        self.ctx.target
    }

    /// Whether the last completed or in-progress transition ended in
    /// `Obstructed`.
    pub fn is_obstructed(&self) -> bool {
        self.fsm.current_state() == DoorState::Obstructed
    }

    /// Last debounced contact position.
    pub fn position(&self) -> Option<ContactPosition> {
        self.ctx.position
    }

    pub fn travel_deadline_ms(&self) -> Option<u64> {
        self.ctx.travel.deadline_ms()
    }

    /// Relay pulses fired on behalf of commands.
    pub fn pulse_count(&self) -> u32 {
        self.pulses
    }

    pub fn transition_count(&self) -> u64 {
        self.fsm.transition_count()
    }

    // ── Internal ──────────────────────────────────────────────

    fn heading_to(&self, position: ContactPosition) -> bool {
        matches!(
            (self.fsm.current_state(), position),
            (DoorState::Opening, ContactPosition::FullyOpen)
                | (DoorState::Closing, ContactPosition::FullyClosed)
        )
    }

    fn observe(&mut self, trigger: Trigger, now_ms: u64, sink: &mut impl EventSink) {
        self.ctx.now_ms = now_ms;
        match self.fsm.evaluate(trigger, &self.ctx) {
            Step::Stay => {}
            Step::Move(next) => self.commit(next, sink),
            step @ (Step::PulseThen(_) | Step::Reject) => {
                warn!(
                    "DOOR: {:?} in {} produced {:?}, ignored",
                    trigger,
                    self.fsm.current_state(),
                    step
                );
            }
        }
    }

    fn commit(&mut self, next: DoorState, sink: &mut impl EventSink) {
        let from = self.fsm.current_state();
        if from == next {
            return;
        }
        self.fsm.transition(next, &mut self.ctx);
        sink.emit(&DoorEvent::StateChanged {
            from,
            to: next,
            target: self.ctx.target,
        });
    }
}

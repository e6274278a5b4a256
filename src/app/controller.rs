//! Thread-safe door controller.
//!
//! Wraps a [`DoorService`] plus its relay and event sink in one `Mutex`:
//! commands, sensor samples, and timer checks are all serialized through
//! it.  After every mutation the state and target are published into
//! atomics, so [`current_state`](DoorController::current_state) and friends
//! never wait on the lock, even while a pulse is in flight.
//!
//! ```text
//!  bridge task ──request_open()──┐
//!                                ▼
//!  poller thread ──sample()──▶ Mutex<DoorService + relay + sink> ──▶ AtomicU8 snapshots
//!        └────────poll_timer()───┘                                     ▲
//!                                        current_state() ──────────────┘
//! ```
//!
//! One explicitly owned instance: build it with [`new`](DoorController::new),
//! call [`start`](DoorController::start), share it through `Arc`, and
//! [`shutdown`](DoorController::shutdown) it.  The lifecycle runs once; a
//! shut-down controller cannot be restarted.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};

use crate::config::{DoorConfig, SensorLayout};
use crate::drivers::task_pin::{Core, TaskSpec};
use crate::error::{ConfigError, DoorError, SensorError};
use crate::fsm::{DoorState, TargetDoorState};
use crate::sensors::SensorSample;

use super::commands::DoorCommand;
use super::events::DoorEvent;
use super::ports::{ActuatorPort, Clock, EventSink, SensorPort};
use super::service::DoorService;

const POLLER_TASK: TaskSpec = TaskSpec {
    name: "door-poll\0",
    core: Core::App,
    priority: 5,
    stack_kb: 6,
};

struct Inner<A, E> {
    service: DoorService,
    actuator: A,
    sink: E,
}

pub struct DoorController<A, E, C> {
    inner: Mutex<Inner<A, E>>,
    clock: C,
    state: AtomicU8,
    target: AtomicU8,
    running: AtomicBool,
    shut_down: AtomicBool,
    poll_interval_ms: u32,
    layout: SensorLayout,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl<A, E, C> DoorController<A, E, C>
where
    A: ActuatorPort,
    E: EventSink,
    C: Clock,
{
    /// Validate `config` and build a stopped controller.
    pub fn new(config: &DoorConfig, actuator: A, sink: E, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Mutex::new(Inner {
                service: DoorService::new(config),
                actuator,
                sink,
            }),
            clock,
            state: AtomicU8::new(config.initial_state as u8),
            target: AtomicU8::new(TargetDoorState::Closed as u8),
            running: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            poll_interval_ms: config.sensor_poll_interval_ms,
            layout: config.sensor_layout,
            poller: Mutex::new(None),
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Initialise the door state from `initial` (or the configured default)
    /// and start accepting commands.  A second call, or a call after
    /// [`shutdown`](Self::shutdown), is ignored.
    pub fn start(&self, initial: Option<SensorSample>) {
        let mut inner = self.lock();
        if self.shut_down.load(Ordering::Acquire) {
            warn!("DOOR: start() after shutdown, ignored");
            return;
        }
        if self.running.load(Ordering::Acquire) {
            warn!("DOOR: start() while already running, ignored");
            return;
        }
        let now = self.clock.now_ms();
        let Inner { service, sink, .. } = &mut *inner;
        service.start(initial, now, sink);
        self.publish(service);
        self.running.store(true, Ordering::Release);
    }

    /// Stop accepting commands, stop and join the poller thread.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = handle {
            if h.join().is_err() {
                warn!("DOOR: poller thread panicked");
            }
        }
        self.lock().sink.emit(&DoorEvent::Stopped);
        info!("DOOR: controller shut down");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    // ── Commands ──────────────────────────────────────────────

    /// Blocks for at most one relay pulse.  `running` is checked under the
    /// lock, so no pulse can follow a shutdown that has already begun.
    pub fn handle_command(&self, cmd: DoorCommand) -> Result<(), DoorError> {
        let mut inner = self.lock();
        if !self.is_running() {
            return Err(DoorError::NotRunning);
        }
        let now = self.clock.now_ms();
        let Inner {
            service,
            actuator,
            sink,
        } = &mut *inner;
        let result = service.handle_command(cmd, now, actuator, sink);
        self.publish(service);
        result
    }

    pub fn request_open(&self) -> Result<(), DoorError> {
        self.handle_command(DoorCommand::Open)
    }

    pub fn request_close(&self) -> Result<(), DoorError> {
        self.handle_command(DoorCommand::Close)
    }

    // ── Observations ──────────────────────────────────────────

    pub fn on_sensor_sample(&self, sample: SensorSample) {
        self.with_service(|service, sink| service.on_sensor_sample(sample, sink));
    }

    pub fn on_sensor_fault(&self, error: SensorError) {
        self.with_service(|service, sink| service.on_sensor_fault(error, sink));
    }

    /// Timer callback entry point.  Prefer [`poll_timer`](Self::poll_timer),
    /// which only fires when the armed deadline has passed.
    pub fn on_travel_timeout(&self) {
        let now = self.clock.now_ms();
        self.with_service(|service, sink| service.on_travel_timeout(now, sink));
    }

    /// Fire the travel timeout if due.  The check and the transition happen
    /// under one lock, so a timer re-armed by a newer command is never hit
    /// by the old deadline.
    pub fn poll_timer(&self) -> bool {
        let now = self.clock.now_ms();
        let mut fired = false;
        self.with_service(|service, sink| fired = service.poll_timer(now, sink));
        fired
    }

    // ── Lock-free queries ─────────────────────────────────────

    pub fn current_state(&self) -> DoorState {
        DoorState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or(DoorState::Stopped)
    }

    pub fn target_state(&self) -> TargetDoorState {
        TargetDoorState::from_u8(self.target.load(Ordering::Acquire))
            .unwrap_or(TargetDoorState::Closed)
    }

    pub fn is_obstructed(&self) -> bool {
        self.current_state() == DoorState::Obstructed
    }

    // ── Locked queries ────────────────────────────────────────

    pub fn pulse_count(&self) -> u32 {
        self.lock().service.pulse_count()
    }

    pub fn travel_deadline_ms(&self) -> Option<u64> {
        self.lock().service.travel_deadline_ms()
    }

    // ── Internal ──────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner<A, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_service(&self, f: impl FnOnce(&mut DoorService, &mut E)) {
        let mut inner = self.lock();
        if !self.is_running() {
            return;
        }
        let Inner { service, sink, .. } = &mut *inner;
        f(service, sink);
        self.publish(service);
    }

    fn publish(&self, service: &DoorService) {
        self.state.store(service.state() as u8, Ordering::Release);
        self.target.store(service.target() as u8, Ordering::Release);
    }
}

impl<A, E, C> DoorController<A, E, C>
where
    A: ActuatorPort + Send + 'static,
    E: EventSink + Send + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Spawn the poller on the app core.  Every `sensor_poll_interval_ms`
    /// it samples `sensor` (if any) and checks the travel timer.  Runs
    /// until [`shutdown`](Self::shutdown).
    pub fn spawn_poller<S>(self: &Arc<Self>, sensor: Option<S>) -> io::Result<()>
    where
        S: SensorPort + Send + 'static,
    {
        if let Some(s) = sensor.as_ref() {
            if s.layout() != self.layout {
                warn!(
                    "DOOR: sensor reader wires {:?}, config expects {:?}",
                    s.layout(),
                    self.layout
                );
            }
        }
        let me = Arc::clone(self);
        let mut sensor = sensor;
        let interval = Duration::from_millis(self.poll_interval_ms as u64);

        let handle = POLLER_TASK.spawn(move || {
            info!("DOOR: poller running every {:?}", interval);
            while me.is_running() {
                if let Some(s) = sensor.as_mut() {
                    match s.sample(me.clock.now_ms()) {
                        Ok(sample) => me.on_sensor_sample(sample),
                        Err(e) => me.on_sensor_fault(e),
                    }
                }
                me.poll_timer();
                std::thread::sleep(interval);
            }
            info!("DOOR: poller stopped");
        })?;

        let previous = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if previous.is_some() {
            warn!("DOOR: replaced an existing poller handle");
        }
        Ok(())
    }
}

//! Mock hardware shared by the integration tests.
//!
//! Every mock hands out a cloneable handle so a test can keep observing
//! after the controller has taken ownership of the adapter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use garagedoor::app::events::DoorEvent;
use garagedoor::app::ports::{ActuatorPort, Clock, EventSink, SensorPort};
use garagedoor::config::SensorLayout;
use garagedoor::error::{ActuatorError, SensorError};
use garagedoor::sensors::SensorSample;

// ── Relay ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockRelay {
    pulses: Arc<AtomicU32>,
    entered: Arc<AtomicU32>,
    fail: Arc<AtomicBool>,
    held: Arc<AtomicBool>,
}

impl MockRelay {
    pub fn pulses(&self) -> u32 {
        self.pulses.load(Ordering::SeqCst)
    }

    /// Pulses started, including one still held.
    pub fn entered(&self) -> u32 {
        self.entered.load(Ordering::SeqCst)
    }

    /// While held, `pulse()` blocks inside the controller lock.
    pub fn hold(&self, held: bool) {
        self.held.store(held, Ordering::SeqCst);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl ActuatorPort for MockRelay {
    fn pulse(&mut self) -> Result<(), ActuatorError> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        while self.held.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(1));
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.pulses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<DoorEvent>>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<DoorEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, event: &DoorEvent) -> bool {
        self.0.lock().unwrap().contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &DoorEvent) {
        self.0.lock().unwrap().push(*event);
    }
}

// ── Sensors ───────────────────────────────────────────────────

/// Replays queued readings, then repeats the last one forever.
#[derive(Clone)]
pub struct ScriptedSensors {
    layout: SensorLayout,
    script: Arc<Mutex<VecDeque<Result<(bool, Option<bool>), SensorError>>>>,
    last: Arc<Mutex<Result<(bool, Option<bool>), SensorError>>>,
}

impl ScriptedSensors {
    pub fn new(layout: SensorLayout, closed: bool, open: Option<bool>) -> Self {
        Self {
            layout,
            script: Arc::default(),
            last: Arc::new(Mutex::new(Ok((closed, open)))),
        }
    }

    /// Switch the steady reading from now on.
    pub fn hold(&self, closed: bool, open: Option<bool>) {
        self.script.lock().unwrap().clear();
        *self.last.lock().unwrap() = Ok((closed, open));
    }

    pub fn push_fault(&self, error: SensorError) {
        self.script.lock().unwrap().push_back(Err(error));
    }
}

impl SensorPort for ScriptedSensors {
    fn sample(&mut self, now_ms: u64) -> Result<SensorSample, SensorError> {
        let next = self.script.lock().unwrap().pop_front();
        let reading = match next {
            Some(r) => r,
            None => *self.last.lock().unwrap(),
        };
        reading.map(|(closed_contact, open_contact)| SensorSample {
            closed_contact,
            open_contact,
            timestamp_ms: now_ms,
        })
    }

    fn layout(&self) -> SensorLayout {
        self.layout
    }
}

pub fn sample(closed: bool, open: Option<bool>, ts: u64) -> SensorSample {
    SensorSample {
        closed_contact: closed,
        open_contact: open,
        timestamp_ms: ts,
    }
}

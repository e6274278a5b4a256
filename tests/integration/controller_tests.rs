//! DoorController lifecycle, serialization, and poller behaviour.

use std::sync::Arc;
use std::time::{Duration, Instant};

use garagedoor::app::controller::DoorController;
use garagedoor::app::events::DoorEvent;
use garagedoor::app::ports::Clock;
use garagedoor::config::{DoorConfig, ReversalPolicy, SensorLayout};
use garagedoor::error::{ActuatorError, ConfigError, DoorError, HardwareFault, SensorError};
use garagedoor::fsm::{DoorState, TargetDoorState};

use crate::mock_hw::{sample, ManualClock, MockRelay, RecordingSink, ScriptedSensors};

type TestController = DoorController<MockRelay, RecordingSink, ManualClock>;

struct Rig {
    door: TestController,
    relay: MockRelay,
    sink: RecordingSink,
    clock: ManualClock,
}

fn rig(cfg: &DoorConfig) -> Rig {
    let relay = MockRelay::default();
    let sink = RecordingSink::default();
    let clock = ManualClock::default();
    let door = DoorController::new(cfg, relay.clone(), sink.clone(), clock.clone()).unwrap();
    Rig {
        door,
        relay,
        sink,
        clock,
    }
}

fn closed_rig(cfg: &DoorConfig) -> Rig {
    let r = rig(cfg);
    r.door.start(Some(sample(true, Some(false), 0)));
    r
}

fn feed(door: &TestController, clock: &ManualClock, closed: bool, open: Option<bool>) {
    for _ in 0..3 {
        clock.advance(100);
        door.on_sensor_sample(sample(closed, open, clock.now_ms()));
    }
}

fn wait_for(door: &TestController, state: DoorState) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if door.current_state() == state {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let cfg = DoorConfig {
        travel_timeout_ms: 10,
        ..DoorConfig::default()
    };
    let result = DoorController::new(
        &cfg,
        MockRelay::default(),
        RecordingSink::default(),
        ManualClock::default(),
    );
    assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
}

#[test]
fn commands_before_start_are_refused() {
    let r = rig(&DoorConfig::default());
    assert!(!r.door.is_running());
    assert_eq!(r.door.request_open(), Err(DoorError::NotRunning));
    assert_eq!(r.relay.pulses(), 0);
}

#[test]
fn start_publishes_snapshot_from_contacts() {
    let r = closed_rig(&DoorConfig::default());
    assert!(r.door.is_running());
    assert_eq!(r.door.current_state(), DoorState::Closed);
    assert_eq!(r.door.target_state(), TargetDoorState::Closed);
    assert!(r.sink.contains(&DoorEvent::Started {
        state: DoorState::Closed,
        target: TargetDoorState::Closed,
    }));
}

#[test]
fn second_start_is_ignored() {
    let r = closed_rig(&DoorConfig::default());
    r.door.start(Some(sample(false, Some(true), 0)));
    assert_eq!(r.door.current_state(), DoorState::Closed);
    let starts = r
        .sink
        .events()
        .iter()
        .filter(|e| matches!(e, DoorEvent::Started { .. }))
        .count();
    assert_eq!(starts, 1);
}

#[test]
fn open_is_confirmed_by_open_contact() {
    let r = closed_rig(&DoorConfig::default());
    r.door.request_open().unwrap();
    assert_eq!(r.relay.pulses(), 1);
    assert_eq!(r.door.current_state(), DoorState::Opening);
    assert_eq!(r.door.target_state(), TargetDoorState::Open);

    feed(&r.door, &r.clock, false, Some(false));
    assert_eq!(r.door.current_state(), DoorState::Opening);
    feed(&r.door, &r.clock, false, Some(true));
    assert_eq!(r.door.current_state(), DoorState::Open);
    assert_eq!(r.door.travel_deadline_ms(), None);
}

#[test]
fn timer_only_fires_after_deadline() {
    let cfg = DoorConfig::default();
    let r = closed_rig(&cfg);
    r.door.request_open().unwrap();

    r.clock.advance(cfg.travel_timeout_ms as u64 - 1);
    assert!(!r.door.poll_timer());
    assert_eq!(r.door.current_state(), DoorState::Opening);

    r.clock.advance(1);
    assert!(r.door.poll_timer());
    assert_eq!(r.door.current_state(), DoorState::Obstructed);
    assert!(r.door.is_obstructed());
}

#[test]
fn new_command_rearms_the_travel_timer() {
    let cfg = DoorConfig {
        reversal_policy: ReversalPolicy::ReverseOnOppositeCommand,
        ..DoorConfig::default()
    };
    let r = rig(&cfg);
    r.door.start(Some(sample(false, Some(true), 0)));
    r.door.request_close().unwrap();

    r.clock.set(10_000);
    r.door.request_open().unwrap();
    assert_eq!(r.relay.pulses(), 2);

    // The deadline armed by the close has passed; the open's has not.
    r.clock.set(cfg.travel_timeout_ms as u64 + 1);
    assert!(!r.door.poll_timer());
    assert_eq!(r.door.current_state(), DoorState::Opening);
    assert_eq!(
        r.door.travel_deadline_ms(),
        Some(10_000 + cfg.travel_timeout_ms as u64)
    );
}

#[test]
fn busy_rejection_keeps_state_and_snapshot() {
    let r = rig(&DoorConfig::default());
    r.door.start(Some(sample(false, Some(true), 0)));
    r.door.request_close().unwrap();
    assert_eq!(
        r.door.request_open(),
        Err(DoorError::BusyRejected(DoorState::Closing))
    );
    assert_eq!(r.door.current_state(), DoorState::Closing);
    assert_eq!(r.door.target_state(), TargetDoorState::Closed);
    assert_eq!(r.relay.pulses(), 1);
}

#[test]
fn pulse_failure_surfaces_hardware_fault() {
    let r = rig(&DoorConfig::default());
    r.door.start(Some(sample(false, Some(true), 0)));
    r.relay.set_failing(true);
    assert_eq!(
        r.door.request_close(),
        Err(DoorError::HardwareFault(HardwareFault::Actuator(
            ActuatorError::GpioWriteFailed
        )))
    );
    assert_eq!(r.door.current_state(), DoorState::Open);
    assert_eq!(r.door.travel_deadline_ms(), None);

    r.relay.set_failing(false);
    r.door.request_close().unwrap();
    assert_eq!(r.door.current_state(), DoorState::Closing);
}

#[test]
fn concurrent_opens_pulse_once() {
    let r = closed_rig(&DoorConfig::default());
    let door = Arc::new(r.door);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let d = Arc::clone(&door);
            std::thread::spawn(move || d.request_open())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), Ok(()));
    }
    assert_eq!(r.relay.pulses(), 1);
    assert_eq!(door.pulse_count(), 1);
    assert_eq!(door.current_state(), DoorState::Opening);
}

#[test]
fn observations_are_ignored_when_not_running() {
    let r = rig(&DoorConfig::default());
    feed(&r.door, &r.clock, false, Some(true));
    r.door.on_sensor_fault(SensorError::GpioReadFailed);
    assert!(r.sink.events().is_empty());
}

#[test]
fn shutdown_is_idempotent_and_stops_commands() {
    let r = closed_rig(&DoorConfig::default());
    r.door.shutdown();
    r.door.shutdown();
    assert!(!r.door.is_running());
    assert_eq!(r.door.request_open(), Err(DoorError::NotRunning));
    let stops = r
        .sink
        .events()
        .iter()
        .filter(|e| **e == DoorEvent::Stopped)
        .count();
    assert_eq!(stops, 1);
}

#[test]
fn restart_after_shutdown_is_refused() {
    let r = closed_rig(&DoorConfig::default());
    r.door.shutdown();
    r.door.start(Some(sample(true, Some(false), 0)));
    assert!(!r.door.is_running());
    assert_eq!(r.door.request_open(), Err(DoorError::NotRunning));
    assert_eq!(r.relay.pulses(), 0);
    let starts = r
        .sink
        .events()
        .iter()
        .filter(|e| matches!(e, DoorEvent::Started { .. }))
        .count();
    assert_eq!(starts, 1);
}

#[test]
fn command_waiting_on_lock_during_shutdown_never_pulses() {
    let cfg = DoorConfig {
        reversal_policy: ReversalPolicy::ReverseOnOppositeCommand,
        ..DoorConfig::default()
    };
    let Rig {
        door, relay, sink, ..
    } = closed_rig(&cfg);
    let door = Arc::new(door);

    relay.hold(true);
    let opener = {
        let d = Arc::clone(&door);
        std::thread::spawn(move || d.request_open())
    };
    while relay.entered() == 0 {
        std::thread::sleep(Duration::from_millis(1));
    }
    let closer = {
        let d = Arc::clone(&door);
        std::thread::spawn(move || d.request_close())
    };
    std::thread::sleep(Duration::from_millis(50));
    let stopper = {
        let d = Arc::clone(&door);
        std::thread::spawn(move || d.shutdown())
    };
    while door.is_running() {
        std::thread::sleep(Duration::from_millis(1));
    }
    relay.hold(false);

    assert_eq!(opener.join().unwrap(), Ok(()));
    assert_eq!(closer.join().unwrap(), Err(DoorError::NotRunning));
    stopper.join().unwrap();
    assert_eq!(relay.entered(), 1);
    assert_eq!(relay.pulses(), 1);
    assert_eq!(sink.events().last(), Some(&DoorEvent::Stopped));
}

#[test]
fn poller_drives_door_to_open() {
    let cfg = DoorConfig {
        sensor_poll_interval_ms: 10,
        ..DoorConfig::default()
    };
    let r = closed_rig(&cfg);
    let door = Arc::new(r.door);
    let sensors = ScriptedSensors::new(SensorLayout::ClosedAndOpen, true, Some(false));
    door.spawn_poller(Some(sensors.clone())).unwrap();

    door.request_open().unwrap();
    sensors.hold(false, Some(true));
    assert!(wait_for(&door, DoorState::Open));

    door.shutdown();
    assert!(r.sink.contains(&DoorEvent::Stopped));
}

#[test]
fn poller_reports_faults_without_moving() {
    let cfg = DoorConfig {
        sensor_poll_interval_ms: 10,
        ..DoorConfig::default()
    };
    let r = closed_rig(&cfg);
    let door = Arc::new(r.door);
    let sensors = ScriptedSensors::new(SensorLayout::ClosedAndOpen, true, Some(false));
    sensors.push_fault(SensorError::GpioReadFailed);
    door.spawn_poller(Some(sensors)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while !r
        .sink
        .contains(&DoorEvent::SensorFault(SensorError::GpioReadFailed))
    {
        assert!(Instant::now() < deadline, "fault never reported");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(door.current_state(), DoorState::Closed);
    door.shutdown();
}

#[test]
fn sensorless_poller_still_expires_travel() {
    let cfg = DoorConfig {
        sensor_poll_interval_ms: 10,
        ..DoorConfig::default()
    };
    let r = closed_rig(&cfg);
    let door = Arc::new(r.door);
    door.spawn_poller(None::<ScriptedSensors>).unwrap();

    door.request_open().unwrap();
    r.clock.advance(cfg.travel_timeout_ms as u64);
    assert!(wait_for(&door, DoorState::Obstructed));
    door.shutdown();
}

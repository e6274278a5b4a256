//! DoorFacade over a real DoorController: HomeKit codes and status mapping.

use std::sync::Arc;

use garagedoor::app::controller::DoorController;
use garagedoor::app::events::DoorEvent;
use garagedoor::app::facade::{
    current_door_state, target_door_state, CharacteristicUpdate, DoorFacade, HapStatus,
};
use garagedoor::config::DoorConfig;

use crate::mock_hw::{sample, ManualClock, MockRelay, RecordingSink};

type TestController = DoorController<MockRelay, RecordingSink, ManualClock>;

fn facade(
    cfg: &DoorConfig,
    closed: bool,
    open: bool,
) -> (DoorFacade<Arc<TestController>>, MockRelay, RecordingSink, ManualClock) {
    let relay = MockRelay::default();
    let sink = RecordingSink::default();
    let clock = ManualClock::default();
    let door = DoorController::new(cfg, relay.clone(), sink.clone(), clock.clone()).unwrap();
    door.start(Some(sample(closed, Some(open), 0)));
    (
        DoorFacade::new(Arc::new(door), cfg.accessory.clone()),
        relay,
        sink,
        clock,
    )
}

#[test]
fn closed_door_reports_closed_codes() {
    let (f, _, _, _) = facade(&DoorConfig::default(), true, false);
    assert_eq!(f.get_current_door_state(), current_door_state::CLOSED);
    assert_eq!(f.get_target_door_state(), target_door_state::CLOSED);
    assert!(!f.get_obstruction_detected());
}

#[test]
fn set_open_pulses_and_reports_opening() {
    let (f, relay, _, _) = facade(&DoorConfig::default(), true, false);
    assert_eq!(f.set_target_door_state(target_door_state::OPEN), Ok(()));
    assert_eq!(relay.pulses(), 1);
    assert_eq!(f.get_current_door_state(), current_door_state::OPENING);
    assert_eq!(f.get_target_door_state(), target_door_state::OPEN);

    // Same target again: accepted, no second pulse.
    assert_eq!(f.set_target_door_state(target_door_state::OPEN), Ok(()));
    assert_eq!(relay.pulses(), 1);
}

#[test]
fn unknown_target_value_is_invalid() {
    let (f, relay, _, _) = facade(&DoorConfig::default(), true, false);
    let err = f.set_target_door_state(2).unwrap_err();
    assert_eq!(err, HapStatus::InvalidValueInRequest);
    assert_eq!(err.code(), -70410);
    assert_eq!(relay.pulses(), 0);
}

#[test]
fn opposing_set_mid_travel_is_busy() {
    let (f, _, _, _) = facade(&DoorConfig::default(), false, true);
    f.set_target_door_state(target_door_state::CLOSED).unwrap();
    let err = f.set_target_door_state(target_door_state::OPEN).unwrap_err();
    assert_eq!(err, HapStatus::ResourceBusy);
    assert_eq!(f.get_current_door_state(), current_door_state::CLOSING);
}

#[test]
fn relay_failure_is_communication_failure() {
    let (f, relay, _, _) = facade(&DoorConfig::default(), false, true);
    relay.set_failing(true);
    let err = f.set_target_door_state(target_door_state::CLOSED).unwrap_err();
    assert_eq!(err, HapStatus::ServiceCommunicationFailure);
    assert_eq!(err.code(), -70402);
    assert_eq!(f.get_current_door_state(), current_door_state::OPEN);
}

#[test]
fn travel_timeout_reports_obstruction() {
    let cfg = DoorConfig::default();
    let (f, _, sink, clock) = facade(&cfg, true, false);
    f.set_target_door_state(target_door_state::OPEN).unwrap();
    clock.advance(cfg.travel_timeout_ms as u64);

    assert!(f.door().poll_timer());

    assert_eq!(f.get_current_door_state(), current_door_state::STOPPED);
    assert!(f.get_obstruction_detected());

    let pushes: Vec<CharacteristicUpdate> = sink
        .events()
        .iter()
        .flat_map(DoorFacade::<Arc<TestController>>::updates_for)
        .collect();
    assert!(pushes.contains(&CharacteristicUpdate::ObstructionDetected(true)));
    assert_eq!(
        pushes.last(),
        Some(&CharacteristicUpdate::ObstructionDetected(true))
    );
    assert!(sink.events().iter().any(|e| matches!(e, DoorEvent::PulseFired { .. })));
}

#[test]
fn accessory_info_is_exposed() {
    let (f, _, _, _) = facade(&DoorConfig::default(), true, false);
    let info = f.accessory_info();
    assert_eq!(info, &DoorConfig::default().accessory);
    assert!(!info.display_name.is_empty());
}

//! Fuzz target: `DoorService` under arbitrary operation streams
//!
//! Each input byte is one operation (command, contact reading, sensor
//! fault, clock advance, relay breakage).  Asserts the service never
//! panics and the travel timer is armed exactly while travelling.
//!
//! cargo fuzz run fuzz_door_service

#![no_main]

use garagedoor::app::commands::DoorCommand;
use garagedoor::app::events::DoorEvent;
use garagedoor::app::ports::{ActuatorPort, EventSink};
use garagedoor::app::service::DoorService;
use garagedoor::config::{AssumeSuccess, DoorConfig, ReversalPolicy, SensorLayout};
use garagedoor::error::{ActuatorError, SensorError};
use garagedoor::sensors::SensorSample;
use libfuzzer_sys::fuzz_target;

struct Relay {
    broken: bool,
    pulses: u32,
}

impl ActuatorPort for Relay {
    fn pulse(&mut self) -> Result<(), ActuatorError> {
        if self.broken {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.pulses += 1;
        Ok(())
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &DoorEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Some((&flags, ops)) = data.split_first() else {
        return;
    };

    let cfg = DoorConfig {
        reversal_policy: if flags & 1 == 0 {
            ReversalPolicy::RejectWhileBusy
        } else {
            ReversalPolicy::ReverseOnOppositeCommand
        },
        assume_success: if flags & 2 == 0 {
            AssumeSuccess::Disabled
        } else {
            AssumeSuccess::Enabled
        },
        sensor_layout: if flags & 4 == 0 {
            SensorLayout::ClosedAndOpen
        } else {
            SensorLayout::ClosedOnly
        },
        debounce_samples: (flags >> 4).clamp(1, 10),
        ..DoorConfig::default()
    };
    if cfg.validate().is_err() {
        return;
    }
    let has_open = cfg.sensor_layout.has_open_contact();

    let mut svc = DoorService::new(&cfg);
    let mut relay = Relay {
        broken: false,
        pulses: 0,
    };
    let mut sink = Discard;
    let mut now = 0u64;
    svc.start(None, now, &mut sink);

    for &b in ops {
        match b & 0x07 {
            0 => {
                let _ = svc.handle_command(DoorCommand::Open, now, &mut relay, &mut sink);
            }
            1 => {
                let _ = svc.handle_command(DoorCommand::Close, now, &mut relay, &mut sink);
            }
            2 | 3 => {
                let sample = SensorSample {
                    closed_contact: b & 0x10 != 0,
                    open_contact: has_open.then_some(b & 0x20 != 0),
                    timestamp_ms: now,
                };
                svc.on_sensor_sample(sample, &mut sink);
            }
            4 => svc.on_sensor_fault(SensorError::GpioReadFailed, &mut sink),
            5 => {
                now += u64::from(b >> 3) * 1_000;
                svc.poll_timer(now, &mut sink);
            }
            6 => relay.broken = !relay.broken,
            _ => svc.on_travel_timeout(now, &mut sink),
        }

        assert_eq!(svc.travel_deadline_ms().is_some(), svc.state().is_travelling());
        assert_eq!(svc.pulse_count(), relay.pulses);
    }
});

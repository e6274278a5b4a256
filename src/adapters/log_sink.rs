//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per
//! [`DoorEvent`] to the logger (UART / USB-CDC on the device).

use log::{info, warn};

use crate::app::events::DoorEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DoorEvent`] to the serial console.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DoorEvent) {
        match *event {
            DoorEvent::Started { state, target } => {
                info!("START | state={} target={:?}", state, target);
            }
            DoorEvent::StateChanged { from, to, target } => {
                info!("STATE | {} -> {} | target={:?}", from, to, target);
            }
            DoorEvent::PulseFired { command, count } => {
                info!("PULSE | {} | total={}", command, count);
            }
            DoorEvent::PulseFailed { command, error } => {
                warn!("FAULT | pulse for {} failed: {}", command, error);
            }
            DoorEvent::CommandRejected { command, state } => {
                info!("REJECT | {} while {}", command, state);
            }
            DoorEvent::SensorFault(error) => {
                warn!("FAULT | sensor: {}", error);
            }
            DoorEvent::Stopped => {
                info!("STOP | controller shut down");
            }
        }
    }
}

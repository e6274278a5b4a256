//! Channel event sink: hands door events to the bridge task.
//!
//! Uses an `embassy-sync` bounded channel so the synchronous controller
//! can feed the (possibly async) bridge task without heap allocation.
//! The bridge drains it and turns each event into characteristic pushes
//! with [`DoorFacade::updates_for`](crate::app::facade::DoorFacade::updates_for).
//!
//! ```text
//! ┌──────────────┐  DoorEvent   ┌──────────────┐
//! │ DoorService  │────────────▶│  Bridge task  │
//! │ (under lock) │  try_send    │  receive()    │
//! └──────────────┘              └──────────────┘
//! ```
//!
//! Sending never blocks the controller: when the bridge falls behind the
//! event is dropped and logged.  The bridge can always re-read the
//! snapshot through the facade.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::events::DoorEvent;
use crate::app::ports::EventSink;

/// Channel depth for outbound door events.
pub const EVENT_DEPTH: usize = 8;

pub type DoorEventChannel = Channel<CriticalSectionRawMutex, DoorEvent, EVENT_DEPTH>;

/// Default outbound channel: controller → bridge task.
pub static DOOR_EVENTS: DoorEventChannel = Channel::new();

pub struct ChannelEventSink {
    channel: &'static DoorEventChannel,
    dropped: u32,
}

impl ChannelEventSink {
    pub fn new(channel: &'static DoorEventChannel) -> Self {
        Self {
            channel,
            dropped: 0,
        }
    }

    /// Events lost because the channel was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&mut self, event: &DoorEvent) {
        if self.channel.try_send(*event).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
            warn!(
                "BRIDGE: event channel full, dropped {:?} ({} total)",
                event, self.dropped
            );
        }
    }
}

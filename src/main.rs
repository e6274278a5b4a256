//! Garage Door Controller Firmware: main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  RelayDriver      DoorSensors     NvsAdapter   MonotonicClock  │
//! │  (ActuatorPort)   (SensorPort)    (Config)     (Clock)         │
//! │  LogEventSink + ChannelEventSink  (EventSink)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   DoorController ─▶ DoorService (FSM · Debouncer)      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  DoorFacade (HomeKit characteristic codes) · bridge loop       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;

use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{
    AnyInputPin, AnyOutputPin, Input, InputPin, Output, OutputPin, PinDriver, Pull,
};
use esp_idf_svc::hal::peripherals::Peripherals;
use log::{error, info, warn};

use garagedoor::adapters::channel_sink::{ChannelEventSink, DOOR_EVENTS};
use garagedoor::adapters::log_sink::LogEventSink;
use garagedoor::adapters::nvs::NvsAdapter;
use garagedoor::adapters::time::MonotonicClock;
use garagedoor::app::controller::DoorController;
use garagedoor::app::facade::DoorFacade;
use garagedoor::app::ports::{Clock, ConfigPort, SensorPort};
use garagedoor::config::{DoorConfig, SensorLayout};
use garagedoor::drivers::relay::RelayDriver;
use garagedoor::drivers::watchdog::Watchdog;
use garagedoor::sensors::DoorSensors;
use garagedoor::sensors::contact::ContactInput;

// ── Pin map ───────────────────────────────────────────────────
//
//   GPIO4  relay input (button terminals of the opener)
//   GPIO5  closed-position reed switch to GND
//   GPIO6  open-position reed switch to GND

type Relay = RelayDriver<PinDriver<'static, AnyOutputPin, Output>, FreeRtos>;
type Contact = PinDriver<'static, AnyInputPin, Input>;
type Sink = (LogEventSink, ChannelEventSink);
type Door = DoorController<Relay, Sink, MonotonicClock>;

const WDT_TIMEOUT_MS: u32 = 10_000;
const BRIDGE_LOOP_MS: u32 = 50;
/// Snapshot log every ~30 s.
const SNAPSHOT_EVERY: u32 = 30_000 / BRIDGE_LOOP_MS;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  GarageDoor v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let watchdog = Watchdog::new(WDT_TIMEOUT_MS);

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = load_config(nvs.as_ref());
    info!(
        "Config: layout={:?} pulse={}ms travel={}ms policy={:?}",
        config.sensor_layout,
        config.pulse_duration_ms,
        config.travel_timeout_ms,
        config.reversal_policy
    );

    // ── 3. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let relay_pin = PinDriver::output(pins.gpio4.downgrade_output())?;
    let relay = RelayDriver::new(
        relay_pin,
        FreeRtos,
        config.pulse_duration_ms,
        config.relay_active_low,
    )?;

    let closed = contact(pins.gpio5.downgrade_input(), config.contacts_active_low, "closed")?;
    let open = contact(pins.gpio6.downgrade_input(), config.contacts_active_low, "open")?;
    let mut sensors: DoorSensors<Contact> = match config.sensor_layout {
        SensorLayout::None => DoorSensors::none(),
        SensorLayout::ClosedOnly => DoorSensors::closed_only(closed),
        SensorLayout::ClosedAndOpen => DoorSensors::closed_and_open(closed, open),
    };

    let clock = MonotonicClock::new();
    let sink: Sink = (LogEventSink::new(), ChannelEventSink::new(&DOOR_EVENTS));

    // ── 4. Construct and start the controller ─────────────────
    let initial = match sensors.sample(clock.now_ms()) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Startup contact read failed: {}", e);
            None
        }
    };

    let controller: Arc<Door> = Arc::new(DoorController::new(&config, relay, sink, clock)?);
    controller.start(initial);
    controller.spawn_poller(Some(sensors))?;

    let facade = DoorFacade::new(Arc::clone(&controller), config.accessory.clone());
    let accessory = facade.accessory_info();
    info!(
        "Accessory: '{}' ({} {}, s/n {})",
        accessory.display_name, accessory.manufacturer, accessory.model, accessory.serial_number
    );

    info!("System ready. Entering bridge loop.");

    // ── 5. Bridge loop ────────────────────────────────────────
    //
    // Drains outbound door events into characteristic pushes.  The HomeKit
    // transport itself lives in the host bridge; here the pushes are logged.
    let mut ticks: u32 = 0;
    loop {
        watchdog.feed();

        while let Ok(event) = DOOR_EVENTS.try_receive() {
            for update in DoorFacade::<Arc<Door>>::updates_for(&event) {
                info!("BRIDGE: push {:?}", update);
            }
        }

        ticks = ticks.wrapping_add(1);
        if ticks % SNAPSHOT_EVERY == 0 {
            info!(
                "BRIDGE: current={} target={} obstructed={} pulses={}",
                facade.get_current_door_state(),
                facade.get_target_door_state(),
                facade.get_obstruction_detected(),
                controller.pulse_count()
            );
        }

        if !controller.is_running() {
            error!("Controller stopped unexpectedly, leaving bridge loop");
            break;
        }

        FreeRtos::delay_ms(BRIDGE_LOOP_MS);
    }

    controller.shutdown();
    Ok(())
}

/// Stored config, optionally replaced by a build-time JSON override which
/// is then persisted.
fn load_config(nvs: Option<&NvsAdapter>) -> DoorConfig {
    if let Some(json) = option_env!("GARAGEDOOR_CONFIG_JSON") {
        match DoorConfig::from_json(json) {
            Ok(cfg) => {
                info!("Config: applying build-time override");
                if let Some(store) = nvs {
                    if let Err(e) = store.save(&cfg) {
                        warn!("Config: override not persisted ({})", e);
                    }
                }
                return cfg;
            }
            Err(e) => warn!("Config: build-time override rejected ({})", e),
        }
    }
    nvs.map_or_else(DoorConfig::default, |store| store.load_or_default())
}

fn contact(pin: AnyInputPin, active_low: bool, name: &'static str) -> Result<ContactInput<Contact>> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(if active_low { Pull::Up } else { Pull::Down })?;
    Ok(ContactInput::new(driver, active_low, name))
}

//! Door controller configuration parameters
//!
//! All tunable parameters for the garage door controller.
//! Values can be overridden via NVS (non-volatile storage) or a bridge-style
//! JSON block handed over at provisioning time.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fsm::DoorState;

/// What to do with an opposing command while the door is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReversalPolicy {
    /// Fire a second pulse and flip the travel direction.
    ReverseOnOppositeCommand,
    /// Refuse the command with `BusyRejected` until travel completes.
    RejectWhileBusy,
}

/// Whether travel timeout expiry counts as reaching an end-stop that has
/// no contact to confirm it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssumeSuccess {
    Enabled,
    Disabled,
}

/// Which end-stop contacts are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorLayout {
    /// No contacts at all; position is only ever assumed.
    None,
    /// A single "fully closed" contact.
    ClosedOnly,
    /// Both "fully closed" and "fully open" contacts.
    ClosedAndOpen,
}

impl SensorLayout {
    pub fn has_closed_contact(self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn has_open_contact(self) -> bool {
        matches!(self, Self::ClosedAndOpen)
    }
}

/// Accessory information published to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessoryInfo {
    pub display_name: heapless::String<32>,
    pub manufacturer: heapless::String<32>,
    pub model: heapless::String<32>,
    pub serial_number: heapless::String<32>,
}

impl Default for AccessoryInfo {
    fn default() -> Self {
        Self {
            display_name: fixed("Garage Door"),
            manufacturer: fixed("GarageDoor"),
            model: fixed("RelayDoorOpener"),
            serial_number: fixed("00001"),
        }
    }
}

fn fixed(s: &str) -> heapless::String<32> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Core door controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    pub accessory: AccessoryInfo,

    // --- Actuator ---
    /// Relay closure time per simulated button press (milliseconds)
    pub pulse_duration_ms: u32,
    /// Relay board energises on a LOW input
    pub relay_active_low: bool,

    // --- Travel ---
    /// Budget for one full open or close travel (milliseconds)
    pub travel_timeout_ms: u32,
    /// Policy for opposing commands mid-travel
    pub reversal_policy: ReversalPolicy,
    /// Timeout-as-confirmation for end-stops without a contact
    pub assume_success: AssumeSuccess,

    // --- Sensors ---
    /// Which contacts are wired
    pub sensor_layout: SensorLayout,
    /// Contacts pull the input low when engaged (reed switch to GND)
    pub contacts_active_low: bool,
    /// Consecutive consistent readings required to accept a change
    pub debounce_samples: u8,
    /// Minimum time a changed reading must persist (0 = count only)
    pub debounce_min_stable_ms: u32,
    /// Sensor poll interval (milliseconds)
    pub sensor_poll_interval_ms: u32,

    // --- Startup ---
    /// State assumed at start when sensors cannot confirm a position
    pub initial_state: DoorState,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            accessory: AccessoryInfo::default(),

            // Actuator
            pulse_duration_ms: 500,
            relay_active_low: false,

            // Travel
            travel_timeout_ms: 20_000,
            reversal_policy: ReversalPolicy::RejectWhileBusy,
            assume_success: AssumeSuccess::Disabled,

            // Sensors
            sensor_layout: SensorLayout::ClosedAndOpen,
            contacts_active_low: true,
            debounce_samples: 3,
            debounce_min_stable_ms: 0,
            sensor_poll_interval_ms: 100, // 10 Hz

            // Startup
            initial_state: DoorState::Stopped,
        }
    }
}

impl DoorConfig {
    /// Parse a bridge-style JSON block.  Missing fields take their defaults;
    /// the result is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: DoorConfig = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(50..=1_000).contains(&self.pulse_duration_ms) {
            return Err(ConfigError::ValidationFailed(
                "pulse_duration_ms must be 50–1000",
            ));
        }
        if !(1_000..=120_000).contains(&self.travel_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "travel_timeout_ms must be 1000–120000",
            ));
        }
        if !(1..=20).contains(&self.debounce_samples) {
            return Err(ConfigError::ValidationFailed(
                "debounce_samples must be 1–20",
            ));
        }
        if self.debounce_min_stable_ms >= self.travel_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "debounce_min_stable_ms must be < travel_timeout_ms",
            ));
        }
        if !(10..=1_000).contains(&self.sensor_poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "sensor_poll_interval_ms must be 10–1000",
            ));
        }
        if self.initial_state.is_travelling() {
            return Err(ConfigError::ValidationFailed(
                "initial_state must not be Opening or Closing",
            ));
        }
        // Without an open contact only the timeout can ever reach `Open`.
        if !self.sensor_layout.has_open_contact() && self.assume_success == AssumeSuccess::Disabled
        {
            return Err(ConfigError::ValidationFailed(
                "sensor_layout without an open contact requires assume_success enabled",
            ));
        }
        Ok(())
    }

    /// Worst-case time for a debounced change to be accepted.
    pub fn debounce_latency_ms(&self) -> u32 {
        let by_count = self.debounce_samples as u32 * self.sensor_poll_interval_ms;
        by_count.max(self.debounce_min_stable_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = DoorConfig::default();
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn pulse_is_much_shorter_than_travel() {
        let c = DoorConfig::default();
        assert!(c.pulse_duration_ms < 1_000, "pulse must stay sub-second");
        assert!(
            c.debounce_latency_ms() < c.travel_timeout_ms,
            "debounce must settle well inside the travel budget"
        );
    }

    #[test]
    fn rejects_out_of_range_pulse() {
        let c = DoorConfig {
            pulse_duration_ms: 10,
            ..DoorConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn rejects_zero_debounce() {
        let c = DoorConfig {
            debounce_samples: 0,
            ..DoorConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_travelling_initial_state() {
        let c = DoorConfig {
            initial_state: DoorState::Opening,
            ..DoorConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn sensorless_layout_requires_assume_success() {
        let mut c = DoorConfig {
            sensor_layout: SensorLayout::None,
            ..DoorConfig::default()
        };
        assert!(c.validate().is_err());
        c.assume_success = AssumeSuccess::Enabled;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn from_json_fills_defaults() {
        let c = DoorConfig::from_json(
            r#"{
                "accessory": {
                    "display_name": "Left Bay",
                    "manufacturer": "AdamCoulter",
                    "model": "RPiDoorOpener",
                    "serial_number": "00002"
                },
                "reversal_policy": "reverse-on-opposite-command",
                "sensor_layout": "closed-only",
                "assume_success": "enabled",
                "travel_timeout_ms": 15000
            }"#,
        )
        .unwrap();
        assert_eq!(c.accessory.display_name.as_str(), "Left Bay");
        assert_eq!(c.reversal_policy, ReversalPolicy::ReverseOnOppositeCommand);
        assert_eq!(c.sensor_layout, SensorLayout::ClosedOnly);
        assert_eq!(c.travel_timeout_ms, 15_000);
        assert_eq!(c.pulse_duration_ms, DoorConfig::default().pulse_duration_ms);
    }

    #[test]
    fn from_json_rejects_garbage_and_invalid_values() {
        assert_eq!(DoorConfig::from_json("{not json"), Err(ConfigError::Corrupted));
        assert!(matches!(
            DoorConfig::from_json(r#"{"travel_timeout_ms": 5}"#),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn layouts_without_open_contact_require_assume_success() {
        for layout in [SensorLayout::None, SensorLayout::ClosedOnly] {
            let c = DoorConfig {
                sensor_layout: layout,
                ..DoorConfig::default()
            };
            assert!(
                matches!(c.validate(), Err(ConfigError::ValidationFailed(_))),
                "{layout:?} accepted without assume_success"
            );
            let c = DoorConfig {
                assume_success: AssumeSuccess::Enabled,
                ..c
            };
            assert_eq!(c.validate(), Ok(()));
        }
        assert!(matches!(
            DoorConfig::from_json(r#"{"sensor_layout": "closed-only"}"#),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn postcard_roundtrip() {
        let c = DoorConfig {
            reversal_policy: ReversalPolicy::ReverseOnOppositeCommand,
            ..DoorConfig::default()
        };
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: DoorConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn long_accessory_names_are_truncated() {
        let s = fixed("a very long garage door display name that overflows");
        assert_eq!(s.len(), 32);
    }
}

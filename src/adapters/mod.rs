//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements    | Connects to                       |
//! |-----------------|---------------|-----------------------------------|
//! | `hardware`      | ActuatorPort  | `RelayDriver` (GPIO + delay)      |
//! |                 | SensorPort    | `DoorSensors` (contact GPIOs)     |
//! | `log_sink`      | EventSink     | Serial log output                 |
//! | `channel_sink`  | EventSink     | Bridge task via embassy channel   |
//! | `nvs`           | ConfigPort    | NVS / in-memory blob              |
//! | `time`          | Clock         | ESP32 system timer / `Instant`    |

pub mod channel_sink;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;

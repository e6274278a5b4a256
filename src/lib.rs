//! Garage door controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod sensors;

pub use app::commands::DoorCommand;
pub use app::controller::DoorController;
pub use app::events::DoorEvent;
pub use config::DoorConfig;
pub use error::DoorError;
pub use fsm::{DoorState, TargetDoorState};

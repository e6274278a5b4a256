//! Relay actuator, task watchdog, and core-pinned thread spawning.

pub mod relay;
pub mod task_pin;
pub mod watchdog;

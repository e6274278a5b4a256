//! Application core: door logic behind port traits.
//!
//! [`service`] holds the single-threaded state machine orchestration,
//! [`controller`] serializes it across threads, and [`facade`] is the
//! narrow surface handed to the bridge.  All interaction with hardware
//! happens through the traits in [`ports`].

pub mod commands;
pub mod controller;
pub mod events;
pub mod facade;
pub mod ports;
pub mod service;

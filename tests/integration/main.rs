//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below exercises the door controller against mock adapters.
//! All tests run on the host with no real hardware required.

mod controller_tests;
mod facade_tests;
mod mock_hw;

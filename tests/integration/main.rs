//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one controller, or both
//! talking to each other, against mock adapters.  All tests run on the
//! host with synchronous timers.

mod back_flow_tests;
mod end_to_end_tests;
mod front_flow_tests;
mod mock_hw;

//! Shared utilities.

pub mod frame_clock;

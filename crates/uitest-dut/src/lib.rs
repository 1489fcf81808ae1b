//! # uitest-dut
//!
//! The device under test for uitest.
//!
//! This crate provides:
//! - The `DeviceUnderTest` trait (key-presses in, video frames out)
//! - Key-press timings (`KeypressInfo`, `PressTiming`) and the `Pressing`
//!   hold guard
//! - A time-bounded `Frames` iterator
//! - The process-wide device slot with free functions (`press`, `get_frame`,
//!   `frames`, ...) and the `set_device` guard
//! - A scripted device for tests
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on uitest-core and
//! uitest-frame.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod device;
pub mod global;
pub mod testing;

// Re-export commonly used types
pub use device::{
    DeviceUnderTest, Frames, KeypressInfo, PressTiming, Pressing, UnconfiguredDevice,
};
pub use global::{
    current_device, draw_text, frames, get_frame, last_keypress, press, pressing, set_device,
    DeviceGuard,
};

//! # uitest
//!
//! Primitives for hardware-in-the-loop UI tests of set-top boxes and other
//! video devices.
//!
//! ## Overview
//!
//! - Region algebra over the extended reals (`Region`)
//! - Pixel buffers with provenance and aliasing crops (`Frame`, `crop`)
//! - Image loading and saving (`load_image`, `save_frame`)
//! - Stability polling (`wait_until`, `WaitUntil`)
//! - The device under test (`press`, `get_frame`, `frames`, ...)
//!
//! ## Architecture
//!
//! This is Layer 3 - the facade and `uitest` binary that tie together:
//! - uitest-core: Core types
//! - uitest-frame: Pixel buffers
//! - uitest-wait: Stability polling
//! - uitest-dut: Device under test

pub mod cli;

// Re-export the public API
pub use uitest_core::{
    Clock, Config, Error, ImageSettings, LoggingSettings, Position, PressSettings, Region,
    RegionChange, Result, SimulatedClock, SystemClock, Translation, Truthy, WaitSettings,
};
pub use uitest_dut::{
    current_device, draw_text, frames, get_frame, last_keypress, press, pressing, set_device,
    testing, DeviceGuard, DeviceUnderTest, Frames, KeypressInfo, PressTiming, Pressing,
    UnconfiguredDevice,
};
pub use uitest_frame::{
    convert_channels, crop, load_image, save_frame, ColorChannels, Frame, Image, ImageLoader,
    ImageSource, Provenance,
};
pub use uitest_wait::{wait_until, Observation, WaitUntil};

//! Testing utilities for code that drives a device under test.
//!
//! Provides a scripted device that plays back canned frames against an
//! injectable clock.

pub mod scripted;

pub use scripted::ScriptedDevice;

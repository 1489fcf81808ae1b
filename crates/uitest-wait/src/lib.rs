//! # uitest-wait
//!
//! Stability polling for uitest.
//!
//! This crate provides:
//! - `WaitUntil`, a builder that runs a probe until its result is truthy,
//!   optionally requiring the result to stay the same for a while
//! - `wait_until`, the same with default settings
//! - `Observation`, a probe result with the time it was observed
//!
//! All timing goes through `uitest_core::Clock`, so polling can be tested
//! without real sleeps.
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends only on uitest-core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod wait;

// Re-export commonly used types
pub use uitest_core::Truthy;
pub use wait::{wait_until, Observation, WaitUntil};

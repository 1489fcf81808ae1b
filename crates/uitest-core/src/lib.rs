//! # uitest-core
//!
//! Core types for uitest.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other uitest crates. It provides:
//!
//! - Region algebra over the extended reals (Region, Position)
//! - Injectable wall clocks (SystemClock, SimulatedClock)
//! - Configuration loaded from YAML
//! - The `Truthy` conversion used to judge polled values
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other uitest crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod region;
pub mod truthy;

// Re-export commonly used types
pub use clock::{Clock, SimulatedClock, SystemClock};
pub use config::{Config, ImageSettings, LoggingSettings, PressSettings, WaitSettings};
pub use error::{Error, Result};
pub use region::{Position, Region, RegionChange, Translation};
pub use truthy::Truthy;

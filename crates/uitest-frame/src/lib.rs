//! # uitest-frame
//!
//! Pixel buffers for uitest.
//!
//! This crate provides:
//! - `Frame`, a view over shared sample storage carrying capture/file provenance
//! - Slicing and region-based cropping that alias the source storage
//! - Image loading with colour-channel conversion, and frame saving
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on uitest-core for
//! regions and errors.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod color;
pub mod frame;
pub mod load;

// Re-export commonly used types
pub use color::{convert_channels, ColorChannels};
pub use frame::{crop, Frame, Image, Provenance};
pub use load::{load_image, save_frame, ImageLoader, ImageSource};

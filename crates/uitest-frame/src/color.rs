//! Colour-channel preferences and conversion between channel counts.

use uitest_core::{Error, Result};

use crate::frame::Frame;

/// Ordered list of acceptable channel counts for a loaded image.
///
/// `1` is greyscale, `3` is colour and `4` is colour with alpha. When an
/// image already has an acceptable channel count it is left alone; otherwise
/// it is converted to the first entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorChannels(Vec<usize>);

impl ColorChannels {
    /// Build a preference list. Entries must be 1, 3 or 4.
    pub fn new(preferences: &[usize]) -> Result<Self> {
        if preferences.is_empty() {
            return Err(Error::InvalidArguments(
                "color_channels must not be empty".to_string(),
            ));
        }
        if let Some(bad) = preferences.iter().find(|c| ![1, 3, 4].contains(*c)) {
            return Err(Error::InvalidArguments(format!(
                "color_channels entries must be 1, 3 or 4, got {bad}"
            )));
        }
        Ok(Self(preferences.to_vec()))
    }

    /// Greyscale only.
    pub fn gray() -> Self {
        Self(vec![1])
    }

    /// Colour without alpha.
    pub fn color() -> Self {
        Self(vec![3])
    }

    /// Colour with alpha.
    pub fn color_alpha() -> Self {
        Self(vec![4])
    }

    /// Whether `channels` is in the list.
    pub fn accepts(&self, channels: usize) -> bool {
        self.0.contains(&channels)
    }

    /// The channel count to convert to when the source isn't acceptable.
    pub fn preferred(&self) -> usize {
        self.0[0]
    }

    /// The preference list.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl Default for ColorChannels {
    fn default() -> Self {
        Self::color()
    }
}

/// Convert `frame` to an acceptable channel count.
///
/// Returns the same frame (same storage) when no conversion is needed; a
/// converted frame gets fresh storage and keeps the source's provenance.
pub fn convert_channels(frame: &Frame, channels: &ColorChannels) -> Result<Frame> {
    if channels.accepts(frame.channels()) {
        return Ok(frame.clone());
    }
    let target = channels.preferred();
    let data = convert_samples(&frame.to_vec(), frame.channels(), target);
    Ok(Frame::from_raw(data, frame.width(), frame.height(), target)?
        .with_provenance(frame.provenance().clone()))
}

/// Rec. 601 luma, as used for colour to greyscale conversion.
///
/// Not `image`'s `to_luma8`, which weights with Rec. 709 and would give
/// different grey levels for the same reference images.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)).round() as u8
}

/// Convert interleaved samples from `from` to `to` channels per pixel.
///
/// Alpha is dropped when the target has none and set to opaque when the
/// source has none.
pub(crate) fn convert_samples(src: &[u8], from: usize, to: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() / from * to);
    for px in src.chunks_exact(from) {
        let (r, g, b, a) = match *px {
            [v] => (v, v, v, None),
            [v, a] => (v, v, v, Some(a)),
            [r, g, b] => (r, g, b, None),
            [r, g, b, a, ..] => (r, g, b, Some(a)),
            [] => continue,
        };
        match to {
            1 if from <= 2 => out.push(r),
            1 => out.push(luma(r, g, b)),
            3 => out.extend_from_slice(&[r, g, b]),
            _ => out.extend_from_slice(&[r, g, b, a.unwrap_or(u8::MAX)]),
        }
    }
    out
}

//! Pixel buffers with provenance.
//!
//! A [`Frame`] is a view (offset, extent and strides) over a shared,
//! reference-counted sample arena. Slicing and cropping build new views over
//! the same arena, so writes through a crop are visible in the source and
//! vice versa. [`Frame::copy`] is the only way to get independent storage.

use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uitest_core::{Error, Region, Result};

/// Where a frame's pixels came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    /// Capture time in seconds since the Unix epoch (live captures only)
    pub time: Option<f64>,
    /// File name as given by the caller (loaded images only)
    pub filename: Option<PathBuf>,
    /// Path relative to the image root directory
    pub relative_filename: Option<PathBuf>,
    /// Resolved absolute path
    pub absolute_filename: Option<PathBuf>,
}

impl Provenance {
    /// Provenance of a frame captured at `time`.
    pub fn captured_at(time: f64) -> Self {
        Self {
            time: Some(time),
            ..Self::default()
        }
    }

    /// Whether any provenance field is set.
    pub fn is_empty(&self) -> bool {
        self.time.is_none()
            && self.filename.is_none()
            && self.relative_filename.is_none()
            && self.absolute_filename.is_none()
    }
}

/// Placement of a view inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    offset: usize,
    width: usize,
    height: usize,
    channels: usize,
    row_stride: usize,
    pixel_stride: usize,
}

impl Layout {
    fn compact(width: usize, height: usize, channels: usize) -> Self {
        Self {
            offset: 0,
            width,
            height,
            channels,
            row_stride: width * channels,
            pixel_stride: channels,
        }
    }

    fn index(&self, y: usize, x: usize, c: usize) -> usize {
        self.offset + y * self.row_stride + x * self.pixel_stride + c
    }
}

/// A `height × width × channels` grid of 8-bit samples plus provenance.
///
/// Samples are interleaved, in RGB(A) order for colour frames. Cloning a
/// `Frame` clones the handle: the clone shares storage *and* provenance.
#[derive(Clone)]
pub struct Frame {
    storage: Arc<RwLock<Vec<u8>>>,
    layout: Layout,
    provenance: Provenance,
}

/// Frames loaded from disk use the same representation as captured frames.
pub type Image = Frame;

impl Frame {
    /// Wrap caller-provided samples without copying them.
    ///
    /// `data` must hold exactly `width * height * channels` samples in
    /// row-major, interleaved order. The frame has no provenance.
    pub fn from_raw(data: Vec<u8>, width: usize, height: usize, channels: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidArguments(format!(
                "Frame dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if !(1..=4).contains(&channels) {
            return Err(Error::InvalidArguments(format!(
                "Frames have 1 to 4 channels, got {channels}"
            )));
        }
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(Error::InvalidArguments(format!(
                "Expected {expected} samples for a {width}x{height}x{channels} frame, got {}",
                data.len()
            )));
        }
        Ok(Self {
            storage: Arc::new(RwLock::new(data)),
            layout: Layout::compact(width, height, channels),
            provenance: Provenance::default(),
        })
    }

    /// Wrap samples captured from a device at `time`.
    pub fn from_capture(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
        time: f64,
    ) -> Result<Self> {
        Ok(Self::from_raw(data, width, height, channels)?.with_provenance(Provenance::captured_at(time)))
    }

    /// A frame of the given size with every sample set to `value`.
    pub fn filled(width: usize, height: usize, channels: usize, value: u8) -> Result<Self> {
        Self::from_raw(vec![value; width * height * channels], width, height, channels)
    }

    /// Same view and storage, different provenance.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.layout.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.layout.height
    }

    /// Number of samples per pixel.
    pub fn channels(&self) -> usize {
        self.layout.channels
    }

    /// All provenance fields.
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// Capture time, for live captures.
    pub fn time(&self) -> Option<f64> {
        self.provenance.time
    }

    /// File name as given to the loader.
    pub fn filename(&self) -> Option<&Path> {
        self.provenance.filename.as_deref()
    }

    /// Path relative to the loader's root directory.
    pub fn relative_filename(&self) -> Option<&Path> {
        self.provenance.relative_filename.as_deref()
    }

    /// Resolved absolute path.
    pub fn absolute_filename(&self) -> Option<&Path> {
        self.provenance.absolute_filename.as_deref()
    }

    /// Whether both frames are views over the same arena.
    pub fn shares_storage(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    /// Read one sample.
    pub fn get(&self, y: usize, x: usize, c: usize) -> Result<u8> {
        let idx = self.checked_index(y, x, c)?;
        Ok(self.read()[idx])
    }

    /// Write one sample; visible through every view of the same arena.
    pub fn set(&self, y: usize, x: usize, c: usize, value: u8) -> Result<()> {
        let idx = self.checked_index(y, x, c)?;
        self.write()[idx] = value;
        Ok(())
    }

    /// Set every sample of this view to `value`.
    pub fn fill(&self, value: u8) {
        let l = self.layout;
        let mut data = self.write();
        for y in 0..l.height {
            for x in 0..l.width {
                let px = l.index(y, x, 0);
                data[px..px + l.channels].fill(value);
            }
        }
    }

    /// Compact row-major copy of the samples in this view.
    pub fn to_vec(&self) -> Vec<u8> {
        let l = self.layout;
        let data = self.read();
        let mut out = Vec::with_capacity(l.width * l.height * l.channels);
        for y in 0..l.height {
            let row = l.index(y, 0, 0);
            if l.pixel_stride == l.channels {
                out.extend_from_slice(&data[row..row + l.width * l.channels]);
            } else {
                for x in 0..l.width {
                    let px = row + x * l.pixel_stride;
                    out.extend_from_slice(&data[px..px + l.channels]);
                }
            }
        }
        out
    }

    /// Whether both frames have the same shape and samples.
    ///
    /// Provenance is not compared.
    pub fn pixels_eq(&self, other: &Frame) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.channels() == other.channels()
            && self.to_vec() == other.to_vec()
    }

    /// An independent copy with its own storage and the same provenance.
    pub fn copy(&self) -> Frame {
        Frame {
            storage: Arc::new(RwLock::new(self.to_vec())),
            layout: Layout::compact(self.width(), self.height(), self.channels()),
            provenance: self.provenance.clone(),
        }
    }

    /// A view of a sub-rectangle, optionally reduced to a single channel.
    ///
    /// Ranges are clamped to the frame like slice indices, so `10..` means
    /// "from 10 to the edge". The view aliases this frame's storage and
    /// carries the same provenance.
    pub fn slice(
        &self,
        rows: impl RangeBounds<usize>,
        cols: impl RangeBounds<usize>,
        channel: Option<usize>,
    ) -> Result<Frame> {
        let (top, bottom) = clamp_range(&rows, self.height());
        let (left, right) = clamp_range(&cols, self.width());
        if top >= bottom || left >= right {
            return Err(Error::InvalidArguments(format!(
                "Slice [{top}..{bottom}, {left}..{right}] of a {}x{} frame selects no pixels",
                self.width(),
                self.height()
            )));
        }

        let mut layout = Layout {
            offset: self.layout.index(top, left, 0),
            width: right - left,
            height: bottom - top,
            ..self.layout
        };
        if let Some(c) = channel {
            if c >= self.channels() {
                return Err(Error::InvalidArguments(format!(
                    "Channel {c} out of range for a {}-channel frame",
                    self.channels()
                )));
            }
            layout.offset += c;
            layout.channels = 1;
        }

        Ok(Frame {
            storage: Arc::clone(&self.storage),
            layout,
            provenance: self.provenance.clone(),
        })
    }

    fn checked_index(&self, y: usize, x: usize, c: usize) -> Result<usize> {
        if y >= self.height() || x >= self.width() || c >= self.channels() {
            return Err(Error::InvalidArguments(format!(
                "Sample ({y}, {x}, {c}) out of range for a {}x{}x{} frame",
                self.width(),
                self.height(),
                self.channels()
            )));
        }
        Ok(self.layout.index(y, x, c))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.storage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("channels", &self.channels())
            .field("provenance", &self.provenance)
            .finish()
    }
}

impl uitest_core::Truthy for Frame {
    fn is_truthy(&self) -> bool {
        true
    }
}

fn clamp_range(range: &impl RangeBounds<usize>, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    (start.min(len), end.min(len))
}

/// Crop `frame` to `region`, returning a view over the same storage.
///
/// The region is first clipped to the frame bounds, so infinite or
/// overhanging edges are fine. Fractional edges are rounded outwards. A
/// region that selects no pixels fails with [`Error::InvalidRegion`].
pub fn crop(frame: &Frame, region: &Region) -> Result<Frame> {
    let bounds = Region::new(0.0, 0.0, frame.width() as f64, frame.height() as f64)?;
    let clipped = Region::intersect(region, &bounds)
        .filter(|r| r.width() > 0.0 && r.height() > 0.0)
        .ok_or_else(|| {
            Error::InvalidRegion(format!(
                "{region} doesn't overlap the {}x{} frame",
                frame.width(),
                frame.height()
            ))
        })?;

    let left = clipped.x().floor() as usize;
    let top = clipped.y().floor() as usize;
    let right = clipped.right().ceil() as usize;
    let bottom = clipped.bottom().ceil() as usize;
    frame.slice(top..bottom, left..right, None)
}

//! Region algebra over the extended reals.
//!
//! A [`Region`] is an immutable axis-aligned rectangle whose bounds may be
//! infinite, which models "no bound on this side". [`Region::ALL`] is the
//! unbounded rectangle and the default search area everywhere in uitest.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A point in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate (0 is the left edge of the frame)
    pub x: f64,
    /// Vertical coordinate (0 is the top edge of the frame)
    pub y: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin position (0, 0).
    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// Serialized form of a [`Region`]; validated on the way back in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Extents {
    x: f64,
    y: f64,
    right: f64,
    bottom: f64,
}

/// Rectangular region, stored as `(x, y, right, bottom)`.
///
/// `right` and `bottom` are exclusive, so `width == right - x`. Any bound may
/// be `±f64::INFINITY`. Construction guarantees `x <= right`, `y <= bottom`
/// and that no bound is NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Extents", into = "Extents")]
pub struct Region {
    x: f64,
    y: f64,
    right: f64,
    bottom: f64,
}

impl Region {
    /// The unbounded region `(-inf, -inf, +inf, +inf)`.
    pub const ALL: Region = Region {
        x: f64::NEG_INFINITY,
        y: f64::NEG_INFINITY,
        right: f64::INFINITY,
        bottom: f64::INFINITY,
    };

    /// Create a region from its top-left corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        Self::from_extents(x, y, x + width, y + height)
    }

    /// Create a region from its four edges.
    pub fn from_extents(x: f64, y: f64, right: f64, bottom: f64) -> Result<Self> {
        if x.is_nan() || y.is_nan() || right.is_nan() || bottom.is_nan() {
            return Err(Error::InvalidArguments(format!(
                "Region bounds must not be NaN: x={x}, y={y}, right={right}, bottom={bottom}"
            )));
        }
        if right < x {
            return Err(Error::InvalidArguments(format!(
                "'right' ({right}) must be >= 'x' ({x})"
            )));
        }
        if bottom < y {
            return Err(Error::InvalidArguments(format!(
                "'bottom' ({bottom}) must be >= 'y' ({y})"
            )));
        }
        Ok(Self {
            x,
            y,
            right,
            bottom,
        })
    }

    /// Left edge.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Top edge.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> f64 {
        self.right
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    /// `right - x`.
    pub fn width(&self) -> f64 {
        self.right - self.x
    }

    /// `bottom - y`.
    pub fn height(&self) -> f64 {
        self.bottom - self.y
    }

    /// `width * height`.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Top-left corner.
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Midpoint of the region.
    pub fn center(&self) -> Position {
        Position::new((self.x + self.right) / 2.0, (self.y + self.bottom) / 2.0)
    }

    /// Whether `other` lies entirely within this region.
    pub fn contains(&self, other: &Region) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && other.right <= self.right
            && other.bottom <= self.bottom
    }

    /// The overlap of two regions.
    ///
    /// Returns `None` when the regions do not overlap at all. Regions that
    /// only touch produce a region with zero width or height.
    pub fn intersect(a: &Region, b: &Region) -> Option<Region> {
        let x = a.x.max(b.x);
        let y = a.y.max(b.y);
        let right = a.right.min(b.right);
        let bottom = a.bottom.min(b.bottom);
        if x <= right && y <= bottom {
            Some(Region {
                x,
                y,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// The overlap of all `regions`; `Region::ALL` for an empty input.
    pub fn intersect_all<'a, I>(regions: I) -> Option<Region>
    where
        I: IntoIterator<Item = &'a Region>,
    {
        regions
            .into_iter()
            .try_fold(Region::ALL, |acc, r| Region::intersect(&acc, r))
    }

    /// The smallest region containing both `a` and `b`.
    pub fn bounding_box(a: &Region, b: &Region) -> Region {
        Region {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            right: a.right.max(b.right),
            bottom: a.bottom.max(b.bottom),
        }
    }

    /// The smallest region containing all `regions`; `None` for an empty input.
    pub fn bounding_box_all<'a, I>(regions: I) -> Option<Region>
    where
        I: IntoIterator<Item = &'a Region>,
    {
        regions
            .into_iter()
            .copied()
            .reduce(|acc, r| Region::bounding_box(&acc, &r))
    }

    /// Move each edge outwards by the given amounts.
    ///
    /// `x` and `y` are added to the left and top edges, so pass negative
    /// values to grow the region in those directions.
    pub fn extend(&self, x: f64, y: f64, right: f64, bottom: f64) -> Result<Region> {
        Region::from_extents(
            self.x + x,
            self.y + y,
            self.right + right,
            self.bottom + bottom,
        )
    }

    /// Grow the region by `n` on every side.
    pub fn dilate(&self, n: f64) -> Result<Region> {
        self.extend(-n, -n, n, n)
    }

    /// Shrink the region by `n` on every side.
    pub fn erode(&self, n: f64) -> Result<Region> {
        self.dilate(-n)
    }

    /// The region of the given height directly above this one.
    ///
    /// Pass `f64::INFINITY` for everything above.
    pub fn above(&self, height: f64) -> Result<Region> {
        Region::from_extents(self.x, self.y - height, self.right, self.y)
    }

    /// The region of the given height directly below this one.
    pub fn below(&self, height: f64) -> Result<Region> {
        Region::from_extents(self.x, self.bottom, self.right, self.bottom + height)
    }

    /// The region of the given width directly left of this one.
    pub fn left_of(&self, width: f64) -> Result<Region> {
        Region::from_extents(self.x - width, self.y, self.x, self.bottom)
    }

    /// The region of the given width directly right of this one.
    pub fn right_of(&self, width: f64) -> Result<Region> {
        Region::from_extents(self.right, self.y, self.right + width, self.bottom)
    }

    /// A copy of this region with some fields replaced.
    ///
    /// For each axis, two of `x`/`width`/`right` (or `y`/`height`/`bottom`)
    /// determine the third. All three are accepted only if they agree. A
    /// single `x` or `right` keeps the opposite edge where it was; a single
    /// `width` keeps `x` fixed.
    ///
    /// ```
    /// # use uitest_core::{Region, RegionChange};
    /// let r = Region::new(10.0, 20.0, 20.0, 30.0).unwrap();
    /// let moved = r.replace(RegionChange::new().x(11.0).right(21.0)).unwrap();
    /// assert_eq!(moved, Region::new(11.0, 20.0, 10.0, 30.0).unwrap());
    /// ```
    pub fn replace(&self, change: RegionChange) -> Result<Region> {
        let (x, right) = resolve_axis(
            ("x", "width", "right"),
            (self.x, self.right),
            (change.x, change.width, change.right),
        )?;
        let (y, bottom) = resolve_axis(
            ("y", "height", "bottom"),
            (self.y, self.bottom),
            (change.y, change.height, change.bottom),
        )?;
        Region::from_extents(x, y, right, bottom)
    }

    /// A copy of this region moved by an offset.
    ///
    /// `x` is either a scalar horizontal offset, in which case `y` is the
    /// vertical offset (default 0), or a [`Region`]/[`Position`] whose `x`
    /// and `y` give both offsets. Supplying both forms is an error.
    ///
    /// ```
    /// # use uitest_core::Region;
    /// let r = Region::new(2.0, 3.0, 2.0, 1.0).unwrap();
    /// assert_eq!(r.translate(1.0, Some(1.0)).unwrap(), Region::new(3.0, 4.0, 2.0, 1.0).unwrap());
    /// assert!(r.translate(Region::new(0.0, 0.0, 1.0, 1.0).unwrap(), Some(5.0)).is_err());
    /// ```
    pub fn translate(&self, x: impl Into<Translation>, y: Option<f64>) -> Result<Region> {
        let (dx, dy) = match (x.into(), y) {
            (Translation::Offset(dx), dy) => (dx, dy.unwrap_or(0.0)),
            (Translation::By(p), None) => (p.x, p.y),
            (Translation::By(_), Some(_)) => {
                return Err(Error::InvalidArguments(
                    "translate() takes either a region/position or x and y offsets, not both"
                        .to_string(),
                ))
            }
        };
        Region::from_extents(self.x + dx, self.y + dy, self.right + dx, self.bottom + dy)
    }
}

/// Resolve one axis of [`Region::replace`] into `(start, end)`.
fn resolve_axis(
    names: (&str, &str, &str),
    (orig_start, orig_end): (f64, f64),
    given: (Option<f64>, Option<f64>, Option<f64>),
) -> Result<(f64, f64)> {
    match given {
        (None, None, None) => Ok((orig_start, orig_end)),
        (Some(start), None, None) => Ok((start, orig_end)),
        (None, Some(size), None) => Ok((orig_start, orig_start + size)),
        (None, None, Some(end)) => Ok((orig_start, end)),
        (Some(start), Some(size), None) => Ok((start, start + size)),
        (Some(start), None, Some(end)) => Ok((start, end)),
        (None, Some(size), Some(end)) => Ok((end - size, end)),
        (Some(start), Some(size), Some(end)) if start + size == end => Ok((start, end)),
        (Some(start), Some(size), Some(end)) => Err(Error::InvalidArguments(format!(
            "Inconsistent '{}' ({start}), '{}' ({size}) and '{}' ({end})",
            names.0, names.1, names.2
        ))),
    }
}

impl TryFrom<Extents> for Region {
    type Error = Error;

    fn try_from(e: Extents) -> Result<Self> {
        Region::from_extents(e.x, e.y, e.right, e.bottom)
    }
}

impl From<Region> for Extents {
    fn from(r: Region) -> Self {
        Extents {
            x: r.x,
            y: r.y,
            right: r.right,
            bottom: r.bottom,
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::ALL
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Region(x={}, y={}, right={}, bottom={})",
            self.x, self.y, self.right, self.bottom
        )
    }
}

/// Parses `"x,y,right,bottom"`; `inf`/`-inf` are accepted.
impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidArguments(format!("Invalid region '{s}': {e}")))?;

        match parts.as_slice() {
            [x, y, right, bottom] => Region::from_extents(*x, *y, *right, *bottom),
            _ => Err(Error::InvalidArguments(format!(
                "Invalid region '{s}': expected x,y,right,bottom"
            ))),
        }
    }
}

/// Partial update for [`Region::replace`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionChange {
    /// New left edge
    pub x: Option<f64>,
    /// New top edge
    pub y: Option<f64>,
    /// New width
    pub width: Option<f64>,
    /// New height
    pub height: Option<f64>,
    /// New right edge
    pub right: Option<f64>,
    /// New bottom edge
    pub bottom: Option<f64>,
}

impl RegionChange {
    /// An empty change.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the left edge.
    pub fn x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    /// Set the top edge.
    pub fn y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    /// Set the width.
    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the height.
    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Set the right edge.
    pub fn right(mut self, right: f64) -> Self {
        self.right = Some(right);
        self
    }

    /// Set the bottom edge.
    pub fn bottom(mut self, bottom: f64) -> Self {
        self.bottom = Some(bottom);
        self
    }
}

/// First argument of [`Region::translate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Translation {
    /// Horizontal offset; the vertical offset is passed separately
    Offset(f64),
    /// Both offsets, taken from a point
    By(Position),
}

impl From<f64> for Translation {
    fn from(dx: f64) -> Self {
        Translation::Offset(dx)
    }
}

impl From<Position> for Translation {
    fn from(p: Position) -> Self {
        Translation::By(p)
    }
}

impl From<Region> for Translation {
    fn from(r: Region) -> Self {
        Translation::By(r.position())
    }
}

impl From<&Region> for Translation {
    fn from(r: &Region) -> Self {
        Translation::By(r.position())
    }
}

//! Fixed-dimension points and axis-aligned bounding boxes.
//!
//! Distances accumulate in `f64` and round once on output so that the same
//! pair of coordinates always yields the same `f32` value regardless of
//! whether it was computed point-to-point or between degenerate boxes.

/// A point in `D`-dimensional Euclidean space.
///
/// # Examples
/// ```
/// use treeline_core::Point;
///
/// let origin = Point::new([0.0, 0.0]);
/// let unit = Point::new([3.0, 4.0]);
/// assert_eq!(origin.distance(&unit), 5.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<const D: usize> {
    coords: [f32; D],
}

impl<const D: usize> Point<D> {
    /// Creates a point from its coordinates.
    #[must_use]
    #[rustfmt::skip]
    pub const fn new(coords: [f32; D]) -> Self { Self { coords } }

    /// Returns the coordinate along `axis`.
    #[must_use]
    #[rustfmt::skip]
    pub const fn coord(&self, axis: usize) -> f32 { self.coords[axis] }

    /// Returns the coordinates as a slice.
    #[must_use]
    #[rustfmt::skip]
    pub const fn coords(&self) -> &[f32; D] { &self.coords }

    /// Returns `true` when every coordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(|value| value.is_finite())
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let mut sum = 0.0_f64;
        for axis in 0..D {
            let diff = f64::from(self.coords[axis]) - f64::from(other.coords[axis]);
            sum += diff * diff;
        }
        sum.sqrt() as f32
    }
}

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb<const D: usize> {
    min: [f32; D],
    max: [f32; D],
}

impl<const D: usize> Aabb<D> {
    /// The degenerate box containing exactly `point`.
    #[must_use]
    pub const fn from_point(point: &Point<D>) -> Self {
        Self {
            min: *point.coords(),
            max: *point.coords(),
        }
    }

    /// Returns the lower corner along `axis`.
    #[must_use]
    #[rustfmt::skip]
    pub const fn min(&self, axis: usize) -> f32 { self.min[axis] }

    /// Returns the upper corner along `axis`.
    #[must_use]
    #[rustfmt::skip]
    pub const fn max(&self, axis: usize) -> f32 { self.max[axis] }

    /// The smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..D {
            min[axis] = min[axis].min(other.min[axis]);
            max[axis] = max[axis].max(other.max[axis]);
        }
        Self { min, max }
    }

    /// Lower bound on the Euclidean distance between any point of `self` and
    /// any point of `other`; zero when the boxes overlap.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let mut sum = 0.0_f64;
        for axis in 0..D {
            let gap = (f64::from(self.min[axis]) - f64::from(other.max[axis]))
                .max(f64::from(other.min[axis]) - f64::from(self.max[axis]))
                .max(0.0);
            sum += gap * gap;
        }
        sum.sqrt() as f32
    }

    /// Lower bound on the Euclidean distance from `point` to `self`.
    #[must_use]
    pub fn distance_to_point(&self, point: &Point<D>) -> f32 {
        let mut sum = 0.0_f64;
        for axis in 0..D {
            let value = f64::from(point.coord(axis));
            let gap = (f64::from(self.min[axis]) - value)
                .max(value - f64::from(self.max[axis]))
                .max(0.0);
            sum += gap * gap;
        }
        sum.sqrt() as f32
    }
}

//! Vector and box primitives for cargo-space geometry.
//!
//! Axes follow the vehicle: `x` runs from the cab towards the doors (length),
//! `y` across the floor (width), `z` upwards (height). All distances are cm.

use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Tolerance for boundary, weight and support comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Two candidate positions closer than this on every axis count as one.
pub const DEDUP_TOLERANCE: f64 = 0.1;

/// A point or extent in cargo space.
///
/// # Examples
/// ```
/// use load_planner::types::Vec3;
///
/// let corner = Vec3::new(120.0, 0.0, 0.0) + Vec3::new(80.0, 60.0, 40.0);
/// assert_eq!(corner, Vec3::new(200.0, 60.0, 40.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The cargo-space origin: front-left floor corner.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Straight-line distance to `other`.
    ///
    /// Used for dangerous-goods separation, measured between minimum corners.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Anything with a length/width/height extent.
pub trait Dimensional {
    /// Extent as (length, width, height).
    fn dimensions(&self) -> Vec3;
}

/// Axis-aligned box spanned by two corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Box whose minimum corner sits at `position`.
    ///
    /// # Parameters
    /// * `position` - Minimum corner
    /// * `dims` - Extent along each axis
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Interior overlap on all three axes.
    ///
    /// Face contact is not an intersection: the boxes must overlap by more
    /// than `tolerance` on every axis.
    #[inline]
    pub fn intersects(&self, other: &Self, tolerance: f64) -> bool {
        self.footprint_overlaps(other, tolerance)
            && self.max.z > other.min.z + tolerance
            && other.max.z > self.min.z + tolerance
    }

    /// Overlap of the floor projections, ignoring height.
    #[inline]
    pub fn footprint_overlaps(&self, other: &Self, tolerance: f64) -> bool {
        self.max.x > other.min.x + tolerance
            && other.max.x > self.min.x + tolerance
            && self.max.y > other.min.y + tolerance
            && other.max.y > self.min.y + tolerance
    }

    /// Whether this box lies inside `outer`, allowing `tolerance` overhang.
    #[inline]
    pub fn is_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.min.x >= outer.min.x - tolerance
            && self.min.y >= outer.min.y - tolerance
            && self.min.z >= outer.min.z - tolerance
            && self.max.x <= outer.max.x + tolerance
            && self.max.y <= outer.max.y + tolerance
            && self.max.z <= outer.max.z + tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(x: f64, y: f64, z: f64, side: f64) -> BoundingBox {
        BoundingBox::from_position_and_dims(Vec3::new(x, y, z), Vec3::new(side, side, side))
    }

    #[test]
    fn distance_between_corners() {
        let a = Vec3::zero();
        let b = Vec3::new(30.0, 40.0, 0.0);
        assert!((a.distance_to(&b) - 50.0).abs() < EPSILON_GENERAL);
        assert_eq!(a.distance_to(&b), b.distance_to(&a));
    }

    #[test]
    fn touching_pallets_do_not_intersect() {
        let pallet = cube(0.0, 0.0, 0.0, 100.0);

        assert!(pallet.intersects(&cube(50.0, 50.0, 50.0, 100.0), EPSILON_GENERAL));
        assert!(!pallet.intersects(&cube(100.0, 0.0, 0.0, 100.0), EPSILON_GENERAL));
        assert!(!pallet.intersects(&cube(0.0, 0.0, 100.0, 100.0), EPSILON_GENERAL));
        assert!(!pallet.intersects(&cube(300.0, 300.0, 300.0, 100.0), EPSILON_GENERAL));
    }

    #[test]
    fn footprint_overlap_ignores_height() {
        let floor = cube(0.0, 0.0, 0.0, 10.0);
        let above = cube(5.0, 5.0, 50.0, 10.0);
        let beside = cube(0.0, 10.0, 0.0, 10.0);

        assert!(floor.footprint_overlaps(&above, EPSILON_GENERAL));
        assert!(!floor.footprint_overlaps(&beside, EPSILON_GENERAL));
    }

    #[test]
    fn containment_allows_tolerance_only() {
        let hold = cube(0.0, 0.0, 0.0, 10.0);
        let corner = Vec3::new(2.0, 2.0, 2.0);
        let inside = BoundingBox::from_position_and_dims(corner, Vec3::new(8.0, 8.0, 8.0));
        let overhang = BoundingBox::from_position_and_dims(corner, Vec3::new(8.0 + 1e-7, 8.0, 8.0));
        let sticking_out = BoundingBox::from_position_and_dims(corner, Vec3::new(9.0, 8.0, 8.0));

        assert!(inside.is_within(&hold, EPSILON_GENERAL));
        assert!(overhang.is_within(&hold, EPSILON_GENERAL));
        assert!(!sticking_out.is_within(&hold, EPSILON_GENERAL));
    }
}

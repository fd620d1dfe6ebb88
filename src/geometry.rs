//! Geometric helpers for 3D collision detection and stacking support.
//!
//! These functions relate already-placed items to the box a candidate item
//! would occupy.

use crate::model::Placement;
use crate::types::BoundingBox;

/// Checks whether `placed` occupies any of the space of `candidate`.
///
/// Uses the oriented axis-aligned boxes. Separation on at least one axis, or
/// mere face contact, rules out a collision.
///
/// # Parameters
/// * `placed` - An item already in the container
/// * `candidate` - Box the next item would occupy
/// * `tolerance` - Contact closer than this counts as separation
pub fn collides(placed: &Placement, candidate: &BoundingBox, tolerance: f64) -> bool {
    placed.bounding_box().intersects(candidate, tolerance)
}

/// Checks whether `placed` lies beneath a candidate box and can carry it.
///
/// A placement counts as support when its top surface is at or below the
/// candidate's floor and its footprint overlaps the candidate's footprint.
/// It does not need to touch the candidate directly.
pub fn is_below_footprint(placed: &Placement, candidate: &BoundingBox, tolerance: f64) -> bool {
    placed.top_z() <= candidate.min.z + tolerance
        && placed.bounding_box().footprint_overlaps(candidate, tolerance)
}

//! Candidate position generation.
//!
//! Instead of scanning a continuous space, the optimizer only tries the
//! container origin and the points directly adjacent to items already placed.

use std::cmp::Ordering;

use crate::model::{Placement, Position};

/// Generates the positions worth trying for the next item.
///
/// Always contains the origin. Every placement adds three points: to its right
/// along the length, in front of it along the width and on top of it. Points
/// closer than `dedup_tolerance` on every axis are merged (first one wins) and
/// the result is sorted by `(z, x, y)` so lower, front-left positions come first.
///
/// The result depends only on the placed set, not on the container or the item
/// being placed, so it can be reused across orientation trials.
pub fn candidate_positions(placed: &[Placement], dedup_tolerance: f64) -> Vec<Position> {
    let mut raw = Vec::with_capacity(1 + placed.len() * 3);
    raw.push(Position::origin());

    for p in placed {
        let dims = p.effective_dims();
        let Position { x, y, z } = p.position;
        raw.push(Position::new(x + dims.x, y, z));
        raw.push(Position::new(x, y + dims.y, z));
        raw.push(Position::new(x, y, z + dims.z));
    }

    let mut unique: Vec<Position> = Vec::with_capacity(raw.len());
    for pos in raw {
        if !unique.iter().any(|u| u.approx_eq(&pos, dedup_tolerance)) {
            unique.push(pos);
        }
    }

    unique.sort_by(|a, b| compare_positions(a, b));
    unique
}

fn compare_positions(a: &Position, b: &Position) -> Ordering {
    a.z.total_cmp(&b.z)
        .then_with(|| a.x.total_cmp(&b.x))
        .then_with(|| a.y.total_cmp(&b.y))
}

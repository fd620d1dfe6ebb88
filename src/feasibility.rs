//! Placement feasibility checks.
//!
//! Decides whether a candidate item fits at a candidate position and orientation
//! given the items already placed. The checks run in a fixed order: boundary,
//! weight, collision, stacking support. Nothing here mutates the placed set.

use thiserror::Error;

use crate::geometry::{collides, is_below_footprint};
use crate::model::{CargoItem, Container, Orientation, Placement, Position};
use crate::types::BoundingBox;

/// Reason a candidate placement was rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Infeasibility {
    #[error("item exceeds the container bounds")]
    OutOfBounds,
    #[error("load would reach {total:.1} kg, above the {max:.1} kg limit")]
    ExceedsWeightCapacity { total: f64, max: f64 },
    #[error("item collides with placed item '{with}'")]
    Collision { with: String },
    #[error("support below carries {available:.1} kg, item weighs {required:.1} kg")]
    InsufficientSupport { required: f64, available: f64 },
}

impl Infeasibility {
    pub fn code(&self) -> &'static str {
        match self {
            Infeasibility::OutOfBounds => "out_of_bounds",
            Infeasibility::ExceedsWeightCapacity { .. } => "exceeds_weight_capacity",
            Infeasibility::Collision { .. } => "collision",
            Infeasibility::InsufficientSupport { .. } => "insufficient_support",
        }
    }
}

/// Checks whether `item` can be placed at `position` in `orientation`.
///
/// Convenience wrapper around [`check_placement`] for callers that only need
/// a yes/no answer.
pub fn can_place(
    item: &CargoItem,
    position: Position,
    orientation: Orientation,
    placed: &[Placement],
    container: &Container,
    tolerance: f64,
) -> bool {
    check_placement(item, position, orientation, placed, container, tolerance).is_ok()
}

/// Checks a candidate placement and reports the first rule it violates.
///
/// # Parameters
/// * `item` - The item to place
/// * `position` - Candidate minimum corner
/// * `orientation` - Candidate orientation
/// * `placed` - Items already in the container
/// * `container` - The cargo volume
/// * `tolerance` - Numerical tolerance for all comparisons
pub fn check_placement(
    item: &CargoItem,
    position: Position,
    orientation: Orientation,
    placed: &[Placement],
    container: &Container,
    tolerance: f64,
) -> Result<(), Infeasibility> {
    let candidate =
        BoundingBox::from_position_and_dims(position.as_vec3(), orientation.effective_dims(item));

    if !candidate.is_within(&container.bounding_box(), tolerance) {
        return Err(Infeasibility::OutOfBounds);
    }

    let total = placed.iter().map(|p| p.item.weight()).sum::<f64>() + item.weight();
    if total > container.max_weight() + tolerance {
        return Err(Infeasibility::ExceedsWeightCapacity {
            total,
            max: container.max_weight(),
        });
    }

    if let Some(hit) = placed
        .iter()
        .find(|p| collides(p, &candidate, tolerance))
    {
        return Err(Infeasibility::Collision {
            with: hit.item.id().to_string(),
        });
    }

    // Items on the floor need no support
    if position.z > tolerance {
        let available = support_weight(&candidate, placed, tolerance);
        if available + tolerance < item.weight() {
            return Err(Infeasibility::InsufficientSupport {
                required: item.weight(),
                available,
            });
        }
    }

    Ok(())
}

/// Sums the support capacity beneath a candidate box.
///
/// Every placement whose top is at or below the candidate's floor and whose
/// footprint overlaps the candidate's footprint contributes
/// `min(max_stack_weight, weight)` in full, regardless of the overlapping area.
pub fn support_weight(candidate: &BoundingBox, placed: &[Placement], tolerance: f64) -> f64 {
    placed
        .iter()
        .filter(|p| is_below_footprint(p, candidate, tolerance))
        .map(|p| p.item.support_capacity())
        .sum()
}

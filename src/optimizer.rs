//! Placement optimizer for loading cargo into a single vehicle.
//!
//! This module implements a greedy bottom-left-fill heuristic:
//! - candidate positions come from the container origin and the faces of placed items
//! - every feasible position/orientation pair is scored, lowest score wins
//! - items are never moved once placed (no backtracking)
//!
//! Items bound for later delivery stops are loaded first so that early-stop cargo
//! stays accessible at the doors.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::candidates::candidate_positions;
use crate::feasibility::can_place;
use crate::model::{CargoItem, Container, Orientation, Placement, Position};
use crate::types::{DEDUP_TOLERANCE, EPSILON_GENERAL};

/// Configuration for the placement heuristic.
///
/// Holds the tolerances and switches that steer the optimizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacementConfig {
    /// Numerical tolerance for boundary, collision, weight and support checks
    pub general_epsilon: f64,
    /// Candidate positions closer than this on every axis are merged
    pub dedup_tolerance: f64,
    /// Whether the 90° rotation about the vertical axis may be tried
    pub allow_rotation: bool,
}

impl PlacementConfig {
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;
    pub const DEFAULT_DEDUP_TOLERANCE: f64 = DEDUP_TOLERANCE;
    pub const DEFAULT_ALLOW_ROTATION: bool = true;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PlacementConfigBuilder {
        PlacementConfigBuilder::default()
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            dedup_tolerance: Self::DEFAULT_DEDUP_TOLERANCE,
            allow_rotation: Self::DEFAULT_ALLOW_ROTATION,
        }
    }
}

/// Builder for [`PlacementConfig`].
#[derive(Clone, Debug, Default)]
pub struct PlacementConfigBuilder {
    config: PlacementConfig,
}

impl PlacementConfigBuilder {
    /// Sets the general numerical tolerance.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    /// Sets the candidate de-duplication tolerance.
    pub fn dedup_tolerance(mut self, tolerance: f64) -> Self {
        self.config.dedup_tolerance = tolerance;
        self
    }

    /// Enables or disables rotation trials.
    pub fn allow_rotation(mut self, allow: bool) -> Self {
        self.config.allow_rotation = allow;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PlacementConfig {
        self.config
    }
}

/// Scores a candidate position; lower is better.
///
/// The weights make height dominate, then position along the length, then along
/// the width.
#[inline]
pub fn placement_score(position: &Position) -> f64 {
    position.z * 1000.0 + position.x * 100.0 + position.y
}

/// Orders items for loading.
///
/// Descending delivery stop first, then descending value density. The sort is
/// stable, so ties keep their input order.
pub fn loading_order(items: &[CargoItem]) -> Vec<&CargoItem> {
    let mut ordered: Vec<&CargoItem> = items.iter().collect();
    ordered.sort_by(|a, b| {
        b.delivery_stop()
            .cmp(&a.delivery_stop())
            .then_with(|| {
                b.value_density()
                    .partial_cmp(&a.value_density())
                    .unwrap_or(Ordering::Equal)
            })
    });
    ordered
}

/// Result of placing a sequence of items.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OptimizationOutcome {
    /// Placements made during this run, in placement order
    pub placed: Vec<Placement>,
    /// Items that could not be placed, in loading order
    pub failed: Vec<CargoItem>,
}

impl OptimizationOutcome {
    /// Indicates whether every item was placed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Total weight of the placements made in this run.
    pub fn placed_weight(&self) -> f64 {
        self.placed.iter().map(|p| p.item.weight()).sum()
    }
}

/// Events emitted while a sequence is being placed.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OptimizerEvent {
    /// An item was placed.
    ItemPlaced {
        id: String,
        position: Position,
        orientation: Orientation,
        weight: f64,
        total_weight: f64,
    },
    /// An item could not be placed.
    ItemRejected { id: String, weight: f64 },
    /// The sequence is done.
    Finished { placed: usize, failed: usize },
}

/// Greedy placement optimizer for one container.
///
/// Owns the growing set of placements and the running totals of one run.
/// Construct a fresh optimizer per run; nothing is shared between runs.
#[derive(Clone, Debug)]
pub struct PlacementOptimizer {
    container: Container,
    config: PlacementConfig,
    placed: Vec<Placement>,
    total_weight: f64,
    total_volume: f64,
}

impl PlacementOptimizer {
    /// Creates an optimizer with the default configuration.
    pub fn new(container: Container) -> Self {
        Self::with_config(container, PlacementConfig::default())
    }

    /// Creates an optimizer with a custom configuration.
    pub fn with_config(container: Container, config: PlacementConfig) -> Self {
        Self {
            container,
            config,
            placed: Vec::new(),
            total_weight: 0.0,
            total_volume: 0.0,
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// All placements committed so far, in placement order.
    pub fn placed(&self) -> &[Placement] {
        &self.placed
    }

    /// Total weight of placed items in kg.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Total volume of placed items in cm³.
    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    fn orientations_for(&self, item: &CargoItem) -> &'static [Orientation] {
        if !self.config.allow_rotation || item.has_square_footprint(self.config.general_epsilon) {
            &[Orientation::Unrotated]
        } else {
            &[Orientation::Unrotated, Orientation::Rotated90]
        }
    }

    /// Finds the best feasible position and orientation for `item`.
    ///
    /// Ties keep the first pair found, which favours the unrotated orientation
    /// and the earlier candidate position.
    ///
    /// # Returns
    /// `Some((position, orientation))` if any feasible pair exists, otherwise `None`
    pub fn find_best_placement(&self, item: &CargoItem) -> Option<(Position, Orientation)> {
        let candidates = candidate_positions(&self.placed, self.config.dedup_tolerance);
        let mut best: Option<(Position, Orientation, f64)> = None;

        for &orientation in self.orientations_for(item) {
            for position in &candidates {
                if !can_place(
                    item,
                    *position,
                    orientation,
                    &self.placed,
                    &self.container,
                    self.config.general_epsilon,
                ) {
                    continue;
                }

                let score = placement_score(position);
                match best {
                    Some((_, _, best_score)) if score >= best_score => {}
                    _ => best = Some((*position, orientation, score)),
                }
            }
        }

        best.map(|(position, orientation, _)| (position, orientation))
    }

    /// Places one item at its best feasible position.
    ///
    /// # Returns
    /// `true` if a placement was committed. Out-of-bounds, overweight, collision
    /// and missing support all surface as `false`.
    pub fn place_item(&mut self, item: &CargoItem) -> bool {
        let Some((position, orientation)) = self.find_best_placement(item) else {
            debug!(item = item.id(), "no feasible position");
            return false;
        };

        debug!(
            item = item.id(),
            x = position.x,
            y = position.y,
            z = position.z,
            ?orientation,
            "item placed"
        );
        self.total_weight += item.weight();
        self.total_volume += item.volume();
        self.placed
            .push(Placement::new(item.clone(), position, orientation));
        true
    }

    /// Places a list of items in loading order.
    ///
    /// See [`loading_order`] for the ordering. Failed items are collected and
    /// never cause earlier placements to be revisited.
    pub fn optimize_sequence(&mut self, items: &[CargoItem]) -> OptimizationOutcome {
        self.optimize_sequence_with_progress(items, |_| {})
    }

    /// Like [`PlacementOptimizer::optimize_sequence`], with a progress callback.
    pub fn optimize_sequence_with_progress(
        &mut self,
        items: &[CargoItem],
        mut on_event: impl FnMut(&OptimizerEvent),
    ) -> OptimizationOutcome {
        let first_new = self.placed.len();
        let mut failed = Vec::new();

        for item in loading_order(items) {
            if self.place_item(item) {
                if let Some(placement) = self.placed.last() {
                    on_event(&OptimizerEvent::ItemPlaced {
                        id: placement.item.id().to_string(),
                        position: placement.position,
                        orientation: placement.orientation,
                        weight: placement.item.weight(),
                        total_weight: self.total_weight,
                    });
                }
            } else {
                on_event(&OptimizerEvent::ItemRejected {
                    id: item.id().to_string(),
                    weight: item.weight(),
                });
                failed.push(item.clone());
            }
        }

        let placed = self.placed[first_new..].to_vec();
        on_event(&OptimizerEvent::Finished {
            placed: placed.len(),
            failed: failed.len(),
        });
        OptimizationOutcome { placed, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::support_weight;
    use crate::geometry::collides;
    use proptest::prelude::*;

    fn standard_container() -> Container {
        Container::new((1000.0, 250.0, 300.0), 5000.0).unwrap()
    }

    fn item(id: &str, dims: (f64, f64, f64), weight: f64) -> CargoItem {
        CargoItem::new(id, dims, weight).unwrap()
    }

    fn assert_invariants(container: &Container, placements: &[Placement], eps: f64) {
        let bounds = container.bounding_box();
        for p in placements {
            assert!(
                p.bounding_box().is_within(&bounds, eps),
                "Item {} leaves the container",
                p.item.id()
            );
        }

        for (i, a) in placements.iter().enumerate() {
            for b in &placements[i + 1..] {
                assert!(
                    !collides(a, &b.bounding_box(), eps),
                    "Items {} and {} overlap",
                    a.item.id(),
                    b.item.id()
                );
            }
        }

        let total: f64 = placements.iter().map(|p| p.item.weight()).sum();
        assert!(total <= container.max_weight() + eps);

        for p in placements.iter().filter(|p| p.position.z > eps) {
            let support = support_weight(&p.bounding_box(), placements, eps);
            assert!(
                support + eps >= p.item.weight(),
                "Item {} at z={} has {} kg support for {} kg",
                p.item.id(),
                p.position.z,
                support,
                p.item.weight()
            );
        }
    }

    #[test]
    fn single_item_lands_at_origin_unrotated() {
        let mut optimizer = PlacementOptimizer::new(standard_container());
        assert!(optimizer.place_item(&item("A", (100.0, 50.0, 30.0), 100.0)));

        let placement = &optimizer.placed()[0];
        assert_eq!(placement.position, Position::origin());
        assert_eq!(placement.orientation, Orientation::Unrotated);
    }

    #[test]
    fn oversized_item_fails_and_leaves_state_untouched() {
        let mut optimizer = PlacementOptimizer::new(standard_container());
        assert!(!optimizer.place_item(&item("A", (1100.0, 50.0, 30.0), 100.0)));
        assert!(optimizer.placed().is_empty());
        assert_eq!(optimizer.total_weight(), 0.0);
        assert_eq!(optimizer.total_volume(), 0.0);
    }

    #[test]
    fn rejects_items_exceeding_width_or_height() {
        let mut optimizer = PlacementOptimizer::new(standard_container());
        assert!(!optimizer.place_item(&item("wide", (100.0, 1100.0, 30.0), 1.0)));
        assert!(!optimizer.place_item(&item("tall", (100.0, 50.0, 301.0), 1.0)));
        assert!(optimizer.placed().is_empty());
    }

    #[test]
    fn exact_fit_succeeds() {
        let mut optimizer = PlacementOptimizer::new(standard_container());
        assert!(optimizer.place_item(&item("A", (1000.0, 250.0, 300.0), 5000.0)));
        assert_eq!(optimizer.placed().len(), 1);
        assert_eq!(optimizer.total_weight(), 5000.0);
    }

    #[test]
    fn two_item_sequence_places_both() {
        let mut optimizer = PlacementOptimizer::new(standard_container());
        let outcome = optimizer.optimize_sequence(&[
            item("A", (100.0, 50.0, 30.0), 100.0),
            item("B", (80.0, 40.0, 25.0), 80.0),
        ]);

        assert_eq!(outcome.placed_count(), 2);
        assert!(outcome.is_complete());
        assert_eq!(optimizer.total_weight(), 180.0);
        assert_eq!(outcome.placed_weight(), 180.0);
        assert_invariants(optimizer.container(), optimizer.placed(), EPSILON_GENERAL);
    }

    #[test]
    fn second_item_goes_beside_not_on_top() {
        let mut optimizer = PlacementOptimizer::new(standard_container());
        optimizer.optimize_sequence(&[
            item("A", (100.0, 50.0, 30.0), 100.0),
            item("B", (100.0, 50.0, 30.0), 100.0),
        ]);
        let second = &optimizer.placed()[1];
        // (0, 50, 0) scores 50, cheaper than (100, 0, 0) at 10000.
        assert_eq!(second.position, Position::new(0.0, 50.0, 0.0));
    }

    #[test]
    fn rotation_is_used_when_only_rotated_fits() {
        let container = Container::new((100.0, 300.0, 100.0), 1000.0).unwrap();
        let mut optimizer = PlacementOptimizer::new(container);
        assert!(optimizer.place_item(&item("A", (200.0, 50.0, 50.0), 10.0)));
        assert_eq!(optimizer.placed()[0].orientation, Orientation::Rotated90);
    }

    #[test]
    fn rotation_can_be_disabled() {
        let container = Container::new((100.0, 300.0, 100.0), 1000.0).unwrap();
        let config = PlacementConfig::builder().allow_rotation(false).build();
        let mut optimizer = PlacementOptimizer::with_config(container, config);
        assert!(!optimizer.place_item(&item("A", (200.0, 50.0, 50.0), 10.0)));
    }

    #[test]
    fn weight_capacity_turns_away_last_item() {
        let container = Container::new((1000.0, 250.0, 300.0), 150.0).unwrap();
        let mut optimizer = PlacementOptimizer::new(container);
        let outcome = optimizer.optimize_sequence(&[
            item("A", (10.0, 10.0, 10.0), 100.0),
            item("B", (10.0, 10.0, 10.0), 100.0),
        ]);
        assert_eq!(outcome.placed_count(), 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id(), "B");
    }

    #[test]
    fn later_stops_are_loaded_first() {
        let early = CargoItem::builder("early", (10.0, 10.0, 10.0), 1.0)
            .delivery_stop(1)
            .build()
            .unwrap();
        let late = CargoItem::builder("late", (10.0, 10.0, 10.0), 1.0)
            .delivery_stop(3)
            .build()
            .unwrap();
        let middle = CargoItem::builder("middle", (10.0, 10.0, 10.0), 1.0)
            .delivery_stop(2)
            .build()
            .unwrap();

        let items = vec![early, late, middle];
        let order: Vec<&str> = loading_order(&items).iter().map(|i| i.id()).collect();
        assert_eq!(order, vec!["late", "middle", "early"]);
    }

    #[test]
    fn value_density_breaks_ties_and_sort_is_stable() {
        let cheap = CargoItem::builder("cheap", (10.0, 10.0, 10.0), 1.0)
            .value(10.0)
            .build()
            .unwrap();
        let dense = CargoItem::builder("dense", (10.0, 10.0, 10.0), 1.0)
            .value(500.0)
            .build()
            .unwrap();
        let cheap_twin = CargoItem::builder("cheap-twin", (10.0, 10.0, 10.0), 1.0)
            .value(10.0)
            .build()
            .unwrap();

        let items = vec![cheap, dense, cheap_twin];
        let order: Vec<&str> = loading_order(&items).iter().map(|i| i.id()).collect();
        assert_eq!(order, vec!["dense", "cheap", "cheap-twin"]);
    }

    #[test]
    fn failed_items_keep_loading_order() {
        let container = Container::new((100.0, 100.0, 100.0), 1000.0).unwrap();
        let mut optimizer = PlacementOptimizer::new(container);
        let too_big_a = CargoItem::builder("big-a", (200.0, 10.0, 10.0), 1.0)
            .delivery_stop(1)
            .build()
            .unwrap();
        let too_big_b = CargoItem::builder("big-b", (200.0, 10.0, 10.0), 1.0)
            .delivery_stop(2)
            .build()
            .unwrap();
        let outcome = optimizer.optimize_sequence(&[too_big_a, too_big_b]);
        let failed: Vec<&str> = outcome.failed.iter().map(|i| i.id()).collect();
        assert_eq!(failed, vec!["big-b", "big-a"]);
    }

    #[test]
    fn heavy_item_is_not_stacked_on_light_one() {
        // Narrow container: the only free spot after the first item is on top.
        let container = Container::new((10.0, 10.0, 30.0), 1000.0).unwrap();
        let mut optimizer = PlacementOptimizer::new(container);
        let outcome = optimizer.optimize_sequence(&[
            item("light", (10.0, 10.0, 10.0), 5.0),
            item("heavy", (10.0, 10.0, 10.0), 9.0),
        ]);
        assert_eq!(outcome.placed_count(), 1);
        assert_eq!(outcome.failed[0].id(), "heavy");
    }

    #[test]
    fn stack_limit_caps_support_below_item_weight() {
        let container = Container::new((10.0, 10.0, 30.0), 1000.0).unwrap();
        let base = CargoItem::builder("base", (10.0, 10.0, 10.0), 50.0)
            .max_stack_weight(8.0)
            .build()
            .unwrap();
        let mut optimizer = PlacementOptimizer::new(container);
        let outcome = optimizer.optimize_sequence(&[
            base,
            item("nine", (10.0, 10.0, 10.0), 9.0),
            item("eight", (10.0, 10.0, 10.0), 8.0),
        ]);

        let placed: Vec<&str> = outcome.placed.iter().map(|p| p.item.id()).collect();
        assert_eq!(placed, vec!["base", "eight"]);
        assert_eq!(outcome.failed[0].id(), "nine");
        assert_eq!(outcome.placed[1].position.z, 10.0);
    }

    #[test]
    fn progress_events_mirror_outcome() {
        let mut optimizer = PlacementOptimizer::new(standard_container());
        let mut events = Vec::new();
        let outcome = optimizer.optimize_sequence_with_progress(
            &[
                item("A", (100.0, 50.0, 30.0), 100.0),
                item("B", (2000.0, 50.0, 30.0), 100.0),
            ],
            |evt| events.push(evt.clone()),
        );

        assert_eq!(outcome.placed_count(), 1);
        assert!(matches!(events[0], OptimizerEvent::ItemPlaced { ref id, .. } if id == "A"));
        assert!(matches!(events[1], OptimizerEvent::ItemRejected { ref id, .. } if id == "B"));
        assert_eq!(
            events.last(),
            Some(&OptimizerEvent::Finished {
                placed: 1,
                failed: 1
            })
        );
    }

    #[test]
    fn sequence_outcome_only_reports_new_placements() {
        let mut optimizer = PlacementOptimizer::new(standard_container());
        assert!(optimizer.place_item(&item("A", (100.0, 50.0, 30.0), 10.0)));
        let outcome = optimizer.optimize_sequence(&[item("B", (100.0, 50.0, 30.0), 10.0)]);
        assert_eq!(outcome.placed_count(), 1);
        assert_eq!(outcome.placed[0].item.id(), "B");
        assert_eq!(optimizer.placed().len(), 2);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = PlacementConfig::builder()
            .general_epsilon(1e-3)
            .dedup_tolerance(0.5)
            .allow_rotation(false)
            .build();
        assert_eq!(config.general_epsilon, 1e-3);
        assert_eq!(config.dedup_tolerance, 0.5);
        assert!(!config.allow_rotation);
        assert_eq!(PlacementConfig::default().dedup_tolerance, 0.1);
    }

    fn arb_items() -> impl Strategy<Value = Vec<CargoItem>> {
        prop::collection::vec(
            (
                10u32..400,
                10u32..200,
                10u32..150,
                0u32..800,
                1u32..4,
                0u32..1000,
                prop::option::of(0u32..600),
            ),
            1..25,
        )
        .prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(idx, (l, w, h, weight, stop, value, stack_limit))| {
                    CargoItem::builder(
                        format!("item-{idx}"),
                        (l as f64, w as f64, h as f64),
                        weight as f64,
                    )
                    .delivery_stop(stop)
                    .value(value as f64)
                    .max_stack_weight(stack_limit.map_or(f64::INFINITY, f64::from))
                    .build()
                    .unwrap()
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn placements_satisfy_load_invariants(items in arb_items()) {
            let mut optimizer = PlacementOptimizer::new(standard_container());
            let outcome = optimizer.optimize_sequence(&items);

            prop_assert_eq!(outcome.placed.len() + outcome.failed.len(), items.len());
            for failed in &outcome.failed {
                prop_assert!(outcome.placed.iter().all(|p| p.item.id() != failed.id()));
            }
            assert_invariants(optimizer.container(), optimizer.placed(), EPSILON_GENERAL);
        }

        #[test]
        fn optimization_is_deterministic(items in arb_items()) {
            let mut first = PlacementOptimizer::new(standard_container());
            let mut second = PlacementOptimizer::new(standard_container());
            let a = first.optimize_sequence(&items);
            let b = second.optimize_sequence(&items);
            prop_assert_eq!(a, b);
        }
    }
}

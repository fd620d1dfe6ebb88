//! Load plan assembly for a single vehicle.
//!
//! Turns shipment records into cargo items, runs the placement optimizer and
//! derives the plan figures: utilization, optimization score, dangerous-goods
//! status and load/unload sequencing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dangerous_goods::DgCompatibility;
use crate::error::PlanError;
use crate::model::{CargoItem, Container, Placement};
use crate::optimizer::{OptimizerEvent, PlacementConfig, PlacementOptimizer};
use crate::records::{
    CM3_PER_M3, DangerousGoodEntry, FallbackPolicy, ShipmentRecord, VehicleRecord,
};

/// Name recorded in every plan's metadata.
pub const ALGORITHM_NAME: &str = "3D_BIN_PACKING_BOTTOM_LEFT_FILL";

/// Share of the score taken by space utilization.
const UTILIZATION_WEIGHT: f64 = 0.7;
/// Share of the score taken by dangerous-goods compliance.
const COMPLIANCE_WEIGHT: f64 = 0.3;
const COMPLIANT_SCORE: f64 = 100.0;
const NON_COMPLIANT_SCORE: f64 = 70.0;

/// Objective a plan was requested for.
///
/// Recorded on the plan; the placement heuristic is the same for every mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationMode {
    Volume,
    Weight,
    Revenue,
    #[default]
    Mixed,
}

/// Dangerous-goods status of a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DgComplianceStatus {
    Compliant,
    Violations,
}

/// Settings for one planning run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlanningOptions {
    pub placement: PlacementConfig,
    pub fallback: FallbackPolicy,
}

/// A placed item with its sequencing information.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlannedItem {
    pub placement: Placement,
    pub shipment_id: String,
    /// 1-based position in the loading order.
    pub load_sequence: usize,
    /// 1-based position in the unloading order (reverse of loading).
    pub unload_sequence: usize,
}

impl PlannedItem {
    pub fn item(&self) -> &CargoItem {
        &self.placement.item
    }

    pub fn delivery_stop(&self) -> u32 {
        self.placement.item.delivery_stop()
    }
}

/// Bookkeeping about the optimizer run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanMetadata {
    pub algorithm: &'static str,
    pub successful_items: usize,
    pub failed_items: usize,
    pub failed_item_ids: Vec<String>,
    pub total_items: usize,
    /// Average of weight and volume utilization in percent.
    pub utilization_efficiency: f64,
}

/// Result of planning one vehicle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoadPlan {
    pub vehicle_id: String,
    pub vehicle_label: String,
    pub optimization_mode: OptimizationMode,
    pub container: Container,
    pub max_volume_m3: f64,
    pub shipment_ids: Vec<String>,
    pub items: Vec<PlannedItem>,
    pub failed_items: Vec<CargoItem>,
    pub planned_weight_kg: f64,
    pub planned_volume_m3: f64,
    pub weight_utilization_pct: f64,
    pub volume_utilization_pct: f64,
    pub optimization_score: f64,
    pub contains_dangerous_goods: bool,
    pub dg_compliance_status: DgComplianceStatus,
    pub dg_violations: Vec<String>,
    pub metadata: PlanMetadata,
}

impl LoadPlan {
    /// Placements in loading order.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.items.iter().map(|planned| &planned.placement)
    }

    pub fn max_weight_kg(&self) -> f64 {
        self.container.max_weight()
    }

    pub fn available_weight_kg(&self) -> f64 {
        (self.max_weight_kg() - self.planned_weight_kg).max(0.0)
    }

    pub fn available_volume_m3(&self) -> f64 {
        (self.max_volume_m3 - self.planned_volume_m3).max(0.0)
    }

    /// Whether weight rather than space is the tighter limit.
    pub fn is_weight_constrained(&self) -> bool {
        self.weight_utilization_pct >= self.volume_utilization_pct
    }

    /// Number of placed items.
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_dg_compliant(&self) -> bool {
        self.dg_compliance_status == DgComplianceStatus::Compliant
    }
}

/// Computes the optimization score of a plan.
///
/// `0.7 × average utilization + 0.3 × (100 if compliant else 70)`.
///
/// # Examples
/// ```
/// use load_planner::load_plan::optimization_score;
///
/// assert!((optimization_score(50.0, 30.0, true) - 58.0).abs() < 1e-9);
/// assert!((optimization_score(50.0, 30.0, false) - 49.0).abs() < 1e-9);
/// ```
pub fn optimization_score(
    weight_utilization: f64,
    volume_utilization: f64,
    dg_compliant: bool,
) -> f64 {
    let utilization = (weight_utilization + volume_utilization) / 2.0;
    let compliance = if dg_compliant {
        COMPLIANT_SCORE
    } else {
        NON_COMPLIANT_SCORE
    };
    UTILIZATION_WEIGHT * utilization + COMPLIANCE_WEIGHT * compliance
}

/// Builds the load plan for one vehicle.
///
/// # Parameters
/// * `vehicle` - The vehicle record; missing cargo dimensions use the fallback policy
/// * `shipments` - Shipments assigned to this vehicle
/// * `mode` - Requested optimization objective
/// * `dg` - Compatibility collaborator, consulted when more than one DG item is present
/// * `options` - Placement configuration and fallback policy
///
/// # Returns
/// The plan, or an error for invalid records and collaborator failures.
/// Items that do not fit are not an error; they are listed in `failed_items`.
pub fn build_load_plan(
    vehicle: &VehicleRecord,
    shipments: &[ShipmentRecord],
    mode: OptimizationMode,
    dg: &dyn DgCompatibility,
    options: &PlanningOptions,
) -> Result<LoadPlan, PlanError> {
    let policy = &options.fallback;
    let container = vehicle.container(policy)?;
    let max_volume_m3 = vehicle.max_volume_m3(policy)?;

    let mut items = Vec::new();
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut dg_entries: Vec<DangerousGoodEntry> = Vec::new();

    for shipment in shipments {
        for record in &shipment.items {
            let item = record.to_cargo_item(shipment.delivery_stop, policy)?;
            if owners
                .insert(item.id().to_string(), shipment.id.clone())
                .is_some()
            {
                return Err(PlanError::DuplicateItemId {
                    item_id: item.id().to_string(),
                });
            }
            if let Some(entry) = record
                .dangerous_good
                .as_ref()
                .filter(|_| record.is_dangerous_good)
            {
                dg_entries.push(entry.clone());
            }
            items.push(item);
        }
    }

    let (dg_compliance_status, dg_violations) = if dg_entries.len() > 1 {
        let verdict = dg.check(&dg_entries).inspect_err(|err| {
            warn!(vehicle = %vehicle.id, error = %err, "dangerous goods check failed");
        })?;
        if verdict.compatible {
            (DgComplianceStatus::Compliant, Vec::new())
        } else {
            (DgComplianceStatus::Violations, verdict.reasons)
        }
    } else {
        (DgComplianceStatus::Compliant, Vec::new())
    };

    let mut optimizer = PlacementOptimizer::with_config(container, options.placement);
    let outcome = optimizer.optimize_sequence_with_progress(&items, |event| {
        if let OptimizerEvent::ItemRejected { id, weight } = event {
            debug!(vehicle = %vehicle.id, item = %id, weight, "item could not be placed");
        }
    });

    let count = outcome.placed.len();
    let planned_items: Vec<PlannedItem> = outcome
        .placed
        .into_iter()
        .enumerate()
        .map(|(idx, placement)| PlannedItem {
            shipment_id: owners
                .get(placement.item.id())
                .cloned()
                .unwrap_or_default(),
            load_sequence: idx + 1,
            unload_sequence: count - idx,
            placement,
        })
        .collect();

    let planned_weight_kg = optimizer.total_weight();
    let planned_volume_m3 = optimizer.total_volume() / CM3_PER_M3;
    let weight_utilization_pct = planned_weight_kg / container.max_weight() * 100.0;
    let volume_utilization_pct = planned_volume_m3 / max_volume_m3 * 100.0;
    let dg_compliant = dg_compliance_status == DgComplianceStatus::Compliant;
    let optimization_score =
        optimization_score(weight_utilization_pct, volume_utilization_pct, dg_compliant);

    info!(
        vehicle = %vehicle.id,
        placed = count,
        failed = outcome.failed.len(),
        weight_pct = weight_utilization_pct,
        volume_pct = volume_utilization_pct,
        score = optimization_score,
        "load plan assembled"
    );

    let metadata = PlanMetadata {
        algorithm: ALGORITHM_NAME,
        successful_items: count,
        failed_items: outcome.failed.len(),
        failed_item_ids: outcome.failed.iter().map(|i| i.id().to_string()).collect(),
        total_items: items.len(),
        utilization_efficiency: (weight_utilization_pct + volume_utilization_pct) / 2.0,
    };

    Ok(LoadPlan {
        vehicle_id: vehicle.id.clone(),
        vehicle_label: vehicle.label().to_string(),
        optimization_mode: mode,
        container,
        max_volume_m3,
        shipment_ids: shipments.iter().map(|s| s.id.clone()).collect(),
        items: planned_items,
        failed_items: outcome.failed,
        planned_weight_kg,
        planned_volume_m3,
        weight_utilization_pct,
        volume_utilization_pct,
        optimization_score,
        contains_dangerous_goods: !dg_entries.is_empty(),
        dg_compliance_status,
        dg_violations,
        metadata,
    })
}

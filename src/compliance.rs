//! Compliance validation of finished load plans.
//!
//! Checks dangerous-goods separation distances (hard violations) and the
//! front/rear weight balance (warnings only), then refreshes the plan's stored
//! compliance fields.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::load_plan::{DgComplianceStatus, LoadPlan};
use crate::model::Placement;

/// Front-share limits for balance warnings, in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceThresholds {
    /// Warn when the front half carries more than this share.
    pub front_heavy_pct: f64,
    /// Warn when the front half carries less than this share.
    pub rear_heavy_pct: f64,
}

impl BalanceThresholds {
    pub const DEFAULT_FRONT_HEAVY_PCT: f64 = 60.0;
    pub const DEFAULT_REAR_HEAVY_PCT: f64 = 40.0;
}

impl Default for BalanceThresholds {
    fn default() -> Self {
        Self {
            front_heavy_pct: Self::DEFAULT_FRONT_HEAVY_PCT,
            rear_heavy_pct: Self::DEFAULT_REAR_HEAVY_PCT,
        }
    }
}

/// Split of the placed weight between the two halves of the cargo length.
///
/// The two shares always add up to 100.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WeightDistribution {
    pub front_percentage: f64,
    pub rear_percentage: f64,
}

/// Outcome of validating a load plan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub is_compliant: bool,
    pub violations: Vec<String>,
    pub warnings: Vec<String>,
    pub total_items: usize,
    pub dg_items: usize,
    pub weight_distribution: WeightDistribution,
}

/// Validates a load plan and writes the dangerous-goods result back onto it.
///
/// Only the placements are read, so validating the same plan twice yields the
/// same report. The write-back replaces `dg_violations` and
/// `dg_compliance_status` with the separation result.
///
/// # Parameters
/// * `plan` - A plan produced by [`crate::load_plan::build_load_plan`]
/// * `thresholds` - Balance warning limits
pub fn validate(plan: &mut LoadPlan, thresholds: &BalanceThresholds) -> ComplianceReport {
    let dangerous: Vec<&Placement> = plan
        .placements()
        .filter(|p| p.item.is_dangerous())
        .collect();
    let violations = separation_violations(&dangerous);

    let distribution = weight_distribution(plan);
    let warnings = if plan.placements().any(|p| p.item.weight() > 0.0) {
        balance_warnings(&distribution, thresholds)
    } else {
        Vec::new()
    };

    let report = ComplianceReport {
        is_compliant: violations.is_empty(),
        violations,
        warnings,
        total_items: plan.total_items(),
        dg_items: dangerous.len(),
        weight_distribution: distribution,
    };

    plan.dg_compliance_status = if report.is_compliant {
        DgComplianceStatus::Compliant
    } else {
        DgComplianceStatus::Violations
    };
    plan.dg_violations = report.violations.clone();

    info!(
        vehicle = %plan.vehicle_id,
        compliant = report.is_compliant,
        violations = report.violations.len(),
        warnings = report.warnings.len(),
        "load plan validated"
    );
    report
}

/// Pairs of dangerous goods closer than the larger of their minimum separations.
///
/// Distance is measured between the items' minimum corners.
fn separation_violations(dangerous: &[&Placement]) -> Vec<String> {
    let mut violations = Vec::new();
    for (i, a) in dangerous.iter().enumerate() {
        for b in &dangerous[i + 1..] {
            let distance = a.position.as_vec3().distance_to(&b.position.as_vec3());
            let required = a.item.min_separation().max(b.item.min_separation());
            if distance < required {
                violations.push(format!(
                    "DG items {} and {} are {:.1}cm apart, minimum required: {:.1}cm",
                    a.item.label(),
                    b.item.label(),
                    distance,
                    required
                ));
            }
        }
    }
    violations
}

/// Front/rear split by minimum corner. A weightless load counts as all rear.
fn weight_distribution(plan: &LoadPlan) -> WeightDistribution {
    let total: f64 = plan.placements().map(|p| p.item.weight()).sum();
    let midpoint = plan.container.length() / 2.0;
    let front: f64 = plan
        .placements()
        .filter(|p| p.position.x < midpoint)
        .map(|p| p.item.weight())
        .sum();
    let front_percentage = if total > 0.0 { front / total * 100.0 } else { 0.0 };
    WeightDistribution {
        front_percentage,
        rear_percentage: 100.0 - front_percentage,
    }
}

fn balance_warnings(
    distribution: &WeightDistribution,
    thresholds: &BalanceThresholds,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if distribution.front_percentage > thresholds.front_heavy_pct {
        warnings.push(format!(
            "Front-heavy load: {:.1}% of weight in front half",
            distribution.front_percentage
        ));
    } else if distribution.front_percentage < thresholds.rear_heavy_pct {
        warnings.push(format!(
            "Rear-heavy load: {:.1}% of weight in rear half",
            distribution.rear_percentage
        ));
    }
    warnings
}

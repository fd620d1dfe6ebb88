//! Environment-driven configuration.
//!
//! Every setting has a default; invalid values are logged and replaced by that
//! default instead of aborting the run.

use std::env;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::compliance::BalanceThresholds;
use crate::load_plan::PlanningOptions;
use crate::optimizer::PlacementConfig;
use crate::records::FallbackPolicy;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub planner: PlannerConfig,
    /// Plan vehicles on blocking worker threads instead of one after another.
    pub parallel_vehicles: bool,
    /// JSON segregation table replacing the built-in standard rules.
    pub segregation_rules: Option<PathBuf>,
}

impl AppConfig {
    const PARALLEL_VEHICLES_VAR: &'static str = "LOAD_PLANNER_PARALLEL_VEHICLES";
    const SEGREGATION_RULES_VAR: &'static str = "LOAD_PLANNER_SEGREGATION_RULES";
    pub const DEFAULT_PARALLEL_VEHICLES: bool = true;

    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(env_string)
    }

    /// Creates a configuration from an arbitrary variable source.
    ///
    /// `lookup` returns the trimmed, non-empty value of a variable, if any.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parallel_vehicles = lookup(Self::PARALLEL_VEHICLES_VAR)
            .and_then(|raw| parse_bool(&raw, Self::PARALLEL_VEHICLES_VAR))
            .unwrap_or(Self::DEFAULT_PARALLEL_VEHICLES);

        Self {
            planner: PlannerConfig::from_lookup(&lookup),
            parallel_vehicles,
            segregation_rules: lookup(Self::SEGREGATION_RULES_VAR).map(PathBuf::from),
        }
    }
}

/// Settings for placement, record fallbacks and compliance checks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlannerConfig {
    placement: PlacementConfig,
    fallback: FallbackPolicy,
    balance: BalanceThresholds,
}

impl PlannerConfig {
    const GENERAL_EPSILON_VAR: &'static str = "LOAD_PLANNER_GENERAL_EPSILON";
    const DEDUP_TOLERANCE_VAR: &'static str = "LOAD_PLANNER_DEDUP_TOLERANCE";
    const ALLOW_ROTATION_VAR: &'static str = "LOAD_PLANNER_ALLOW_ROTATIONS";
    const CAPACITY_VAR: &'static str = "LOAD_PLANNER_DEFAULT_CAPACITY_KG";
    const MAX_VOLUME_VAR: &'static str = "LOAD_PLANNER_DEFAULT_MAX_VOLUME_M3";
    const ITEM_WEIGHT_VAR: &'static str = "LOAD_PLANNER_DEFAULT_ITEM_WEIGHT_KG";
    const ITEM_DIMENSION_VAR: &'static str = "LOAD_PLANNER_DEFAULT_ITEM_DIMENSION_CM";
    const FRONT_HEAVY_VAR: &'static str = "LOAD_PLANNER_FRONT_HEAVY_PCT";
    const REAR_HEAVY_VAR: &'static str = "LOAD_PLANNER_REAR_HEAVY_PCT";

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let general_epsilon = load_f64_with_warning(
            &lookup,
            Self::GENERAL_EPSILON_VAR,
            PlacementConfig::DEFAULT_GENERAL_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted tolerance may accept touching items as overlapping",
        );

        let dedup_tolerance = load_f64_with_warning(
            &lookup,
            Self::DEDUP_TOLERANCE_VAR,
            PlacementConfig::DEFAULT_DEDUP_TOLERANCE,
            |value| value > 0.0,
            "must be greater than 0",
            "Adjusted de-duplication may drop useful candidate positions",
        );

        let allow_rotation = lookup(Self::ALLOW_ROTATION_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ALLOW_ROTATION_VAR))
            .unwrap_or(PlacementConfig::DEFAULT_ALLOW_ROTATION);

        let vehicle_capacity_kg = load_f64_with_warning(
            &lookup,
            Self::CAPACITY_VAR,
            FallbackPolicy::DEFAULT_VEHICLE_CAPACITY_KG,
            |value| value > 0.0,
            "must be greater than 0",
            "Vehicles without a capacity use a non-standard limit",
        );

        let max_volume_m3 = load_f64_with_warning(
            &lookup,
            Self::MAX_VOLUME_VAR,
            FallbackPolicy::DEFAULT_MAX_VOLUME_M3,
            |value| value > 0.0,
            "must be greater than 0",
            "Volume utilization is measured against a non-standard volume",
        );

        let item_weight_kg = load_f64_with_warning(
            &lookup,
            Self::ITEM_WEIGHT_VAR,
            FallbackPolicy::DEFAULT_ITEM_WEIGHT_KG,
            |value| value >= 0.0,
            "must not be negative",
            "Items without a weight use a non-standard weight",
        );

        let item_dimension_cm = load_f64_with_warning(
            &lookup,
            Self::ITEM_DIMENSION_VAR,
            FallbackPolicy::DEFAULT_ITEM_DIMENSION_CM,
            |value| value > 0.0,
            "must be greater than 0",
            "Items without dimensions use a non-standard size",
        );

        let front_heavy_pct = load_f64_with_warning(
            &lookup,
            Self::FRONT_HEAVY_VAR,
            BalanceThresholds::DEFAULT_FRONT_HEAVY_PCT,
            |value| (0.0..=100.0).contains(&value),
            "must be between 0 and 100",
            "Front-heavy warnings use a non-standard limit",
        );

        let mut rear_heavy_pct = load_f64_with_warning(
            &lookup,
            Self::REAR_HEAVY_VAR,
            BalanceThresholds::DEFAULT_REAR_HEAVY_PCT,
            |value| (0.0..=100.0).contains(&value),
            "must be between 0 and 100",
            "Rear-heavy warnings use a non-standard limit",
        );

        if rear_heavy_pct > front_heavy_pct {
            warn!(
                front = front_heavy_pct,
                rear = rear_heavy_pct,
                "{} exceeds {}; using {}",
                Self::REAR_HEAVY_VAR,
                Self::FRONT_HEAVY_VAR,
                front_heavy_pct
            );
            rear_heavy_pct = front_heavy_pct;
        }

        let placement = PlacementConfig::builder()
            .general_epsilon(general_epsilon)
            .dedup_tolerance(dedup_tolerance)
            .allow_rotation(allow_rotation)
            .build();

        let fallback = FallbackPolicy {
            item_dimension_cm,
            item_weight_kg,
            vehicle_capacity_kg,
            max_volume_m3,
            ..FallbackPolicy::default()
        };

        Self {
            placement,
            fallback,
            balance: BalanceThresholds {
                front_heavy_pct,
                rear_heavy_pct,
            },
        }
    }

    pub fn placement_config(&self) -> PlacementConfig {
        self.placement
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.fallback
    }

    pub fn balance_thresholds(&self) -> BalanceThresholds {
        self.balance
    }

    /// Options handed to every load plan build.
    pub fn planning_options(&self) -> PlanningOptions {
        PlanningOptions {
            placement: self.placement,
            fallback: self.fallback,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn load_f64_with_warning(
    lookup: impl Fn(&str) -> Option<String>,
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    notice: &str,
) -> f64 {
    let Some(raw) = lookup(var_name) else {
        return default;
    };

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => {
            let tolerance = default.abs().max(1.0) * 1e-9;
            if (value - default).abs() > tolerance {
                info!("{} ({} = {}).", notice, var_name, value);
            }
            value
        }
        Ok(_) => {
            warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}

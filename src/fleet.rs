//! Multi-vehicle allocation.
//!
//! Shipments are first partitioned across the fleet by weight alone, largest
//! vehicle first. Each vehicle's share is then planned independently, either in
//! sequence or on blocking worker threads. Every record is validated before
//! partitioning, partitioning completes before any plan is built, and no
//! shipment moves between vehicles afterwards.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info};

use crate::dangerous_goods::DgCompatibility;
use crate::error::PlanError;
use crate::load_plan::{LoadPlan, OptimizationMode, PlanningOptions, build_load_plan};
use crate::records::{FallbackPolicy, ShipmentRecord, VehicleRecord};

/// Shipments selected for one vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleAssignment {
    pub vehicle: VehicleRecord,
    pub shipments: Vec<ShipmentRecord>,
    /// Summed shipment weight in kg.
    pub assigned_weight_kg: f64,
}

/// Distributes shipments across vehicles by weight capacity.
///
/// Vehicles are visited by descending capacity (unknown capacity last, ties in
/// input order). Each vehicle takes every remaining shipment that still fits
/// under its weight limit, in input order, skipping those that do not.
/// Vehicles that receive nothing are left out. Shipments that fit nowhere are
/// not reported; compare the input against the assignments to find them.
pub fn partition_shipments(
    shipments: &[ShipmentRecord],
    vehicles: &[VehicleRecord],
    policy: &FallbackPolicy,
) -> Vec<VehicleAssignment> {
    let mut ranked: Vec<&VehicleRecord> = vehicles.iter().collect();
    ranked.sort_by(|a, b| b.ranking_capacity().total_cmp(&a.ranking_capacity()));

    let mut remaining: Vec<&ShipmentRecord> = shipments.iter().collect();
    let mut assignments = Vec::new();

    for vehicle in ranked {
        if remaining.is_empty() {
            break;
        }

        let limit = vehicle.weight_limit(policy);
        let mut load = 0.0;
        let mut selected = Vec::new();
        remaining.retain(|shipment| {
            let weight = shipment.total_weight(policy);
            if load + weight <= limit {
                load += weight;
                selected.push((*shipment).clone());
                false
            } else {
                true
            }
        });

        if selected.is_empty() {
            debug!(vehicle = %vehicle.id, "no remaining shipment fits");
            continue;
        }

        debug!(
            vehicle = %vehicle.id,
            shipments = selected.len(),
            weight_kg = load,
            "shipments assigned"
        );
        assignments.push(VehicleAssignment {
            vehicle: vehicle.clone(),
            shipments: selected,
            assigned_weight_kg: load,
        });
    }

    if !remaining.is_empty() {
        info!(unassigned = remaining.len(), "shipments left without a vehicle");
    }
    assignments
}

/// Rejects the whole run if any vehicle or consignment record is invalid,
/// including records that would never be assigned.
fn validate_inputs(
    shipments: &[ShipmentRecord],
    vehicles: &[VehicleRecord],
    policy: &FallbackPolicy,
) -> Result<(), PlanError> {
    for vehicle in vehicles {
        vehicle.container(policy)?;
        vehicle.max_volume_m3(policy)?;
    }
    for shipment in shipments {
        for record in &shipment.items {
            record.to_cargo_item(shipment.delivery_stop, policy)?;
        }
    }
    Ok(())
}

/// Plans the whole fleet sequentially.
///
/// # Returns
/// One plan per vehicle that received shipments, in allocation order. Invalid
/// records fail the run before anything is placed; otherwise the first planning
/// error aborts it.
pub fn allocate_fleet(
    shipments: &[ShipmentRecord],
    vehicles: &[VehicleRecord],
    dg: &dyn DgCompatibility,
    options: &PlanningOptions,
) -> Result<Vec<LoadPlan>, PlanError> {
    validate_inputs(shipments, vehicles, &options.fallback)?;
    partition_shipments(shipments, vehicles, &options.fallback)
        .iter()
        .map(|assignment| {
            build_load_plan(
                &assignment.vehicle,
                &assignment.shipments,
                OptimizationMode::Mixed,
                dg,
                options,
            )
        })
        .collect()
}

/// Plans the whole fleet with one blocking worker per vehicle.
///
/// Produces the same plans as [`allocate_fleet`], in the same order.
pub async fn allocate_fleet_parallel(
    shipments: &[ShipmentRecord],
    vehicles: &[VehicleRecord],
    dg: Arc<dyn DgCompatibility>,
    options: PlanningOptions,
) -> Result<Vec<LoadPlan>, PlanError> {
    validate_inputs(shipments, vehicles, &options.fallback)?;
    let assignments = partition_shipments(shipments, vehicles, &options.fallback);

    let handles = assignments.into_iter().map(|assignment| {
        let dg = Arc::clone(&dg);
        tokio::task::spawn_blocking(move || {
            build_load_plan(
                &assignment.vehicle,
                &assignment.shipments,
                OptimizationMode::Mixed,
                dg.as_ref(),
                &options,
            )
        })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap_or_else(|err| Err(PlanError::Worker(err.to_string()))))
        .collect()
}

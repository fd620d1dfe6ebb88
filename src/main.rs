// src/main.rs
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use load_planner::compliance::{ComplianceReport, validate};
use load_planner::config::AppConfig;
use load_planner::dangerous_goods::{DgCompatibility, SegregationTable};
use load_planner::fleet::{allocate_fleet, allocate_fleet_parallel};
use load_planner::load_plan::LoadPlan;
use load_planner::logging;
use load_planner::records::PlanningRequest;

#[derive(Serialize)]
struct VehicleResult {
    plan: LoadPlan,
    compliance: ComplianceReport,
}

#[derive(Serialize)]
struct PlanningResponse<'a> {
    plans: Vec<VehicleResult>,
    unassigned_shipment_ids: Vec<&'a str>,
}

/// Reads a planning request from the path given as first argument, or from
/// stdin when no path (or `-`) is given, and prints the plans as JSON.
#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenvy::dotenv();
    logging::init();
    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == io::ErrorKind::NotFound)
        {
            warn!("Could not load .env: {}", err);
        }
    }

    let config = AppConfig::from_env();
    let request = match std::env::args().nth(1).filter(|arg| arg != "-") {
        Some(path) => PlanningRequest::from_path(&path)
            .with_context(|| format!("loading planning request from {path}"))?,
        None => PlanningRequest::from_reader(io::stdin().lock())
            .context("reading planning request from stdin")?,
    };
    info!(
        shipments = request.shipments.len(),
        vehicles = request.vehicles.len(),
        "planning request loaded"
    );

    let table = match &config.segregation_rules {
        Some(path) => SegregationTable::from_path(path)
            .with_context(|| format!("loading segregation rules from {}", path.display()))?,
        None => SegregationTable::standard(),
    };
    let dg: Arc<dyn DgCompatibility> = Arc::new(table);
    let options = config.planner.planning_options();

    let plans = if config.parallel_vehicles {
        allocate_fleet_parallel(
            &request.shipments,
            &request.vehicles,
            Arc::clone(&dg),
            options,
        )
        .await?
    } else {
        allocate_fleet(&request.shipments, &request.vehicles, dg.as_ref(), &options)?
    };

    let thresholds = config.planner.balance_thresholds();
    let results: Vec<VehicleResult> = plans
        .into_iter()
        .map(|mut plan| {
            let compliance = validate(&mut plan, &thresholds);
            VehicleResult { plan, compliance }
        })
        .collect();

    let assigned = results
        .iter()
        .flat_map(|r| r.plan.shipment_ids.iter().map(String::as_str));
    let unassigned_shipment_ids = request.unassigned_shipment_ids(assigned);
    if !unassigned_shipment_ids.is_empty() {
        warn!(count = unassigned_shipment_ids.len(), "some shipments fit no vehicle");
    }

    let response = PlanningResponse {
        plans: results,
        unassigned_shipment_ids,
    };
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &response).context("writing planning response")?;
    writeln!(stdout)?;
    Ok(())
}

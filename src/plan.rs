use std::collections::BTreeMap;

use float_ord::FloatOrd;
use log::{debug, info};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{Result, TransportError},
    models::transportation_model::TransportationModel,
    problem::{ContainerType, Cost, Distance},
    solver::{RawSolution, SolverStatus},
};

/// A positive shipment in the solved plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentEntry {
    pub origin: String,
    pub destination: String,
    pub container_type: ContainerType,
    pub distance: Distance,
    /// Number of containers, always at least one
    pub quantity: u64,
    pub unit_cost: Cost,
    /// `quantity * unit_cost`
    pub cost: Cost,
    /// Total weight of the shipment in tons, if the container type has a weight
    pub weight_tons: Option<f64>,
}

/// The solved transportation plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentPlan {
    run_id: Uuid,
    entries: Vec<ShipmentEntry>,
    subtotals: BTreeMap<ContainerType, Cost>,
    weights: BTreeMap<ContainerType, f64>,
    total_cost: Cost,
}

impl ShipmentPlan {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Shipments with a positive quantity, in no particular order
    pub fn entries(&self) -> &[ShipmentEntry] {
        &self.entries
    }

    /// Entries ordered by cost, most expensive first
    pub fn sorted_entries(&self) -> Vec<&ShipmentEntry> {
        let mut entries = self.entries.iter().collect::<Vec<_>>();
        entries.sort_by_key(|e| std::cmp::Reverse(FloatOrd(e.cost)));
        entries
    }

    /// Cost per container type. Sums to `total_cost`.
    pub fn subtotals(&self) -> &BTreeMap<ContainerType, Cost> {
        &self.subtotals
    }

    /// Shipped weight in tons per container type, for the types that have a weight
    pub fn weights(&self) -> &BTreeMap<ContainerType, f64> {
        &self.weights
    }

    pub fn total_cost(&self) -> Cost {
        self.total_cost
    }

    /// Number of containers shipped in total
    pub fn total_units(&self) -> u64 {
        self.entries.iter().map(|e| e.quantity).sum()
    }
}

/// Turns the raw output of a solver into a plan. Only an optimal status produces a plan.
pub fn decode(model: &TransportationModel, solution: RawSolution) -> Result<ShipmentPlan> {
    match solution.status {
        SolverStatus::Optimal => (),
        SolverStatus::Infeasible => return Err(TransportError::Infeasible),
        SolverStatus::Unbounded => return Err(TransportError::Unbounded),
        SolverStatus::Error(message) => return Err(TransportError::SolverError(message)),
    }

    let mut entries = Vec::new();
    let mut subtotals: BTreeMap<ContainerType, Cost> = BTreeMap::new();
    let mut weights: BTreeMap<ContainerType, f64> = BTreeMap::new();

    for var in model.variables() {
        let raw = *solution.values.get(&var.key).ok_or_else(|| {
            TransportError::SolverError(format!(
                "no value for variable {}",
                model.variable_name(var)
            ))
        })?;
        // removes floating point residue such as 59.999999
        let rounded = raw.round();
        if !rounded.is_finite() || rounded < 0.0 {
            return Err(TransportError::SolverError(format!(
                "variable {} has invalid value {}",
                model.variable_name(var),
                raw
            )));
        }
        if rounded == 0.0 {
            continue;
        }

        let quantity = rounded as u64;
        let cost = rounded * var.unit_cost;
        let weight_tons = var.weight_tons.map(|w| rounded * w);
        let container_type = var.key.container_type;

        *subtotals.entry(container_type).or_default() += cost;
        if let Some(w) = weight_tons {
            *weights.entry(container_type).or_default() += w;
        }

        debug!("{} = {}", model.variable_name(var), quantity);
        entries.push(ShipmentEntry {
            origin: model.port(var.key.route.origin).name.clone(),
            destination: model.port(var.key.route.destination).name.clone(),
            container_type,
            distance: var.distance,
            quantity,
            unit_cost: var.unit_cost,
            cost,
            weight_tons,
        });
    }

    // the total is the sum of the subtotals, so the two always agree
    let total_cost = subtotals.values().sum();
    info!(
        "Decoded plan for {}: {} shipments, total cost {}",
        model.name(),
        entries.len(),
        total_cost
    );

    Ok(ShipmentPlan {
        run_id: model.run_id(),
        entries,
        subtotals,
        weights,
        total_cost,
    })
}

use std::collections::{BTreeMap, BTreeSet};

use derive_more::{Deref, From, Into};
use log::{debug, info};
use typed_index_collections::TiVec;
use uuid::Uuid;

use super::sets_and_parameters::{Parameters, Sets};
use crate::{
    catalog::RouteId,
    config::DemandRelation,
    error::{Result, TransportError},
    problem::{CapacityScope, ContainerType, Cost, Distance, Port, PortIndex, Problem, Quantity},
};

#[derive(Deref, Debug, PartialEq, Eq, PartialOrd, Ord, From, Into, Clone, Copy, Hash)]
pub struct VarIndex(usize);

/// Identifies a shipment variable: containers of one type on one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShipmentKey {
    pub route: RouteId,
    pub container_type: ContainerType,
}

impl ShipmentKey {
    pub fn new(route: RouteId, container_type: ContainerType) -> ShipmentKey {
        ShipmentKey {
            route,
            container_type,
        }
    }
}

/// A non-negative integer decision variable
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentVariable {
    pub key: ShipmentKey,
    pub distance: Distance,
    /// Objective coefficient. Also used when costing the decoded plan.
    pub unit_cost: Cost,
    pub weight_tons: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Supply,
    Demand,
}

/// `sum(terms) <sense> rhs`, where every term has coefficient one
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub port: PortIndex,
    pub scope: CapacityScope,
    pub terms: Vec<VarIndex>,
    pub sense: Sense,
    pub rhs: Quantity,
}

/// The integer program: minimize the sum of `unit_cost * x` over all variables, subject to the
/// supply and demand constraints.
#[derive(Debug, Clone)]
pub struct TransportationModel {
    run_id: Uuid,
    ports: TiVec<PortIndex, Port>,
    variables: TiVec<VarIndex, ShipmentVariable>,
    supply: Vec<Constraint>,
    demand: Vec<Constraint>,
}

impl TransportationModel {
    /// builds the transportation model
    pub fn build(problem: &Problem) -> Result<TransportationModel> {
        let run_id = Uuid::new_v4();
        info!("Building transportation model {}", run_id);

        let sets = Sets::new(problem);
        let parameters = Parameters::new(problem, &sets);
        TransportationModel::build_from(run_id, problem, &sets, &parameters)
    }

    #[allow(non_snake_case)]
    fn build_from(
        run_id: Uuid,
        problem: &Problem,
        sets: &Sets,
        parameters: &Parameters,
    ) -> Result<TransportationModel> {
        //*************CREATE VARIABLES*************//

        // one variable per active route and enabled container type
        let mut variables: TiVec<VarIndex, ShipmentVariable> = TiVec::new();
        for (r, k) in itertools::iproduct!(&sets.R, &sets.K) {
            let key = ShipmentKey::new(r.id, *k);
            variables.push(ShipmentVariable {
                key,
                distance: r.distance,
                unit_cost: parameters.C[&key],
                weight_tons: problem.schedule().tariff(*k).weight_tons,
            });
        }

        if variables.is_empty() {
            info!(
                "Transportation model {} has no variables ({} active routes, {} enabled types)",
                run_id,
                sets.R.len(),
                sets.K.len()
            );
            return Err(TransportError::EmptyModel);
        }

        // ******************** ADD CONSTRAINTS ********************

        // group the variables by the (port, scope) they count against
        let mut outgoing: BTreeMap<(PortIndex, CapacityScope), Vec<VarIndex>> = BTreeMap::new();
        let mut incoming: BTreeMap<(PortIndex, CapacityScope), Vec<VarIndex>> = BTreeMap::new();
        for (i, var) in variables.iter_enumerated() {
            let s = parameters.scope[&var.key.container_type];
            outgoing
                .entry((var.key.route.origin, s))
                .or_default()
                .push(i);
            incoming
                .entry((var.key.route.destination, s))
                .or_default()
                .push(i);
        }

        // never ship more than the origin has
        let supply = outgoing
            .into_iter()
            .map(|((o, s), terms)| Constraint {
                kind: ConstraintKind::Supply,
                port: o,
                scope: s,
                terms,
                sense: Sense::LessEqual,
                rhs: parameters.S[&(o, s)],
            })
            .collect::<Vec<_>>();

        // meet the demand of every destination
        let demand_sense = match problem.demand_relation() {
            DemandRelation::AtLeast => Sense::GreaterEqual,
            DemandRelation::Exact => Sense::Equal,
        };
        let demand = incoming
            .into_iter()
            .map(|((d, s), terms)| Constraint {
                kind: ConstraintKind::Demand,
                port: d,
                scope: s,
                terms,
                sense: demand_sense,
                rhs: parameters.Q[&(d, s)],
            })
            .collect::<Vec<_>>();

        let scopes = parameters.scope.values().copied().collect::<BTreeSet<_>>();
        for d in problem.ledger().demand_ports() {
            for s in &scopes {
                let unserved = !demand.iter().any(|c| c.port == d && c.scope == *s);
                if unserved && problem.ledger().demand(d, *s) > 0.0 {
                    debug!(
                        "No route reaches {} for {}, its demand is not constrained",
                        problem.catalog().port(d).name,
                        s
                    );
                }
            }
        }

        info!(
            "Successfully built transportation model {} with {} variables and {} constraints",
            run_id,
            variables.len(),
            supply.len() + demand.len()
        );

        Ok(TransportationModel {
            run_id,
            ports: problem.catalog().ports().clone(),
            variables,
            supply,
            demand,
        })
    }

    /// Compares total demand with total supply per capacity scope, so that an obviously
    /// infeasible model never reaches the solver.
    pub fn check_capacity(&self) -> Result<()> {
        let mut totals: BTreeMap<CapacityScope, (Quantity, Quantity)> = BTreeMap::new();
        for c in &self.supply {
            totals.entry(c.scope).or_default().1 += c.rhs;
        }
        for c in &self.demand {
            totals.entry(c.scope).or_default().0 += c.rhs;
        }

        for (scope, (demand, supply)) in totals {
            debug!("Capacity of {}: demand {}, supply {}", scope, demand, supply);
            if demand > supply {
                return Err(TransportError::CapacityExceeded {
                    scope,
                    demand,
                    supply,
                    shortfall: demand - supply,
                });
            }
        }

        Ok(())
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Name of the model, as handed to the solver
    pub fn name(&self) -> String {
        format!("transport_model_{}", self.run_id)
    }

    pub fn port(&self, index: PortIndex) -> &Port {
        &self.ports[index]
    }

    pub fn variables(&self) -> &TiVec<VarIndex, ShipmentVariable> {
        &self.variables
    }

    pub fn supply_constraints(&self) -> &[Constraint] {
        &self.supply
    }

    pub fn demand_constraints(&self) -> &[Constraint] {
        &self.demand
    }

    /// Supply constraints followed by demand constraints
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.supply.iter().chain(self.demand.iter())
    }

    pub fn variable_name(&self, var: &ShipmentVariable) -> String {
        format!(
            "x_{}_{}_{}",
            self.ports[var.key.route.origin].name,
            self.ports[var.key.route.destination].name,
            var.key.container_type
        )
        .replace(' ', "_")
    }

    pub fn constraint_name(&self, constraint: &Constraint) -> String {
        let kind = match constraint.kind {
            ConstraintKind::Supply => "supply",
            ConstraintKind::Demand => "demand",
        };
        format!("{}_{}_{}", kind, self.ports[constraint.port].name, constraint.scope)
            .replace(' ', "_")
    }
}

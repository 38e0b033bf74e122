pub mod catalog;
pub mod config;
pub mod cost;
pub mod error;
pub mod ledger;
pub mod models;
pub mod plan;
pub mod problem;
pub mod solver;

use log::info;

pub use config::{DemandRelation, TransportConfig};
pub use error::{Result, TransportError};
pub use models::TransportationModel;
pub use plan::{ShipmentEntry, ShipmentPlan};
pub use problem::{ContainerType, Problem};
pub use solver::{MicrolpSolver, RawSolution, SolverAdapter, SolverStatus};

/// Builds the model for `problem`, checks that the demand can be covered at all, solves it and
/// decodes the result. The solver is not called when the model is empty or short on supply.
pub fn solve<S: SolverAdapter + ?Sized>(problem: &Problem, solver: &mut S) -> Result<ShipmentPlan> {
    let model = TransportationModel::build(problem)?;
    model.check_capacity()?;

    info!("Solving {} with {}", model.name(), solver.name());
    let solution = solver.solve(&model)?;
    plan::decode(&model, solution)
}

/// Validates `config` and solves it
pub fn solve_config<S: SolverAdapter + ?Sized>(
    config: &TransportConfig,
    solver: &mut S,
) -> Result<ShipmentPlan> {
    let problem = Problem::new(config)?;
    solve(&problem, solver)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use crate::{
        config::RouteSpec,
        ledger::CapacityMode,
        problem::{CapacityScope, PortIndex, Quantity},
    };

    /// Counts how often it is asked to solve, and reports every model as infeasible
    #[derive(Default)]
    struct RecordingSolver {
        calls: usize,
    }

    impl SolverAdapter for RecordingSolver {
        fn name(&self) -> &str {
            "recording"
        }

        fn solve(&mut self, _model: &TransportationModel) -> Result<RawSolution> {
            self.calls += 1;
            Ok(RawSolution::failed(SolverStatus::Infeasible))
        }
    }

    fn twenty_foot_only() -> TransportConfig {
        let mut config = TransportConfig::nml_default();
        config.enabled_types = Some(vec![ContainerType::TwentyFoot]);
        config
    }

    fn port_index(problem: &Problem, name: &str) -> PortIndex {
        problem
            .catalog()
            .ports()
            .iter_enumerated()
            .find(|(_, port)| port.name == name)
            .map(|(i, _)| i)
            .unwrap()
    }

    fn shipped(plan: &ShipmentPlan, origin: &str, destination: &str) -> u64 {
        plan.entries()
            .iter()
            .filter(|e| e.origin == origin && e.destination == destination)
            .map(|e| e.quantity)
            .sum()
    }

    /// Units leaving (or arriving at) each port, per container type
    fn flows(plan: &ShipmentPlan, outgoing: bool) -> HashMap<(String, ContainerType), Quantity> {
        let mut flows = HashMap::new();
        for e in plan.entries() {
            let port = if outgoing { &e.origin } else { &e.destination };
            *flows.entry((port.clone(), e.container_type)).or_default() += e.quantity as f64;
        }
        flows
    }

    #[test]
    fn nml_network_ships_along_the_cheapest_routes() {
        let plan = solve_config(&twenty_foot_only(), &mut MicrolpSolver::new()).unwrap();

        // unit costs: Makassar->Priok 4.7M, Makassar->Perak 3.45M, Balikpapan->Priok 3.15M,
        // Balikpapan->Perak 2.2M. Balikpapan saves most on the Priok leg, so all 50 of its
        // containers go there and Makassar covers the rest.
        assert_eq!(shipped(&plan, "Balikpapan", "Tanjung Priok"), 50);
        assert_eq!(shipped(&plan, "Balikpapan", "Tanjung Perak"), 0);
        assert_eq!(shipped(&plan, "Makassar", "Tanjung Priok"), 10);
        assert_eq!(shipped(&plan, "Makassar", "Tanjung Perak"), 40);
        assert_eq!(plan.entries().len(), 3);

        let expected = 50.0 * 3_150_000.0 + 10.0 * 4_700_000.0 + 40.0 * 3_450_000.0;
        assert_eq!(plan.total_cost(), expected);
        assert_eq!(plan.total_cost(), 342_500_000.0);
        assert_eq!(plan.subtotals()[&ContainerType::TwentyFoot], expected);
        assert_eq!(plan.weights()[&ContainerType::TwentyFoot], 100.0 * 22.0);
    }

    #[test]
    fn unused_container_types_do_not_change_the_optimum() {
        let config = TransportConfig::nml_default();
        let plan = solve_config(&config, &mut MicrolpSolver::new()).unwrap();
        assert_eq!(plan.total_cost(), 342_500_000.0);
        assert!(plan
            .entries()
            .iter()
            .all(|e| e.container_type == ContainerType::TwentyFoot));
    }

    #[test]
    fn solved_plans_respect_supply_and_demand() {
        for relation in [DemandRelation::AtLeast, DemandRelation::Exact] {
            let mut config = TransportConfig::nml_default();
            config.demand_relation = relation;
            let problem = Problem::new(&config).unwrap();
            let plan = solve(&problem, &mut MicrolpSolver::new()).unwrap();

            let sum: f64 = plan.subtotals().values().sum();
            assert_eq!(sum, plan.total_cost());

            for ((port, t), out) in flows(&plan, true) {
                let index = port_index(&problem, &port);
                assert!(out <= problem.ledger().supply(index, CapacityScope::Type(t)));
            }

            let arrived = flows(&plan, false);
            for (name, entries) in &config.demand {
                for (scope, demand) in entries {
                    let t = match scope {
                        CapacityScope::Type(t) => *t,
                        CapacityScope::Pooled => unreachable!(),
                    };
                    let got = arrived.get(&(name.clone(), t)).copied().unwrap_or(0.0);
                    match relation {
                        DemandRelation::AtLeast => assert!(got >= *demand),
                        DemandRelation::Exact => assert_eq!(got, *demand),
                    }
                }
            }
        }
    }

    #[test]
    fn pooled_capacity_is_shared_by_all_types() {
        let mut config = TransportConfig::nml_default();
        config.capacity_mode = CapacityMode::Pooled;
        for entries in config.supply.values_mut().chain(config.demand.values_mut()) {
            let total: f64 = entries.values().sum();
            *entries = BTreeMap::from([(CapacityScope::Pooled, total)]);
        }

        // both types cost the same, so the split between them is arbitrary but the cost is not
        let plan = solve_config(&config, &mut MicrolpSolver::new()).unwrap();
        assert_eq!(plan.total_cost(), 342_500_000.0);
        assert_eq!(shipped(&plan, "Balikpapan", "Tanjung Priok"), 50);
        assert_eq!(plan.total_units(), 100);
    }

    #[test]
    fn routes_without_a_distance_use_the_fallback() {
        let mut config = twenty_foot_only();
        config.routes = Some(vec![
            RouteSpec::new("Makassar", "Tanjung Priok"),
            RouteSpec::new("Balikpapan", "Tanjung Priok"),
            RouteSpec::new("Makassar", "Tanjung Perak"),
            RouteSpec::new("Balikpapan", "Tanjung Perak"),
        ]);
        config.distances.retain(|d| d.origin != "Balikpapan");
        config.fallback_distance = 5000.0;

        // Balikpapan is now the most expensive origin, so Makassar ships everything it can
        let plan = solve_config(&config, &mut MicrolpSolver::new()).unwrap();
        assert_eq!(shipped(&plan, "Makassar", "Tanjung Perak"), 40);
        assert_eq!(shipped(&plan, "Makassar", "Tanjung Priok"), 30);
        assert_eq!(shipped(&plan, "Balikpapan", "Tanjung Priok"), 30);
        assert_eq!(plan.total_units(), 100);
        let fallback = plan
            .entries()
            .iter()
            .find(|e| e.origin == "Balikpapan")
            .unwrap();
        assert_eq!(fallback.distance, 5000.0);
        assert_eq!(fallback.unit_cost, 5000.0 * 2500.0 + 1_200_000.0);
    }

    #[test]
    fn shortfall_is_reported_before_solving() {
        let mut config = twenty_foot_only();
        config.demand.insert(
            "Tanjung Perak".to_string(),
            BTreeMap::from([(CapacityScope::Type(ContainerType::TwentyFoot), 75.0)]),
        );
        let mut solver = RecordingSolver::default();

        match solve_config(&config, &mut solver) {
            Err(TransportError::CapacityExceeded {
                scope, shortfall, ..
            }) => {
                assert_eq!(scope, CapacityScope::Type(ContainerType::TwentyFoot));
                assert_eq!(shortfall, 15.0);
            }
            other => panic!("expected capacity exceeded, got {:?}", other),
        }
        assert_eq!(solver.calls, 0);
    }

    #[test]
    fn pooled_shortfall_is_reported_across_all_types() {
        let mut config = TransportConfig::nml_default();
        config.capacity_mode = CapacityMode::Pooled;
        for entries in config.supply.values_mut() {
            let total: f64 = entries.values().sum();
            *entries = BTreeMap::from([(CapacityScope::Pooled, total)]);
        }
        for entries in config.demand.values_mut() {
            let total: f64 = entries.values().sum();
            *entries = BTreeMap::from([(CapacityScope::Pooled, total + 20.0)]);
        }
        let mut solver = RecordingSolver::default();

        match solve_config(&config, &mut solver) {
            Err(TransportError::CapacityExceeded {
                scope,
                demand,
                supply,
                shortfall,
            }) => {
                assert_eq!(scope, CapacityScope::Pooled);
                assert_eq!(demand, 140.0);
                assert_eq!(supply, 120.0);
                assert_eq!(shortfall, 20.0);
            }
            other => panic!("expected capacity exceeded, got {:?}", other),
        }
        assert_eq!(solver.calls, 0);
    }

    #[test]
    fn inactive_routes_give_an_empty_model_without_solving() {
        let mut config = twenty_foot_only();
        config.routes = Some(
            [
                ("Makassar", "Tanjung Priok"),
                ("Makassar", "Tanjung Perak"),
                ("Balikpapan", "Tanjung Priok"),
                ("Balikpapan", "Tanjung Perak"),
            ]
            .into_iter()
            .map(|(o, d)| RouteSpec::new(o, d).inactive())
            .collect(),
        );
        let mut solver = RecordingSolver::default();

        assert!(matches!(
            solve_config(&config, &mut solver),
            Err(TransportError::EmptyModel)
        ));
        assert_eq!(solver.calls, 0);
    }

    #[test]
    fn solver_failures_surface_as_errors() {
        let mut solver = RecordingSolver::default();
        assert!(matches!(
            solve_config(&twenty_foot_only(), &mut solver),
            Err(TransportError::Infeasible)
        ));
        assert_eq!(solver.calls, 1);
    }

    #[test]
    fn boxed_solvers_can_be_used() {
        let mut solver: Box<dyn SolverAdapter> = Box::new(MicrolpSolver::new());
        let plan = solve_config(&twenty_foot_only(), &mut solver).unwrap();
        assert_eq!(plan.total_cost(), 342_500_000.0);
    }
}

use std::collections::HashMap;

use itertools::iproduct;
use log::trace;

use crate::{
    catalog::Route,
    ledger::CapacityMode,
    problem::{CapacityScope, ContainerType, Cost, PortIndex, Problem, Quantity},
};

use super::model::ShipmentKey;

/// sets for the transportation model
#[derive(Debug)]
#[allow(non_snake_case)]
pub struct Sets {
    /// Active routes passing the origin and destination filters
    pub R: Vec<Route>,
    /// Enabled container types
    pub K: Vec<ContainerType>,
    /// Origins of the routes in R, sorted
    pub O: Vec<PortIndex>,
    /// Destinations of the routes in R, sorted
    pub D: Vec<PortIndex>,
}

/// parameters for the transportation model
#[allow(non_snake_case)]
pub struct Parameters {
    /// Capacity scope that container type k counts against
    pub scope: HashMap<ContainerType, CapacityScope>,
    /// Cost of shipping one container of type k on route r
    pub C: HashMap<ShipmentKey, Cost>,
    /// Supply ceiling of origin o in scope s
    pub S: HashMap<(PortIndex, CapacityScope), Quantity>,
    /// Demand requirement of destination d in scope s
    pub Q: HashMap<(PortIndex, CapacityScope), Quantity>,
}

#[allow(non_snake_case)]
impl Sets {
    pub fn new(problem: &Problem) -> Sets {
        let R: Vec<Route> = problem
            .catalog()
            .routes(problem.origin_filter(), problem.destination_filter())
            .into_iter()
            .cloned()
            .collect();

        let mut O: Vec<PortIndex> = R.iter().map(|r| r.origin()).collect();
        O.sort();
        O.dedup();
        let mut D: Vec<PortIndex> = R.iter().map(|r| r.destination()).collect();
        D.sort();
        D.dedup();

        trace!(
            "Sets: {} routes, {} origins, {} destinations",
            R.len(),
            O.len(),
            D.len()
        );

        Sets {
            R,
            K: problem.enabled_types().to_vec(),
            O,
            D,
        }
    }
}

#[allow(non_snake_case)]
impl Parameters {
    pub fn new(problem: &Problem, sets: &Sets) -> Parameters {
        let mode: CapacityMode = problem.ledger().mode();
        let scope = sets.K.iter().map(|k| (*k, mode.scope_of(*k))).collect();

        // every unit cost is evaluated exactly once, here
        let C = iproduct!(&sets.R, &sets.K)
            .map(|(r, k)| {
                let key = ShipmentKey::new(r.id, *k);
                (key, problem.schedule().unit_cost(*k, r.distance))
            })
            .collect();

        let S = iproduct!(&sets.O, &sets.K)
            .map(|(o, k)| {
                let s = mode.scope_of(*k);
                ((*o, s), problem.ledger().supply(*o, s))
            })
            .collect();

        let Q = iproduct!(&sets.D, &sets.K)
            .map(|(d, k)| {
                let s = mode.scope_of(*k);
                ((*d, s), problem.ledger().demand(*d, s))
            })
            .collect();

        Parameters { scope, C, S, Q }
    }
}

#[cfg(feature = "gurobi")]
pub mod gurobi;
pub mod microlp;

use std::collections::HashMap;

use typed_index_collections::TiVec;

use crate::{
    error::Result,
    models::transportation_model::{ShipmentKey, TransportationModel, VarIndex},
};

#[cfg(feature = "gurobi")]
pub use gurobi::GurobiSolver;
pub use microlp::MicrolpSolver;

/// Outcome of a solve as reported by the solver
#[derive(Debug, Clone, PartialEq)]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error(String),
}

/// What the solver hands back: a status and, for an optimal solve, the value of every variable.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    pub status: SolverStatus,
    pub values: HashMap<ShipmentKey, f64>,
}

impl RawSolution {
    pub fn optimal(values: HashMap<ShipmentKey, f64>) -> RawSolution {
        RawSolution {
            status: SolverStatus::Optimal,
            values,
        }
    }

    /// A solve that ended without a solution
    pub fn failed(status: SolverStatus) -> RawSolution {
        RawSolution {
            status,
            values: HashMap::new(),
        }
    }
}

/// An integer programming solver that can minimize a `TransportationModel`.
///
/// Solving blocks until the solver returns. Any optimal solution is acceptable; the decoder does
/// not depend on which of several equally good solutions is returned.
pub trait SolverAdapter {
    /// Short name used in log messages
    fn name(&self) -> &str;

    fn solve(&mut self, model: &TransportationModel) -> Result<RawSolution>;
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&mut self, model: &TransportationModel) -> Result<RawSolution> {
        (**self).solve(model)
    }
}

/// Reads the solved value of every backend variable, keyed by the shipment it represents
pub(crate) fn convert_vars<V>(
    model: &TransportationModel,
    vars: &TiVec<VarIndex, V>,
    mut value: impl FnMut(&V) -> Result<f64>,
) -> Result<HashMap<ShipmentKey, f64>> {
    let mut out = HashMap::with_capacity(vars.len());
    for (i, var) in vars.iter_enumerated() {
        out.insert(model.variables()[i].key, value(var)?);
    }
    Ok(out)
}

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};

use good_lp::{
    constraint, solvers::microlp::microlp, variable, variables, Expression, ResolutionError,
    Solution, SolverModel, Variable,
};
use log::{debug, trace};
use typed_index_collections::TiVec;

use super::{convert_vars, RawSolution, SolverAdapter, SolverStatus};
use crate::{
    error::{Result, TransportError},
    models::transportation_model::{Sense, TransportationModel, VarIndex},
};

/// Pure Rust branch-and-bound solver, through `good_lp`.
#[derive(Debug, Clone, Default)]
pub struct MicrolpSolver {
    time_limit: Option<Duration>,
}

impl MicrolpSolver {
    pub fn new() -> MicrolpSolver {
        MicrolpSolver::default()
    }

    /// Gives up with a solver error when no result arrives within `limit`. The abandoned solve
    /// keeps running on its own thread until it finishes, and its result is discarded.
    pub fn with_time_limit(mut self, limit: Duration) -> MicrolpSolver {
        self.time_limit = Some(limit);
        self
    }

    fn run(model: &TransportationModel) -> Result<RawSolution> {
        trace!("Handing {} to microlp", model.name());

        let mut vars = variables!();
        let x: TiVec<VarIndex, Variable> = model
            .variables()
            .iter()
            .map(|v| vars.add(variable().integer().min(0).name(model.variable_name(v))))
            .collect();

        let objective = model
            .variables()
            .iter_enumerated()
            .fold(Expression::from(0.0), |acc, (i, v)| acc + v.unit_cost * x[i]);

        let mut problem = vars.minimise(objective).using(microlp);
        for c in model.constraints() {
            let lhs = c
                .terms
                .iter()
                .fold(Expression::from(0.0), |acc, &i| acc + x[i]);
            let rhs = c.rhs;
            problem = problem.with(match c.sense {
                Sense::LessEqual => constraint!(lhs <= rhs),
                Sense::GreaterEqual => constraint!(lhs >= rhs),
                Sense::Equal => constraint!(lhs == rhs),
            });
        }

        match problem.solve() {
            Ok(solution) => {
                let values = convert_vars(model, &x, |var| Ok(solution.value(*var)))?;
                Ok(RawSolution::optimal(values))
            }
            Err(ResolutionError::Infeasible) => Ok(RawSolution::failed(SolverStatus::Infeasible)),
            Err(ResolutionError::Unbounded) => Ok(RawSolution::failed(SolverStatus::Unbounded)),
            Err(other) => Ok(RawSolution::failed(SolverStatus::Error(other.to_string()))),
        }
    }
}

impl SolverAdapter for MicrolpSolver {
    fn name(&self) -> &str {
        "microlp"
    }

    fn solve(&mut self, model: &TransportationModel) -> Result<RawSolution> {
        let limit = match self.time_limit {
            Some(limit) => limit,
            None => return MicrolpSolver::run(model),
        };

        let (tx, rx) = mpsc::channel();
        let owned = model.clone();
        thread::Builder::new()
            .name(format!("microlp-{}", model.run_id()))
            .spawn(move || {
                // the receiver is gone if the caller already timed out
                let _ = tx.send(MicrolpSolver::run(&owned));
            })
            .map_err(|err| TransportError::SolverError(format!("could not start solver: {}", err)))?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                debug!("{} did not finish within {:?}", model.name(), limit);
                Err(TransportError::SolverError(format!(
                    "no solution within the time limit of {:?}",
                    limit
                )))
            }
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::SolverError(
                "solver thread ended without a result".to_string(),
            )),
        }
    }
}

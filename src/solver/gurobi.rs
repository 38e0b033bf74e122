use std::time::Duration;

use grb::prelude::*;
use log::{info, trace};
use typed_index_collections::TiVec;

use super::{convert_vars, RawSolution, SolverAdapter, SolverStatus};
use crate::{
    error::Result,
    models::transportation_model::{Sense, TransportationModel, VarIndex},
};

/// Gurobi, through the `grb` bindings. Needs a Gurobi installation and licence at runtime.
#[derive(Debug, Clone, Default)]
pub struct GurobiSolver {
    time_limit: Option<Duration>,
}

impl GurobiSolver {
    pub fn new() -> GurobiSolver {
        GurobiSolver::default()
    }

    /// Stops the search after `limit`; a solve that hits the limit is a solver error
    pub fn with_time_limit(mut self, limit: Duration) -> GurobiSolver {
        self.time_limit = Some(limit);
        self
    }

    fn build(&self, transport: &TransportationModel) -> grb::Result<(Model, TiVec<VarIndex, Var>)> {
        let mut model = Model::new(&transport.name())?;
        model.set_param(param::OutputFlag, 0)?;
        if let Some(limit) = self.time_limit {
            model.set_param(param::TimeLimit, limit.as_secs_f64())?;
        }

        //*************CREATE VARIABLES*************//
        let mut x: TiVec<VarIndex, Var> = TiVec::with_capacity(transport.variables().len());
        for v in transport.variables() {
            x.push(model.add_var(
                &transport.variable_name(v),
                VarType::Integer,
                0.0,
                0.0,
                f64::INFINITY,
                std::iter::empty(),
            )?);
        }

        // make the variables visible to the constraints
        model.update()?;

        // ******************** ADD CONSTRAINTS ********************
        for constraint in transport.constraints() {
            let lhs = constraint.terms.iter().map(|i| x[*i]).grb_sum();
            let rhs = constraint.rhs;
            let name = transport.constraint_name(constraint);
            match constraint.sense {
                Sense::LessEqual => model.add_constr(&name, c!(lhs <= rhs))?,
                Sense::GreaterEqual => model.add_constr(&name, c!(lhs >= rhs))?,
                Sense::Equal => model.add_constr(&name, c!(lhs == rhs))?,
            };
        }

        let cost = transport
            .variables()
            .iter_enumerated()
            .map(|(i, v)| v.unit_cost * x[i])
            .grb_sum();
        model.set_objective(cost, Minimize)?;

        model.update()?;

        Ok((model, x))
    }
}

impl SolverAdapter for GurobiSolver {
    fn name(&self) -> &str {
        "gurobi"
    }

    fn solve(&mut self, transport: &TransportationModel) -> Result<RawSolution> {
        let (mut model, x) = self.build(transport)?;
        trace!("Optimizing {}", transport.name());
        model.optimize()?;

        let status = model.status()?;
        info!("Gurobi finished {} with status {:?}", transport.name(), status);
        let status = match status {
            Status::Optimal => SolverStatus::Optimal,
            // all costs are non-negative, so the model can not be unbounded
            Status::Infeasible | Status::InfOrUnbd => SolverStatus::Infeasible,
            Status::Unbounded => SolverStatus::Unbounded,
            Status::TimeLimit => SolverStatus::Error("time limit reached".to_string()),
            other => SolverStatus::Error(format!("gurobi stopped with status {:?}", other)),
        };
        if status != SolverStatus::Optimal {
            return Ok(RawSolution::failed(status));
        }

        let values = convert_vars(transport, &x, |var| Ok(model.get_obj_attr(attr::X, var)?))?;
        Ok(RawSolution::optimal(values))
    }
}

use derive_more::Display;

use crate::problem::{CapacityScope, Quantity};

pub type Result<T> = std::result::Result<T, TransportError>;

/// Everything that can end a solve. None of these are retried.
#[derive(Debug, Display)]
pub enum TransportError {
    /// Bad input data, detected before anything is built or solved
    #[display(fmt = "invalid configuration at `{}`: {}", field, reason)]
    InvalidConfiguration { field: String, reason: String },
    /// No shipment variable survived the route and container type filters
    #[display(fmt = "no active route carries an enabled container type, nothing to optimize")]
    EmptyModel,
    /// Total demand for `scope` is larger than the total supply for it
    #[display(
        fmt = "demand for {} containers ({}) exceeds supply ({}) by {}",
        scope,
        demand,
        supply,
        shortfall
    )]
    CapacityExceeded {
        scope: CapacityScope,
        demand: Quantity,
        supply: Quantity,
        shortfall: Quantity,
    },
    #[display(fmt = "the solver reported the model as infeasible")]
    Infeasible,
    #[display(fmt = "the solver reported the model as unbounded")]
    Unbounded,
    #[display(fmt = "solver error: {}", _0)]
    SolverError(String),
    #[display(fmt = "could not read configuration: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "could not parse configuration: {}", _0)]
    Json(serde_json::Error),
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Json(err)
    }
}

impl TransportError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TransportError::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "gurobi")]
impl From<grb::Error> for TransportError {
    fn from(err: grb::Error) -> Self {
        TransportError::SolverError(format!("{:?}", err))
    }
}

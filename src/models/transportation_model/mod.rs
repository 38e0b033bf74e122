pub mod model;
pub mod sets_and_parameters;

pub use model::{
    Constraint, ConstraintKind, Sense, ShipmentKey, ShipmentVariable, TransportationModel,
    VarIndex,
};

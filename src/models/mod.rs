pub mod transportation_model;

pub use transportation_model::TransportationModel;

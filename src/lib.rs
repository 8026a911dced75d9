//! Fitting of compartmental degradation kinetics to concentration-time data.
//!
//! A model is declared compartment by compartment ([`model::ModelSpec`]),
//! compiled into a [`model::DegradationModel`], solved by one of the
//! trajectory strategies in [`simulator`], and fitted to a [`data::Dataset`]
//! by constrained maximum likelihood ([`fit::Fitter`]).

pub mod data;
pub mod error;
pub mod fit;
pub mod logger;
pub mod model;
pub mod settings;
pub mod simulator;
pub mod transform;

pub mod prelude {
    pub use crate::data::{Dataset, Observation};
    pub use crate::error::KinError;
    pub use crate::fit::{fit, ErrorModel, FitResult, Fitter};
    pub use crate::logger::setup_log;
    pub use crate::model::{
        submodel::SubmodelType, CompartmentSpec, DegradationModel, ModelSpec, UseOfFractions,
    };
    pub use crate::settings::{FitSettings, VarianceFitting};
    pub use crate::simulator::{predict, Output, Strategy, Tolerances, Trajectory};
    pub use crate::transform::Transformations;
}

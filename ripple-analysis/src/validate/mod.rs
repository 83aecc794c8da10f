//! Statistical validation of fitted models — seeded cross-validation and
//! bootstrap confidence intervals.

pub mod bootstrap;
pub mod cross_validation;
pub mod types;

pub use cross_validation::Validator;
pub use types::{NodeScore, ValidationResult};

//! Error handling for Ripple.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod causal_error;
pub mod config_error;
pub mod error_code;
pub mod extraction_error;
pub mod fitting_error;
pub mod intervention_error;
pub mod persist_error;
pub mod validation_error;

pub use causal_error::CausalError;
pub use config_error::ConfigError;
pub use error_code::RippleErrorCode;
pub use extraction_error::ExtractionError;
pub use fitting_error::FittingError;
pub use intervention_error::InterventionError;
pub use persist_error::PersistError;
pub use validation_error::{ThresholdError, ValidationError};

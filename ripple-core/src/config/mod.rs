//! Configuration system for Ripple.
//! TOML-based, 3-layer resolution: env > project > defaults.

pub mod enhance_config;
pub mod extraction_config;
pub mod fitting_config;
pub mod ripple_config;
pub mod validation_config;

pub use enhance_config::EnhanceConfig;
pub use extraction_config::ExtractionConfig;
pub use fitting_config::{FitMode, FittingConfig};
pub use ripple_config::RippleConfig;
pub use validation_config::ValidationConfig;

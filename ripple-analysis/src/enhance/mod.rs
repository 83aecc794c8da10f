//! Enhancement orchestration — one call that runs extraction, fitting, and
//! validation under a no-block degradation policy, plus the read-only
//! enhanced-IR façade consumers work with.

pub mod breaker;
pub mod enhanced;
pub mod orchestrator;

pub use breaker::{BreakerState, CircuitBreaker};
pub use enhanced::EnhancedIR;
pub use orchestrator::{CausalEnhancer, Enhancement};

//! Mechanism fitting — per-node generating functions, the out-of-process
//! fitting boundary, and the persisted form.

pub mod boundary;
pub mod fitter;
pub mod ols;
pub mod persist;
pub mod types;

pub use boundary::{
    FitDiagnostics, FitRequest, FitRequestConfig, FitResponse, FittingBoundary,
    NativeBoundary, ProcessBoundary, PROTOCOL_VERSION,
};
pub use fitter::MechanismFitter;
pub use persist::{from_blob, summarize, to_blob, CausalSummary};
pub use types::{FitOrigin, Mechanism, MechanismKind};

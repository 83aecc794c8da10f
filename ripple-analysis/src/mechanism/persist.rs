//! Persisted model forms.
//!
//! Two formats: an opaque binary blob that reloads a numerically identical
//! model, and a lossy display-safe summary (graph, mechanism types, R²
//! scores) that deliberately cannot reconstruct a usable model.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ripple_core::errors::PersistError;
use ripple_core::types::collections::FxHashMap;

use crate::graph::{CausalGraph, GraphDoc};
use crate::mechanism::types::{FitOrigin, Mechanism};
use crate::scm::StructuralCausalModel;
use crate::validate::ValidationResult;

const BLOB_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ModelBlob {
    version: u32,
    graph: GraphDoc,
    mechanisms: BTreeMap<String, Mechanism>,
    origin: FitOrigin,
}

/// Serialize a model to an opaque blob for exact reload.
pub fn to_blob(scm: &StructuralCausalModel) -> Result<Vec<u8>, PersistError> {
    let blob = ModelBlob {
        version: BLOB_VERSION,
        graph: scm.graph().to_doc(),
        mechanisms: scm
            .mechanisms()
            .map(|(id, m)| (id.to_string(), m.clone()))
            .collect(),
        origin: scm.origin(),
    };
    bincode::serialize(&blob).map_err(|e| PersistError::Encode {
        message: e.to_string(),
    })
}

/// Reload a model from a blob produced by [`to_blob`].
pub fn from_blob(bytes: &[u8]) -> Result<StructuralCausalModel, PersistError> {
    let blob: ModelBlob = bincode::deserialize(bytes).map_err(|e| PersistError::Decode {
        message: e.to_string(),
    })?;
    if blob.version != BLOB_VERSION {
        return Err(PersistError::UnsupportedVersion {
            version: blob.version,
        });
    }

    let graph = Arc::new(CausalGraph::from_doc(&blob.graph));
    let mut mechanisms = FxHashMap::default();
    for (id, mechanism) in blob.mechanisms {
        mechanisms.insert(id, mechanism);
    }
    Ok(StructuralCausalModel::new(graph, mechanisms, blob.origin))
}

/// Lossy display-safe model summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalSummary {
    pub graph: GraphDoc,
    /// Mechanism type label per node.
    pub mechanism_types: BTreeMap<String, String>,
    pub origin: FitOrigin,
    /// Per-node cross-validated R², when validation ran.
    pub r2_scores: Option<BTreeMap<String, f64>>,
    pub aggregate_r2: Option<f64>,
}

/// Build the lossy summary. Numeric parameters are intentionally absent.
pub fn summarize(
    scm: &StructuralCausalModel,
    validation: Option<&ValidationResult>,
) -> CausalSummary {
    CausalSummary {
        graph: scm.graph().to_doc(),
        mechanism_types: scm
            .mechanisms()
            .map(|(id, m)| (id.to_string(), m.type_name().to_string()))
            .collect(),
        origin: scm.origin(),
        r2_scores: validation.map(|v| {
            v.node_scores
                .iter()
                .map(|s| (s.node.clone(), s.r2))
                .collect()
        }),
        aggregate_r2: validation.map(|v| v.aggregate_r2),
    }
}

//! Graph-extraction configuration, including the edge-pruning policy.

use serde::{Deserialize, Serialize};

/// Configuration for the graph extraction subsystem.
///
/// The pruning policy decides which writes count as causal state and which
/// are incidental side channels. The heuristic is deliberately configurable:
/// what counts as "incidental" is domain-specific.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Prune diagnostic-sink writes with no downstream use. Default: true.
    pub prune_emit_sinks: Option<bool>,
    /// Treat persisted-state writes as causal even when nothing reads them
    /// downstream. Default: true.
    pub keep_persist_sinks: Option<bool>,
    /// Node ids exempt from pruning regardless of classification.
    #[serde(default)]
    pub never_prune: Vec<String>,
}

impl ExtractionConfig {
    /// Returns the effective emit-sink pruning flag, defaulting to true.
    pub fn effective_prune_emit_sinks(&self) -> bool {
        self.prune_emit_sinks.unwrap_or(true)
    }

    /// Returns the effective persist-sink retention flag, defaulting to true.
    pub fn effective_keep_persist_sinks(&self) -> bool {
        self.keep_persist_sinks.unwrap_or(true)
    }
}

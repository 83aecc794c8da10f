//! Monte-Carlo intervention simulation over a fitted model.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use statrs::distribution::Normal;

use ripple_core::errors::InterventionError;
use ripple_core::types::collections::FxHashMap;

use crate::intervention::paths;
use crate::intervention::types::{
    InterventionKind, InterventionResult, InterventionSpec, NodeEstimate,
};
use crate::mechanism::{Mechanism, MechanismKind};
use crate::scm::StructuralCausalModel;
use crate::stats::{mean, percentile_interval, variance};

/// Resamples used for the bootstrap interval of each queried mean.
const MEAN_BOOTSTRAP_RESAMPLES: usize = 200;
const MEAN_BOOTSTRAP_LEVEL: f64 = 0.95;

/// Simulates interventions over one fitted model.
#[derive(Debug, Clone)]
pub struct InterventionEngine {
    scm: Arc<StructuralCausalModel>,
    seed: u64,
}

impl InterventionEngine {
    pub fn new(scm: Arc<StructuralCausalModel>) -> Self {
        Self { scm, seed: 42 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn model(&self) -> &StructuralCausalModel {
        &self.scm
    }

    /// Simulate `intervention` and summarize each queried node's
    /// distribution over `n_samples` forward passes.
    pub fn estimate_impact(
        &self,
        intervention: &InterventionSpec,
        query_nodes: &[&str],
        n_samples: usize,
    ) -> Result<InterventionResult, InterventionError> {
        if !self.scm.is_dynamic() {
            return Err(InterventionError::Capability);
        }
        if n_samples == 0 {
            return Err(InterventionError::NoSamples { n_samples });
        }
        let graph = self.scm.graph();
        if graph.node_index(&intervention.node_id).is_none() {
            return Err(InterventionError::UnknownNode {
                node: intervention.node_id.clone(),
            });
        }
        for node in query_nodes {
            if graph.node_index(node).is_none() {
                return Err(InterventionError::UnknownNode {
                    node: node.to_string(),
                });
            }
        }

        // Simulation plan in topological order; the graph is a DAG by
        // construction so this cannot fail after the checks above.
        let order = graph
            .topological_order()
            .expect("fitted models hold acyclic graphs");
        let plan: Vec<(String, &Mechanism, Option<Normal>)> = order
            .into_iter()
            .filter_map(|id| {
                let mechanism = self.scm.mechanism(&id)?;
                let noise = match mechanism.noise_std() {
                    std if std > 0.0 => Normal::new(0.0, std).ok(),
                    _ => None,
                };
                Some((id, mechanism, noise))
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut draws: BTreeMap<String, Vec<f64>> = query_nodes
            .iter()
            .map(|n| (n.to_string(), Vec::with_capacity(n_samples)))
            .collect();

        let mut values: FxHashMap<&str, f64> = FxHashMap::default();
        for _ in 0..n_samples {
            values.clear();
            for (id, mechanism, noise) in &plan {
                let value = if *id == intervention.node_id {
                    match intervention.kind {
                        InterventionKind::Hard(pinned) => pinned,
                        InterventionKind::Soft(transform) => {
                            transform.apply(natural_value(mechanism, noise, &values, &mut rng))
                        }
                    }
                } else {
                    natural_value(mechanism, noise, &values, &mut rng)
                };
                values.insert(id.as_str(), value);
            }
            for (node, samples) in draws.iter_mut() {
                if let Some(&v) = values.get(node.as_str()) {
                    samples.push(v);
                }
            }
        }

        let mut interval_rng = StdRng::seed_from_u64(self.seed.rotate_left(17) ^ 0x5EED);
        let estimates = draws
            .into_iter()
            .map(|(node, samples)| {
                let estimate = NodeEstimate {
                    mean: mean(&samples),
                    variance: variance(&samples),
                    interval: bootstrap_mean_interval(&samples, &mut interval_rng),
                };
                (node, estimate)
            })
            .collect();

        Ok(InterventionResult {
            estimates,
            n_samples,
        })
    }

    /// Simple directed paths from `source` to `target`, available in
    /// static mode too.
    pub fn causal_paths(
        &self,
        source: &str,
        target: &str,
        max_paths: usize,
    ) -> Vec<Vec<String>> {
        paths::causal_paths(self.scm.graph(), source, target, max_paths)
    }
}

/// One forward draw of a node's value from its mechanism.
fn natural_value(
    mechanism: &Mechanism,
    noise: &Option<Normal>,
    values: &FxHashMap<&str, f64>,
    rng: &mut StdRng,
) -> f64 {
    match &mechanism.kind {
        MechanismKind::Empirical { samples } => {
            if samples.is_empty() {
                0.0
            } else {
                samples[rng.gen_range(0..samples.len())]
            }
        }
        MechanismKind::Linear { .. } | MechanismKind::Nonlinear { .. } => {
            let parent_values: Vec<f64> = mechanism
                .parents()
                .iter()
                .map(|p| values.get(p.as_str()).copied().unwrap_or(0.0))
                .collect();
            let base = mechanism.predict(&parent_values).unwrap_or(0.0);
            match noise {
                Some(dist) => base + dist.sample(rng),
                None => base,
            }
        }
        MechanismKind::Structural { .. } => 0.0,
    }
}

/// Percentile bootstrap of the sample mean.
fn bootstrap_mean_interval(samples: &[f64], rng: &mut StdRng) -> crate::stats::ConfidenceInterval {
    if samples.is_empty() {
        return percentile_interval(&[], MEAN_BOOTSTRAP_LEVEL);
    }
    let means: Vec<f64> = (0..MEAN_BOOTSTRAP_RESAMPLES)
        .map(|_| {
            let total: f64 = (0..samples.len())
                .map(|_| samples[rng.gen_range(0..samples.len())])
                .sum();
            total / samples.len() as f64
        })
        .collect();
    percentile_interval(&means, MEAN_BOOTSTRAP_LEVEL)
}

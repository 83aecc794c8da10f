//! Sampled-execution trace table.
//!
//! Columns are node ids, rows are independent executions. Supplied by the
//! external instrumentation component; the engine only ever borrows a table
//! for the duration of a fit or validation call and never persists one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Column-major table of per-node observed values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceTable {
    columns: BTreeMap<String, Vec<f64>>,
    rows: usize,
}

impl TraceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column of observations for one node.
    ///
    /// All columns must have the same length; a mismatched column is
    /// truncated or right-padded with NaN so row counts stay consistent.
    pub fn insert_column(&mut self, node_id: &str, mut values: Vec<f64>) {
        if self.columns.is_empty() {
            self.rows = values.len();
        } else {
            values.resize(self.rows, f64::NAN);
        }
        self.columns.insert(node_id.to_string(), values);
    }

    /// Build a table from `(node id, values)` pairs.
    pub fn from_columns<I, S>(cols: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (id, values) in cols {
            table.insert_column(id.as_ref(), values);
        }
        table
    }

    pub fn column(&self, node_id: &str) -> Option<&[f64]> {
        self.columns.get(node_id).map(|v| v.as_slice())
    }

    pub fn has_column(&self, node_id: &str) -> bool {
        self.columns.contains_key(node_id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    /// Number of independent executions recorded.
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns.is_empty()
    }

    /// Row indices where every listed column holds a finite value.
    pub fn finite_rows(&self, node_ids: &[&str]) -> Vec<usize> {
        (0..self.rows)
            .filter(|&row| {
                node_ids.iter().all(|id| {
                    self.columns
                        .get(*id)
                        .map(|col| col[row].is_finite())
                        .unwrap_or(false)
                })
            })
            .collect()
    }

    /// A new table containing the given rows; duplicates allowed (used by
    /// bootstrap resampling).
    pub fn select_rows(&self, rows: &[usize]) -> TraceTable {
        let columns = self
            .columns
            .iter()
            .map(|(id, col)| {
                let values = rows.iter().map(|&r| col[r]).collect();
                (id.clone(), values)
            })
            .collect();
        TraceTable {
            columns,
            rows: rows.len(),
        }
    }

    /// Borrow the underlying column map (for boundary request documents).
    pub fn columns(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.columns
    }
}

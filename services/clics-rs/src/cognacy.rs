//! Cognate-aware edge weighting.
//!
//! An edge backed by one word form repeated across many related languages
//! is weaker evidence than the same volume of unrelated forms. Each edge's
//! backing tokens are clustered into probable cognate sets and the number
//! of sets becomes the edge's `cognate_count`.

use clics_phonetic::{distance_matrix_with, phonetic_distance, segments};
use rayon::prelude::*;
use tracing::info;

use crate::cluster::{FlatClusterer, FlatUpgma};
use crate::error::{Error, Result};
use crate::graph::ColexGraph;
use crate::types::ColexEdge;

/// Default distance threshold below which two forms count as cognate.
pub const DEFAULT_THRESHOLD: f64 = 0.45;

/// Pairwise distance between two segment sequences, in `[0, 1]`.
///
/// Implementations must be symmetric with `distance(x, x) == 0`.
pub trait SimilarityOracle: Send + Sync {
    fn distance(&self, a: &[&str], b: &[&str]) -> Result<f64>;
}

impl<F> SimilarityOracle for F
where
    F: Fn(&[&str], &[&str]) -> Result<f64> + Send + Sync,
{
    fn distance(&self, a: &[&str], b: &[&str]) -> Result<f64> {
        self(a, b)
    }
}

/// Normalized segment edit distance from `clics_phonetic`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceOracle;

impl SimilarityOracle for EditDistanceOracle {
    fn distance(&self, a: &[&str], b: &[&str]) -> Result<f64> {
        if a.is_empty() || b.is_empty() {
            return Err(Error::oracle("cannot align an empty token"));
        }
        Ok(phonetic_distance(a, b))
    }
}

/// Assigns `cognate_count` to every edge of a graph.
pub struct CognacyWeighter {
    threshold: f64,
    oracle: Box<dyn SimilarityOracle>,
    clusterer: Box<dyn FlatClusterer>,
}

impl CognacyWeighter {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            oracle: Box::new(EditDistanceOracle),
            clusterer: Box::new(FlatUpgma),
        }
    }

    pub fn with_oracle(mut self, oracle: impl SimilarityOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    pub fn with_clusterer(mut self, clusterer: Box<dyn FlatClusterer>) -> Self {
        self.clusterer = clusterer;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Number of cognate sets among the tokens backing `edge`.
    pub fn cognate_count(&self, edge: &ColexEdge) -> Result<usize> {
        if edge.count <= 1 {
            return Ok(1);
        }
        let tokens: Vec<Vec<&str>> = edge.words.iter().map(|w| segments(w)).collect();

        if let [a, b] = tokens.as_slice() {
            let d = self.oracle.distance(a, b)?;
            return Ok(if d <= self.threshold { 1 } else { 2 });
        }

        let matrix = distance_matrix_with(&tokens, |a, b| self.oracle.distance(a, b))?;
        let groups = self
            .clusterer
            .cluster(self.threshold, &matrix, &edge.varieties)?;
        Ok(groups.len())
    }

    /// Weight every edge. Oracle failures abort the whole pass.
    pub fn weight(&self, mut graph: ColexGraph) -> Result<ColexGraph> {
        let counts: Vec<usize> = graph
            .graph()
            .edge_weights()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|edge| self.cognate_count(edge))
            .collect::<Result<_>>()?;

        for (edge, count) in graph.edge_weights_mut().zip(counts) {
            edge.cognate_count = Some(count);
        }
        info!(
            edges = graph.edge_count(),
            threshold = self.threshold,
            "weighted edges by cognacy"
        );
        Ok(graph)
    }
}

impl Default for CognacyWeighter {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Weight `graph` with the given oracle and the default flat UPGMA routine.
pub fn weight_by_cognacy(
    graph: ColexGraph,
    threshold: f64,
    oracle: impl SimilarityOracle + 'static,
) -> Result<ColexGraph> {
    CognacyWeighter::new(threshold).with_oracle(oracle).weight(graph)
}

//! Random-walk diffusion over the colexification graph.
//!
//! Follows Jackson et al. (2019): the row-normalized adjacency matrix P is
//! a one-step transition matrix, and P¹ + … + Pˢ approximates how easily
//! a walk starting at one concept reaches another within `s` steps.

use ahash::AHashMap;
use ndarray::{Array2, Axis};
use ordered_float::OrderedFloat;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{Error, Result};
use crate::graph::ColexGraph;
use crate::types::EdgeWeight;

/// Multi-step transition scores over the non-isolated concepts.
#[derive(Debug, Clone)]
pub struct TransitionMatrix {
    /// Sum of P¹ through Pˢ, optionally divided by `s`.
    pub matrix: Array2<f64>,
    /// Concept id of every row/column.
    pub nodes: Vec<String>,
    /// Symmetric weighted adjacency matrix.
    pub adjacency: Array2<f64>,
}

impl TransitionMatrix {
    /// The `k` concepts with the highest diffusion score from `concept`.
    pub fn strongest(&self, concept: &str, k: usize) -> Vec<(String, f64)> {
        let Some(row) = self.nodes.iter().position(|id| id == concept) else {
            return Vec::new();
        };

        let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, Reverse<usize>)>> = BinaryHeap::new();
        for (col, &value) in self.matrix.row(row).iter().enumerate() {
            if col == row || value <= 0.0 {
                continue;
            }
            heap.push(Reverse((OrderedFloat(value), Reverse(col))));
            if heap.len() > k {
                heap.pop();
            }
        }

        let mut top: Vec<(String, f64)> = heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse((score, Reverse(col)))| (self.nodes[col].clone(), score.0))
            .collect();
        top.truncate(k);
        top
    }
}

/// Compute the `steps`-step transition matrix of `graph` using `weight`
/// as edge weights. Nodes without edges are left out.
pub fn transition_matrix(
    graph: &ColexGraph,
    weight: EdgeWeight,
    steps: usize,
    normalize: bool,
) -> Result<TransitionMatrix> {
    if steps == 0 {
        return Err(Error::invalid_option("steps", "0"));
    }

    let g = graph.graph();
    let nodes: Vec<NodeIndex> = g
        .node_indices()
        .filter(|&n| g.neighbors(n).next().is_some())
        .collect();
    let position: AHashMap<NodeIndex, usize> =
        nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let n = nodes.len();

    let mut adjacency = Array2::<f64>::zeros((n, n));
    for e in g.edge_references() {
        let (i, j) = (position[&e.source()], position[&e.target()]);
        let w = e.weight().weight(weight);
        adjacency[[i, j]] += w;
        adjacency[[j, i]] += w;
    }

    let degrees = adjacency.sum_axis(Axis(1));
    if let Some(i) = degrees.iter().position(|&d| d <= 0.0) {
        return Err(Error::DegenerateInput {
            node: g[nodes[i]].id.clone(),
        });
    }
    let p = &adjacency / &degrees.insert_axis(Axis(1));

    let mut power = p.clone();
    let mut total = p.clone();
    for _ in 1..steps {
        power = power.dot(&p);
        total += &power;
    }
    if normalize {
        total.mapv_inplace(|v| v / steps as f64);
    }

    Ok(TransitionMatrix {
        matrix: total,
        nodes: nodes.iter().map(|&idx| g[idx].id.clone()).collect(),
        adjacency,
    })
}

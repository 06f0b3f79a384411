//! Adapter for flow-based global partitioning.
//!
//! The partitioning routine itself sits behind [`FlowPartitioner`]; this
//! module owns only the translation between concept ids and dense vertex
//! indices and the optional weight normalization
//!
//! ```text
//! w'(a, b) = w(a, b)² / (v(a) + v(b) − w(a, b))
//! ```
//!
//! where `v` is the vertex weight. After normalization vertex weights are
//! no longer passed on.

use rustc_hash::FxHashMap;

use super::{option, Clusters, Options};
use crate::error::Result;
use crate::graph::ColexGraph;
use crate::types::{Community, EdgeWeight, NodeWeight};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfomapOptions {
    pub edge_weight_attr: EdgeWeight,
    pub vertex_weight_attr: NodeWeight,
    pub normalize: bool,
}

impl Default for InfomapOptions {
    fn default() -> Self {
        Self {
            edge_weight_attr: EdgeWeight::Families,
            vertex_weight_attr: NodeWeight::Families,
            normalize: false,
        }
    }
}

impl InfomapOptions {
    pub fn from_options(options: &Options) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            edge_weight_attr: option(options, "weight", defaults.edge_weight_attr)?,
            vertex_weight_attr: option(options, "vertex_weight", defaults.vertex_weight_attr)?,
            normalize: option(options, "normalize", defaults.normalize)?,
        })
    }
}

/// Index-based weighted graph handed to a partitioner.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedGraph {
    pub vertex_count: usize,
    pub edges: Vec<(usize, usize, f64)>,
    pub vertex_weights: Option<Vec<f64>>,
}

impl WeightedGraph {
    /// Build the weighted view of `graph`; vertex `i` is the `i`-th node.
    pub fn from_graph(graph: &ColexGraph, opts: &InfomapOptions) -> Self {
        let g = graph.graph();
        let vertex_weights: Vec<f64> = g
            .node_weights()
            .map(|n| n.weight(opts.vertex_weight_attr))
            .collect();

        let edges = g
            .raw_edges()
            .iter()
            .map(|e| {
                let (a, b) = (e.source().index(), e.target().index());
                let w = e.weight.weight(opts.edge_weight_attr);
                let w = if opts.normalize {
                    normalized_weight(w, vertex_weights[a], vertex_weights[b])
                } else {
                    w
                };
                (a, b, w)
            })
            .collect();

        Self {
            vertex_count: g.node_count(),
            edges,
            vertex_weights: if opts.normalize { None } else { Some(vertex_weights) },
        }
    }
}

/// Overlap-normalized edge weight.
pub fn normalized_weight(edge: f64, vertex_a: f64, vertex_b: f64) -> f64 {
    let denominator = vertex_a + vertex_b - edge;
    if denominator <= 0.0 {
        0.0
    } else {
        edge * edge / denominator
    }
}

/// External community-detection capability: returns a community label per
/// vertex.
pub trait FlowPartitioner: Send + Sync {
    fn partition(&self, graph: &WeightedGraph) -> Result<Vec<usize>>;
}

/// Deterministic weighted label propagation.
///
/// Vertices are visited in index order; each adopts the label with the
/// highest summed vote `w(edge) · v(neighbour)`. Ties keep the current
/// label, otherwise go to the smallest label.
#[derive(Debug, Clone)]
pub struct LabelPropagation {
    max_iter: usize,
}

impl LabelPropagation {
    pub fn new() -> Self {
        Self { max_iter: 100 }
    }
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowPartitioner for LabelPropagation {
    fn partition(&self, graph: &WeightedGraph) -> Result<Vec<usize>> {
        let n = graph.vertex_count;
        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for &(a, b, w) in &graph.edges {
            if w > 0.0 && a != b {
                adjacency[a].push((b, w));
                adjacency[b].push((a, w));
            }
        }
        let vertex_weight = |v: usize| {
            graph
                .vertex_weights
                .as_ref()
                .map_or(1.0, |weights| weights[v].max(f64::MIN_POSITIVE))
        };

        let mut labels: Vec<usize> = (0..n).collect();
        for _ in 0..self.max_iter {
            let mut changed = false;
            for node in 0..n {
                if adjacency[node].is_empty() {
                    continue;
                }
                let mut votes: FxHashMap<usize, f64> = FxHashMap::default();
                for &(neighbor, w) in &adjacency[node] {
                    *votes.entry(labels[neighbor]).or_insert(0.0) += w * vertex_weight(neighbor);
                }

                let current = labels[node];
                let mut best = current;
                let mut best_score = votes.get(&current).copied().unwrap_or(0.0);
                let mut candidates: Vec<(usize, f64)> = votes.into_iter().collect();
                candidates.sort_unstable_by_key(|&(label, _)| label);
                for (label, score) in candidates {
                    if score > best_score {
                        best = label;
                        best_score = score;
                    }
                }

                if best != current {
                    labels[node] = best;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Renumber by first appearance
        let mut ids: FxHashMap<usize, usize> = FxHashMap::default();
        Ok(labels
            .into_iter()
            .map(|label| {
                let next = ids.len();
                *ids.entry(label).or_insert(next)
            })
            .collect())
    }
}

/// Partition `graph` with an arbitrary partitioner, as concept-id sets.
pub fn infomap_with(
    graph: &ColexGraph,
    opts: &InfomapOptions,
    partitioner: &dyn FlowPartitioner,
) -> Result<Vec<Community>> {
    let weighted = WeightedGraph::from_graph(graph, opts);
    let membership = partitioner.partition(&weighted)?;

    let count = membership.iter().max().map_or(0, |m| m + 1);
    let mut communities = vec![Community::new(); count];
    for (node, label) in graph.nodes().zip(membership) {
        communities[label].insert(node.id.clone());
    }
    communities.retain(|c| !c.is_empty());
    Ok(communities)
}

pub(crate) fn cluster<'g>(graph: &'g ColexGraph, options: &Options) -> Result<Clusters<'g>> {
    let opts = InfomapOptions::from_options(options)?;
    let communities = infomap_with(graph, &opts, &LabelPropagation::default())?;
    Ok(Box::new(communities.into_iter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cliques() -> WeightedGraph {
        let mut edges = Vec::new();
        for (a, b) in [(0, 1), (0, 2), (1, 2), (3, 4), (3, 5), (4, 5)] {
            edges.push((a, b, 3.0));
        }
        edges.push((2, 3, 1.0));
        WeightedGraph {
            vertex_count: 6,
            edges,
            vertex_weights: None,
        }
    }

    #[test]
    fn test_label_propagation_two_cliques() {
        let labels = LabelPropagation::new().partition(&two_cliques()).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_label_propagation_is_deterministic() {
        let lp = LabelPropagation::new();
        assert_eq!(lp.partition(&two_cliques()).unwrap(), lp.partition(&two_cliques()).unwrap());
    }

    #[test]
    fn test_normalized_weight() {
        assert_eq!(normalized_weight(2.0, 4.0, 2.0), 1.0);
        assert_eq!(normalized_weight(1.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_normalized_graph_drops_vertex_weights() {
        use crate::colexify::build;
        use crate::types::{Variety, WordForm, Wordlist};

        let lists = vec![
            Wordlist::new(
                Variety::new("L1", "ds").with_family("f1"),
                vec![WordForm::new("1", "kan", "hand"), WordForm::new("2", "kan", "arm")],
            ),
            Wordlist::new(
                Variety::new("L2", "ds").with_family("f2"),
                vec![WordForm::new("1", "mo", "hand"), WordForm::new("2", "ru", "arm")],
            ),
        ];
        let graph = build(&lists).unwrap();
        let opts = InfomapOptions {
            normalize: true,
            ..InfomapOptions::default()
        };
        let weighted = WeightedGraph::from_graph(&graph, &opts);
        assert_eq!(weighted.edges.len(), 1);
        // 1² / (2 + 2 - 1)
        assert!((weighted.edges[0].2 - 1.0 / 3.0).abs() < 1e-12);
        assert!(weighted.vertex_weights.is_none());

        let plain = WeightedGraph::from_graph(&graph, &InfomapOptions::default());
        assert_eq!(plain.edges[0].2, 1.0);
        assert_eq!(plain.vertex_weights, Some(vec![2.0, 2.0]));
    }

    #[test]
    fn test_options() {
        let mut options = Options::new();
        options.insert("weight".into(), "LanguageWeight".into());
        options.insert("normalize".into(), "true".into());
        let opts = InfomapOptions::from_options(&options).unwrap();
        assert_eq!(opts.edge_weight_attr, EdgeWeight::Languages);
        assert!(opts.normalize);
        assert_eq!(opts.vertex_weight_attr, NodeWeight::Families);
    }
}

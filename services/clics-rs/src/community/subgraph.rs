//! Ego-network cover.
//!
//! Every node grows a breadth-first neighbourhood of at most `max_hops`
//! generations. Growth stops early once the neighbourhood has reached
//! `max_nodes_pre` nodes, or when the next generation alone would exceed
//! `max_nodes_post`. Neighbourhoods are then taken largest first until all
//! nodes and edges are covered.

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use super::{option, Clusters, Options};
use crate::error::Result;
use crate::graph::ColexGraph;
use crate::types::Community;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubgraphOptions {
    pub max_hops: usize,
    pub max_nodes_pre: usize,
    pub max_nodes_post: usize,
}

impl Default for SubgraphOptions {
    fn default() -> Self {
        Self {
            max_hops: 2,
            max_nodes_pre: 30,
            max_nodes_post: 50,
        }
    }
}

impl SubgraphOptions {
    pub fn from_options(options: &Options) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_hops: option(options, "max_hops", defaults.max_hops)?,
            max_nodes_pre: option(options, "max_nodes_pre", defaults.max_nodes_pre)?,
            max_nodes_post: option(options, "max_nodes_post", defaults.max_nodes_post)?,
        })
    }
}

/// Neighbourhood of `start`, as sorted node indices.
pub fn ego_network(graph: &ColexGraph, start: NodeIndex, opts: &SubgraphOptions) -> Vec<NodeIndex> {
    let g = graph.graph();
    let mut reached: FxHashSet<NodeIndex> = FxHashSet::default();
    reached.insert(start);
    let mut frontier = vec![start];
    let mut generations = 1;

    while !frontier.is_empty() && reached.len() < opts.max_nodes_pre && generations <= opts.max_hops {
        let next: FxHashSet<NodeIndex> = frontier.iter().flat_map(|&n| g.neighbors(n)).collect();
        if next.len() > opts.max_nodes_post {
            break;
        }
        reached.extend(next.iter().copied());
        frontier = next.into_iter().collect();
        generations += 1;
    }

    let mut nodes: Vec<NodeIndex> = reached.into_iter().collect();
    nodes.sort_unstable();
    nodes
}

/// Greedy cover over precomputed ego networks.
pub struct SubgraphCover<'g> {
    graph: &'g ColexGraph,
    subgraphs: std::vec::IntoIter<Vec<NodeIndex>>,
    nodes: FxHashSet<NodeIndex>,
    edges: FxHashSet<(NodeIndex, NodeIndex)>,
}

impl<'g> SubgraphCover<'g> {
    pub fn new(graph: &'g ColexGraph, opts: &SubgraphOptions) -> Self {
        let g = graph.graph();
        let mut subgraphs: Vec<Vec<NodeIndex>> = g
            .node_indices()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|&n| ego_network(graph, n, opts))
            .collect();
        subgraphs.sort_by(|a, b| b.len().cmp(&a.len()));

        Self {
            graph,
            subgraphs: subgraphs.into_iter(),
            nodes: g.node_indices().collect(),
            edges: g
                .edge_references()
                .map(|e| ordered(e.source(), e.target()))
                .collect(),
        }
    }
}

impl Iterator for SubgraphCover<'_> {
    type Item = Community;

    fn next(&mut self) -> Option<Community> {
        if self.nodes.is_empty() && self.edges.is_empty() {
            return None;
        }
        let subgraph = self.subgraphs.next()?;
        for (i, &a) in subgraph.iter().enumerate() {
            self.nodes.remove(&a);
            for &b in &subgraph[i + 1..] {
                self.edges.remove(&ordered(a, b));
            }
        }
        let g = self.graph.graph();
        Some(subgraph.iter().map(|&n| g[n].id.clone()).collect())
    }
}

fn ordered(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub(crate) fn cluster<'g>(graph: &'g ColexGraph, options: &Options) -> Result<Clusters<'g>> {
    let opts = SubgraphOptions::from_options(options)?;
    Ok(Box::new(SubgraphCover::new(graph, &opts)))
}

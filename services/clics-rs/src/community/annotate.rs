//! Write cluster assignments back onto the graph.

use petgraph::graph::NodeIndex;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::graph::ColexGraph;
use crate::types::Community;

pub const CLUSTER_NAME: &str = "ClusterName";
pub const CENTRAL_CONCEPT: &str = "CentralConcept";

/// One numbered cluster after annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAnnotation {
    /// 1-based rank by descending size.
    pub index: usize,
    pub name: String,
    pub central_concept: String,
    pub members: Vec<String>,
}

/// Number `clusters` largest first and record them on the member nodes
/// under `algorithm`, `ClusterName` and `CentralConcept`. Nodes outside
/// every cluster get index `0`. A node in several clusters keeps the
/// annotation of the last (smallest) one.
pub fn annotate(
    graph: &mut ColexGraph,
    algorithm: &str,
    clusters: impl IntoIterator<Item = Community>,
) -> Vec<ClusterAnnotation> {
    let mut clusters: Vec<Community> = clusters.into_iter().filter(|c| !c.is_empty()).collect();
    clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let indices: Vec<NodeIndex> = graph.graph().node_indices().collect();
    for &idx in &indices {
        let node = graph.node_mut(idx);
        node.annotations.insert(algorithm.to_string(), "0".to_string());
        node.annotations.insert(CLUSTER_NAME.to_string(), String::new());
        node.annotations.insert(CENTRAL_CONCEPT.to_string(), String::new());
    }

    let mut annotations = Vec::with_capacity(clusters.len());
    for (i, cluster) in clusters.into_iter().enumerate() {
        let index = i + 1;
        let members: Vec<NodeIndex> = cluster.iter().filter_map(|id| graph.index_of(id)).collect();
        let Some(central) = central_node(graph, &members) else {
            continue;
        };
        let central_concept = graph.graph()[central].label().to_string();
        let name = format!("{algorithm}_{index}_{central_concept}");

        for &idx in &members {
            let node = graph.node_mut(idx);
            node.annotations.insert(algorithm.to_string(), index.to_string());
            node.annotations.insert(CLUSTER_NAME.to_string(), name.clone());
            node.annotations.insert(CENTRAL_CONCEPT.to_string(), central_concept.clone());
        }
        annotations.push(ClusterAnnotation {
            index,
            name,
            central_concept,
            members: cluster.into_iter().collect(),
        });
    }
    annotations
}

/// Member with the highest degree inside the induced subgraph; ties go to
/// the first member.
fn central_node(graph: &ColexGraph, members: &[NodeIndex]) -> Option<NodeIndex> {
    let g = graph.graph();
    let inside: FxHashSet<NodeIndex> = members.iter().copied().collect();
    let mut best: Option<(NodeIndex, usize)> = None;
    for &idx in members {
        let degree = g.neighbors(idx).filter(|n| inside.contains(n)).count();
        if best.map_or(true, |(_, d)| degree > d) {
            best = Some((idx, degree));
        }
    }
    best.map(|(idx, _)| idx)
}

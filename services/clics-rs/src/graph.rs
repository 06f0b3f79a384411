//! Colexification network: concepts as nodes, shared word forms as edges.
//!
//! Wraps a petgraph `UnGraph` with string-keyed lookup of concept nodes and
//! an ordered-pair index over edges so that the builder can accumulate
//! occurrences without scanning adjacency lists.

use ahash::AHashMap;
use petgraph::algo::connected_components;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::error::Result;
use crate::types::{ColexEdge, ConceptNode, EdgeFilter, Variety, WordForm};

/// Concept graph with accumulated colexification provenance.
#[derive(Debug, Clone)]
pub struct ColexGraph {
    graph: UnGraph<ConceptNode, ColexEdge>,
    node_map: AHashMap<String, NodeIndex>,
    edge_map: AHashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl ColexGraph {
    /// Create new empty graph
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            node_map: AHashMap::new(),
            edge_map: AHashMap::new(),
        }
    }

    /// Underlying petgraph graph.
    pub fn graph(&self) -> &UnGraph<ConceptNode, ColexEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&ConceptNode> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIndex) -> &mut ConceptNode {
        &mut self.graph[idx]
    }

    /// Edge between two concepts, in either direction.
    pub fn edge(&self, a: &str, b: &str) -> Option<&ColexEdge> {
        let key = edge_key(self.index_of(a)?, self.index_of(b)?);
        self.edge_map.get(&key).map(|&e| &self.graph[e])
    }

    /// Concept nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ConceptNode> {
        self.graph.node_weights()
    }

    /// Edges as `(node, node, edge)` triples in edge-index order.
    pub fn edges(&self) -> impl Iterator<Item = (&ConceptNode, &ConceptNode, &ColexEdge)> {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()], e.weight()))
    }

    pub(crate) fn edge_weights_mut(&mut self) -> impl Iterator<Item = &mut ColexEdge> {
        self.graph.edge_weights_mut()
    }

    /// Get or create node index
    pub(crate) fn get_or_create_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(id) {
            idx
        } else {
            let idx = self.graph.add_node(ConceptNode::new(id));
            self.node_map.insert(id.to_string(), idx);
            idx
        }
    }

    /// Record that `form` expresses its concept in `variety`.
    pub(crate) fn add_expression(&mut self, concept: &str, form: &WordForm, token: &str, variety: &Variety) {
        let idx = self.get_or_create_node(concept);
        self.graph[idx].push(form, token, variety);
    }

    /// Record one colexification occurrence between two distinct concepts.
    pub(crate) fn add_occurrence(
        &mut self,
        (concept_a, form_a): (&str, &WordForm),
        (concept_b, form_b): (&str, &WordForm),
        token: &str,
        variety: &Variety,
    ) {
        if concept_a == concept_b {
            return;
        }
        let a = self.get_or_create_node(concept_a);
        let b = self.get_or_create_node(concept_b);
        let key = edge_key(a, b);
        let edge = match self.edge_map.get(&key) {
            Some(&e) => e,
            None => {
                let e = self.graph.add_edge(a, b, ColexEdge::default());
                self.edge_map.insert(key, e);
                e
            }
        };
        self.graph[edge].push(token, (form_a.gid(), form_b.gid()), variety);
    }

    /// Compute summary counts from the accumulated multisets.
    pub(crate) fn summarize(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.summarize();
        }
        for edge in self.graph.edge_weights_mut() {
            edge.summarize();
        }
    }

    /// Remove every edge whose `filter` count is below `threshold`.
    /// Nodes are kept. Returns the number of removed edges.
    pub fn prune(&mut self, filter: EdgeFilter, threshold: usize) -> usize {
        let before = self.graph.edge_count();
        let attr = filter.weight();
        self.graph
            .retain_edges(|g, e| g[e].weight(attr) >= threshold as f64);
        self.rebuild_edge_map();
        let removed = before - self.graph.edge_count();
        info!(%filter, threshold, removed, "pruned colexification edges");
        removed
    }

    fn rebuild_edge_map(&mut self) {
        self.edge_map = self
            .graph
            .edge_references()
            .map(|e| (edge_key(e.source(), e.target()), e.id()))
            .collect();
    }

    /// Top `n` edges by (family, language, word) counts, strongest first.
    pub fn strongest_edges(&self, n: usize) -> Vec<(&ConceptNode, &ConceptNode, &ColexEdge)> {
        let mut edges: Vec<_> = self.edges().collect();
        edges.sort_by(|x, y| {
            let kx = (x.2.summary.family_count, x.2.summary.language_count, x.2.summary.word_count);
            let ky = (y.2.summary.family_count, y.2.summary.language_count, y.2.summary.word_count);
            ky.cmp(&kx)
        });
        edges.truncate(n);
        edges
    }

    /// Get graph statistics. When `algorithm` is given, also counts the
    /// distinct communities recorded in node annotations under that name.
    pub fn stats(&self, algorithm: Option<&str>) -> GraphStats {
        let num_nodes = self.graph.node_count();
        let num_edges = self.graph.edge_count();
        let avg_degree = if num_nodes > 0 {
            (2 * num_edges) as f64 / num_nodes as f64
        } else {
            0.0
        };

        let density = if num_nodes > 1 {
            (2 * num_edges) as f64 / (num_nodes * (num_nodes - 1)) as f64
        } else {
            0.0
        };

        let num_communities = algorithm.map(|name| {
            self.nodes()
                .filter_map(|n| n.annotations.get(name))
                .collect::<BTreeSet<_>>()
                .len()
        });

        GraphStats {
            num_nodes,
            num_edges,
            avg_degree,
            density,
            num_components: connected_components(&self.graph),
            num_communities,
        }
    }

    /// Export the graph with all node and edge attributes.
    pub fn to_json(&self) -> Result<String> {
        let doc = GraphDocumentRef {
            nodes: self.nodes().collect(),
            edges: self
                .edges()
                .map(|(a, b, edge)| EdgeRecordRef {
                    source: &a.id,
                    target: &b.id,
                    edge,
                })
                .collect(),
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Rebuild a graph exported with [`ColexGraph::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: GraphDocument = serde_json::from_str(json)?;
        let mut graph = Self::new();
        for node in doc.nodes {
            let idx = graph.get_or_create_node(&node.id);
            graph.graph[idx] = node;
        }
        for record in doc.edges {
            let a = graph.get_or_create_node(&record.source);
            let b = graph.get_or_create_node(&record.target);
            let e = graph.graph.add_edge(a, b, record.edge);
            graph.edge_map.insert(edge_key(a, b), e);
        }
        Ok(graph)
    }
}

impl Default for ColexGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn edge_key(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Serialize)]
struct GraphDocumentRef<'a> {
    nodes: Vec<&'a ConceptNode>,
    edges: Vec<EdgeRecordRef<'a>>,
}

#[derive(Serialize)]
struct EdgeRecordRef<'a> {
    source: &'a str,
    target: &'a str,
    #[serde(flatten)]
    edge: &'a ColexEdge,
}

#[derive(Deserialize)]
struct GraphDocument {
    nodes: Vec<ConceptNode>,
    edges: Vec<EdgeRecord>,
}

#[derive(Deserialize)]
struct EdgeRecord {
    source: String,
    target: String,
    #[serde(flatten)]
    edge: ColexEdge,
}

/// Graph statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub avg_degree: f64,
    pub density: f64,
    pub num_components: usize,
    pub num_communities: Option<usize>,
}

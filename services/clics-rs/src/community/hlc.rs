//! Hierarchical link clustering (Ahn, Bagrow & Lehmann 2010).
//!
//! Edges rather than nodes are clustered, so a concept may belong to
//! several communities. Two edges sharing an endpoint `k` are scored by the
//! similarity of their other endpoints `i` and `j`:
//!
//! * unweighted: Jaccard index of the closed neighbourhoods of `i` and `j`;
//! * weighted: Tanimoto coefficient of the neighbour-weight vectors, each
//!   vertex linked to itself with its mean incident weight.
//!
//! Without a threshold the dendrogram is cut where the partition density
//!
//! ```text
//! D = 2/M · Σ_c m_c (m_c − n_c + 1) / ((n_c − 2)(n_c − 1))
//! ```
//!
//! is maximal, evaluated whenever the similarity level changes.

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use tracing::{debug, info};

use super::{option, optional, Clusters, Options};
use crate::cluster::UnionFind;
use crate::error::Result;
use crate::graph::ColexGraph;
use crate::types::{Community, EdgeWeight};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HlcOptions {
    /// Smallest community (in vertices) that is reported.
    pub min_size: usize,
    /// Fixed cut level; `None` selects it by partition density.
    pub threshold: Option<f64>,
    /// Edge attribute for weighted similarity.
    pub weight: Option<EdgeWeight>,
}

impl Default for HlcOptions {
    fn default() -> Self {
        Self {
            min_size: 3,
            threshold: None,
            weight: None,
        }
    }
}

impl HlcOptions {
    pub fn from_options(options: &Options) -> Result<Self> {
        Ok(Self {
            min_size: option(options, "min_size", 3)?,
            threshold: optional(options, "threshold")?,
            weight: optional(options, "weight")?,
        })
    }
}

/// Edge of the line graph: two original edges sharing an endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineEdge {
    pub a: usize,
    pub b: usize,
    pub score: f64,
}

enum Similarity {
    Jaccard(Vec<FxHashSet<usize>>),
    Tanimoto {
        vectors: Vec<FxHashMap<usize, f64>>,
        sqsums: Vec<f64>,
    },
}

impl Similarity {
    fn jaccard(vertex_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut closed: Vec<FxHashSet<usize>> = (0..vertex_count)
            .map(|v| FxHashSet::from_iter([v]))
            .collect();
        for &(a, b) in edges {
            closed[a].insert(b);
            closed[b].insert(a);
        }
        Similarity::Jaccard(closed)
    }

    fn tanimoto(vertex_count: usize, edges: &[(usize, usize)], weights: &[f64]) -> Self {
        let mut vectors: Vec<FxHashMap<usize, f64>> = vec![FxHashMap::default(); vertex_count];
        for (&(a, b), &w) in edges.iter().zip(weights) {
            vectors[a].insert(b, w);
            vectors[b].insert(a, w);
        }
        for (v, vector) in vectors.iter_mut().enumerate() {
            if !vector.is_empty() {
                let strength: f64 = vector.values().sum();
                let mean = strength / vector.len() as f64;
                vector.insert(v, mean);
            }
        }
        let sqsums = vectors
            .iter()
            .map(|vector| vector.values().map(|w| w * w).sum())
            .collect();
        Similarity::Tanimoto { vectors, sqsums }
    }

    fn score(&self, i: usize, j: usize) -> f64 {
        match self {
            Similarity::Jaccard(closed) => {
                let (small, large) = smaller_first(&closed[i], &closed[j]);
                let shared = small.iter().filter(|v| large.contains(v)).count();
                let union = closed[i].len() + closed[j].len() - shared;
                shared as f64 / union as f64
            }
            Similarity::Tanimoto { vectors, sqsums } => {
                let (small, large) = if vectors[i].len() <= vectors[j].len() {
                    (&vectors[i], &vectors[j])
                } else {
                    (&vectors[j], &vectors[i])
                };
                let dot: f64 = small
                    .iter()
                    .map(|(k, w)| w * large.get(k).copied().unwrap_or(0.0))
                    .sum();
                let denominator = sqsums[i] + sqsums[j] - dot;
                if denominator <= 0.0 {
                    0.0
                } else {
                    dot / denominator
                }
            }
        }
    }
}

fn smaller_first<'a>(
    x: &'a FxHashSet<usize>,
    y: &'a FxHashSet<usize>,
) -> (&'a FxHashSet<usize>, &'a FxHashSet<usize>) {
    if x.len() <= y.len() {
        (x, y)
    } else {
        (y, x)
    }
}

/// A group of original edges plus the vertices they touch.
#[derive(Debug, Default)]
struct EdgeCluster {
    vertices: FxHashSet<usize>,
    edges: Vec<usize>,
}

impl EdgeCluster {
    fn partition_density(&self) -> f64 {
        let (m, n) = (self.edges.len() as f64, self.vertices.len() as f64);
        if n <= 2.0 {
            return 0.0;
        }
        m * (m - n + 1.0) / (n - 2.0) / (n - 1.0)
    }
}

/// Agglomerative edge clustering with running partition density.
struct EdgeClustering {
    clusters: Vec<EdgeCluster>,
    membership: Vec<usize>,
    d: f64,
}

impl EdgeClustering {
    fn new(edges: &[(usize, usize)]) -> Self {
        Self {
            clusters: edges
                .iter()
                .enumerate()
                .map(|(i, &(a, b))| EdgeCluster {
                    vertices: FxHashSet::from_iter([a, b]),
                    edges: vec![i],
                })
                .collect(),
            membership: (0..edges.len()).collect(),
            d: 0.0,
        }
    }

    /// Merge the clusters of two edges, the smaller into the larger.
    fn merge_edges(&mut self, edge1: usize, edge2: usize) {
        let (mut cid1, mut cid2) = (self.membership[edge1], self.membership[edge2]);
        if cid1 == cid2 {
            return;
        }
        if self.clusters[cid1].edges.len() < self.clusters[cid2].edges.len() {
            std::mem::swap(&mut cid1, &mut cid2);
        }

        let dc1 = self.clusters[cid1].partition_density();
        let dc2 = self.clusters[cid2].partition_density();

        let absorbed = std::mem::take(&mut self.clusters[cid2]);
        for &edge in &absorbed.edges {
            self.membership[edge] = cid1;
        }
        let target = &mut self.clusters[cid1];
        target.vertices.extend(absorbed.vertices);
        target.edges.extend(absorbed.edges);

        self.d += target.partition_density() - dc1 - dc2;
    }
}

/// Link communities as sorted vertex lists. Single pass.
pub struct LinkCommunities {
    inner: std::vec::IntoIter<Vec<usize>>,
}

impl Iterator for LinkCommunities {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        self.inner.next()
    }
}

/// Hierarchical link clustering over a simple undirected graph given as
/// an edge list.
#[derive(Debug, Clone)]
pub struct Hlc {
    vertex_count: usize,
    edges: Vec<(usize, usize)>,
    weights: Option<Vec<f64>>,
    min_size: usize,
    last_threshold: Option<f64>,
    last_partition_density: Option<f64>,
}

impl Hlc {
    pub fn new(vertex_count: usize, edges: Vec<(usize, usize)>) -> Self {
        debug_assert!(edges.iter().all(|&(a, b)| a != b), "loop edge");
        Self {
            vertex_count,
            edges,
            weights: None,
            min_size: 3,
            last_threshold: None,
            last_partition_density: None,
        }
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        debug_assert_eq!(weights.len(), self.edges.len());
        self.weights = Some(weights);
        self
    }

    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set up from a colexification graph; vertex `i` is the `i`-th node.
    pub fn from_graph(graph: &ColexGraph, weight: Option<EdgeWeight>) -> Self {
        let g = graph.graph();
        let edges = g
            .raw_edges()
            .iter()
            .map(|e| (e.source().index(), e.target().index()))
            .collect();
        let hlc = Self::new(g.node_count(), edges);
        match weight {
            Some(attr) => {
                let weights = g.edge_weights().map(|e| e.weight(attr)).collect();
                hlc.with_weights(weights)
            }
            None => hlc,
        }
    }

    /// Cut level of the last run.
    pub fn last_threshold(&self) -> Option<f64> {
        self.last_threshold
    }

    /// Best partition density of the last run without a fixed threshold.
    pub fn last_partition_density(&self) -> Option<f64> {
        self.last_partition_density
    }

    /// Line graph with similarity scores, ordered by `(a, b)`.
    pub fn edge_similarity_graph(&self) -> Vec<LineEdge> {
        let similarity = match &self.weights {
            Some(weights) => Similarity::tanimoto(self.vertex_count, &self.edges, weights),
            None => Similarity::jaccard(self.vertex_count, &self.edges),
        };

        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); self.vertex_count];
        for (i, &(a, b)) in self.edges.iter().enumerate() {
            incident[a].push(i);
            incident[b].push(i);
        }

        // (edge, edge, far endpoint, far endpoint)
        let mut pairs: Vec<(usize, usize, usize, usize)> = Vec::new();
        for (shared, edges) in incident.iter().enumerate() {
            for (x, &e1) in edges.iter().enumerate() {
                for &e2 in &edges[x + 1..] {
                    let i = self.other_end(e1, shared);
                    let j = self.other_end(e2, shared);
                    pairs.push((e1.min(e2), e1.max(e2), i, j));
                }
            }
        }
        pairs.sort_unstable_by_key(|&(a, b, _, _)| (a, b));
        debug!(edges = self.edges.len(), line_edges = pairs.len(), "built line graph");

        pairs
            .par_iter()
            .map(|&(a, b, i, j)| LineEdge {
                a,
                b,
                score: similarity.score(i, j),
            })
            .collect()
    }

    fn other_end(&self, edge: usize, vertex: usize) -> usize {
        let (a, b) = self.edges[edge];
        if a == vertex {
            b
        } else {
            a
        }
    }

    /// Run the clustering, either at a fixed `threshold` or at the level
    /// of maximal partition density.
    pub fn run(&mut self, threshold: Option<f64>) -> LinkCommunities {
        let membership = match threshold {
            Some(t) => self.membership_at(t),
            None => self.best_membership(),
        };

        let mut groups: Vec<FxHashSet<usize>> = Vec::new();
        let mut slot: FxHashMap<usize, usize> = FxHashMap::default();
        for (&(a, b), cid) in self.edges.iter().zip(membership) {
            let next = groups.len();
            let idx = *slot.entry(cid).or_insert(next);
            if idx == groups.len() {
                groups.push(FxHashSet::default());
            }
            groups[idx].insert(a);
            groups[idx].insert(b);
        }

        let communities: Vec<Vec<usize>> = groups
            .into_iter()
            .filter(|g| g.len() >= self.min_size)
            .map(|g| {
                let mut vertices: Vec<usize> = g.into_iter().collect();
                vertices.sort_unstable();
                vertices
            })
            .collect();

        info!(
            edges = self.edges.len(),
            communities = communities.len(),
            threshold = ?self.last_threshold,
            partition_density = ?self.last_partition_density,
            "link clustering finished"
        );
        LinkCommunities {
            inner: communities.into_iter(),
        }
    }

    fn membership_at(&mut self, threshold: f64) -> Vec<usize> {
        self.last_threshold = Some(threshold);
        self.last_partition_density = None;

        let mut components = UnionFind::new(self.edges.len());
        for line in self.edge_similarity_graph() {
            if line.score > threshold {
                components.union(line.a, line.b);
            }
        }
        components.membership()
    }

    fn best_membership(&mut self) -> Vec<usize> {
        let mut lines = self.edge_similarity_graph();
        lines.sort_by_key(|l| Reverse(OrderedFloat(l.score)));

        let mut clustering = EdgeClustering::new(&self.edges);
        let mut max_d = f64::NEG_INFINITY;
        let mut best: Option<(f64, Vec<usize>)> = None;
        let mut prev_score: Option<f64> = None;

        for line in &lines {
            if prev_score != Some(line.score) {
                if clustering.d >= max_d {
                    max_d = clustering.d;
                    best = Some((line.score, clustering.membership.clone()));
                }
                prev_score = Some(line.score);
            }
            clustering.merge_edges(line.a, line.b);
        }

        match best {
            Some((threshold, membership)) => {
                self.last_threshold = Some(threshold);
                self.last_partition_density = Some(max_d * 2.0 / self.edges.len() as f64);
                membership
            }
            None => {
                self.last_threshold = None;
                self.last_partition_density = Some(0.0);
                (0..self.edges.len()).collect()
            }
        }
    }
}

pub(crate) fn cluster<'g>(graph: &'g ColexGraph, options: &Options) -> Result<Clusters<'g>> {
    let opts = HlcOptions::from_options(options)?;
    let mut hlc = Hlc::from_graph(graph, opts.weight).with_min_size(opts.min_size);
    let communities = hlc.run(opts.threshold);

    let g = graph.graph();
    Ok(Box::new(communities.map(move |vertices| {
        vertices
            .into_iter()
            .map(|v| g[petgraph::graph::NodeIndex::new(v)].id.clone())
            .collect::<Community>()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles joined by the bridge 2-3.
    fn bridged_triangles() -> Vec<(usize, usize)> {
        vec![(0, 1), (0, 2), (1, 2), (2, 3), (3, 4), (3, 5), (4, 5)]
    }

    #[test]
    fn test_line_graph_scores() {
        let hlc = Hlc::new(6, bridged_triangles());
        let lines = hlc.edge_similarity_graph();
        assert_eq!(lines.len(), 10);

        let score = |a, b| lines.iter().find(|l| l.a == a && l.b == b).unwrap().score;
        assert_eq!(score(1, 2), 1.0);
        assert_eq!(score(0, 1), 0.75);
        assert!((score(1, 3) - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_partition_density_cut() {
        let mut hlc = Hlc::new(6, bridged_triangles());
        let communities: Vec<Vec<usize>> = hlc.run(None).collect();

        assert_eq!(communities, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert!((hlc.last_threshold().unwrap() - 1.0 / 6.0).abs() < 1e-12);
        assert!((hlc.last_partition_density().unwrap() - 6.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_threshold() {
        let mut hlc = Hlc::new(6, bridged_triangles());
        let communities: Vec<Vec<usize>> = hlc.run(Some(0.5)).collect();
        assert_eq!(communities, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_eq!(hlc.last_threshold(), Some(0.5));
        assert_eq!(hlc.last_partition_density(), None);

        let communities: Vec<Vec<usize>> = hlc.with_min_size(2).run(Some(0.5)).collect();
        assert_eq!(communities.len(), 3);
    }

    #[test]
    fn test_uniform_weights_match_jaccard() {
        let mut plain = Hlc::new(6, bridged_triangles());
        let mut weighted = Hlc::new(6, bridged_triangles()).with_weights(vec![1.0; 7]);
        let a: Vec<_> = plain.run(None).collect();
        let b: Vec<_> = weighted.run(None).collect();
        assert_eq!(a, b);
        assert_eq!(plain.last_threshold(), weighted.last_threshold());
    }

    #[test]
    fn test_repeated_runs_agree() {
        let mut hlc = Hlc::new(6, bridged_triangles());
        let first: Vec<_> = hlc.run(None).collect();
        let density = hlc.last_partition_density();
        let threshold = hlc.last_threshold();
        let second: Vec<_> = hlc.run(None).collect();
        assert_eq!(first, second);
        assert_eq!(hlc.last_partition_density(), density);
        assert_eq!(hlc.last_threshold(), threshold);
    }

    #[test]
    fn test_tanimoto_score() {
        // self weight of a vertex is the mean of its incident weights
        let hlc = Hlc::new(4, vec![(0, 1), (0, 2), (1, 2), (2, 3)]).with_weights(vec![1.0, 3.0, 2.0, 4.0]);
        let lines = hlc.edge_similarity_graph();
        let line = lines.iter().find(|l| l.a == 1 && l.b == 3).unwrap();
        assert!((line.score - 12.0 / 34.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_equal_to_score_does_not_merge() {
        let mut hlc = Hlc::new(6, bridged_triangles()).with_min_size(2);
        let communities: Vec<Vec<usize>> = hlc.run(Some(0.75)).collect();
        assert_eq!(
            communities,
            vec![vec![0, 1], vec![0, 1, 2], vec![2, 3], vec![3, 4, 5], vec![4, 5]]
        );
    }

    #[test]
    fn test_no_line_edges() {
        let mut hlc = Hlc::new(3, vec![(0, 1)]).with_min_size(2);
        let communities: Vec<_> = hlc.run(None).collect();
        assert_eq!(communities, vec![vec![0, 1]]);
        assert_eq!(hlc.last_partition_density(), Some(0.0));
    }

    #[test]
    fn test_options() {
        let mut options = Options::new();
        options.insert("threshold".into(), "0.3".into());
        options.insert("weight".into(), "FamilyWeight".into());
        let opts = HlcOptions::from_options(&options).unwrap();
        assert_eq!(opts.threshold, Some(0.3));
        assert_eq!(opts.weight, Some(EdgeWeight::Families));
        assert_eq!(opts.min_size, 3);
    }
}

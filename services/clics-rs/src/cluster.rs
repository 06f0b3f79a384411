//! Flat clustering primitives over distance matrices.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Union-Find data structure for connected components
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    /// Create new UnionFind with n elements
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Find root with path compression
    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    /// Union by rank
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        match self.rank[root_x].cmp(&self.rank[root_y]) {
            std::cmp::Ordering::Less => {
                self.parent[root_x] = root_y;
            }
            std::cmp::Ordering::Greater => {
                self.parent[root_y] = root_x;
            }
            std::cmp::Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
    }

    /// Component id of every element, numbered by first appearance.
    pub fn membership(&mut self) -> Vec<usize> {
        let mut ids: HashMap<usize, usize> = HashMap::new();
        (0..self.parent.len())
            .map(|i| {
                let root = self.find(i);
                let next = ids.len();
                *ids.entry(root).or_insert(next)
            })
            .collect()
    }

    /// All connected components, ordered by their first element.
    pub fn components(&mut self) -> Vec<Vec<usize>> {
        let membership = self.membership();
        let count = membership.iter().max().map_or(0, |m| m + 1);
        let mut groups = vec![Vec::new(); count];
        for (i, m) in membership.into_iter().enumerate() {
            groups[m].push(i);
        }
        groups
    }
}

/// Generic flat clustering over a labelled distance matrix.
pub trait FlatClusterer: Send + Sync {
    /// Partition `labels` into groups whose members lie within `threshold`.
    fn cluster(&self, threshold: f64, matrix: &Array2<f64>, labels: &[String]) -> Result<Vec<Vec<String>>>;
}

/// Average-linkage agglomeration that stops once the closest pair of
/// clusters is farther apart than the threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatUpgma;

impl FlatClusterer for FlatUpgma {
    fn cluster(&self, threshold: f64, matrix: &Array2<f64>, labels: &[String]) -> Result<Vec<Vec<String>>> {
        check_shape(matrix, labels)?;
        let mut clusters: Vec<Vec<usize>> = (0..labels.len()).map(|i| vec![i]).collect();

        while clusters.len() > 1 {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in 0..clusters.len() {
                for j in i + 1..clusters.len() {
                    let d = average_distance(matrix, &clusters[i], &clusters[j]);
                    if best.map_or(true, |(_, _, b)| d < b) {
                        best = Some((i, j, d));
                    }
                }
            }
            match best {
                Some((i, j, d)) if d <= threshold => {
                    let merged = clusters.remove(j);
                    clusters[i].extend(merged);
                }
                _ => break,
            }
        }

        Ok(to_labels(clusters, labels))
    }
}

/// Single linkage: connected components of the "distance ≤ threshold" graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleLinkage;

impl FlatClusterer for SingleLinkage {
    fn cluster(&self, threshold: f64, matrix: &Array2<f64>, labels: &[String]) -> Result<Vec<Vec<String>>> {
        check_shape(matrix, labels)?;
        let n = labels.len();
        let pairs = (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j, matrix[[i, j]])));
        Ok(to_labels(threshold_clustering(pairs, n, threshold), labels))
    }
}

/// Named clustering routine for configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMethod {
    #[default]
    Upgma,
    SingleLinkage,
}

impl ClusterMethod {
    pub fn clusterer(self) -> Box<dyn FlatClusterer> {
        match self {
            ClusterMethod::Upgma => Box::new(FlatUpgma),
            ClusterMethod::SingleLinkage => Box::new(SingleLinkage),
        }
    }
}

/// Cluster items whose pairwise distance is at most `threshold` using Union-Find
pub fn threshold_clustering(
    distances: impl IntoIterator<Item = (usize, usize, f64)>,
    n_items: usize,
    threshold: f64,
) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(n_items);

    for (i, j, dist) in distances {
        if dist <= threshold {
            uf.union(i, j);
        }
    }

    uf.components()
}

fn check_shape(matrix: &Array2<f64>, labels: &[String]) -> Result<()> {
    let (rows, cols) = matrix.dim();
    if rows != labels.len() || cols != labels.len() {
        return Err(Error::DimensionMismatch {
            expected: labels.len(),
            found: rows.max(cols),
        });
    }
    Ok(())
}

fn average_distance(matrix: &Array2<f64>, a: &[usize], b: &[usize]) -> f64 {
    let sum: f64 = a
        .iter()
        .flat_map(|&i| b.iter().map(move |&j| matrix[[i, j]]))
        .sum();
    sum / (a.len() * b.len()) as f64
}

fn to_labels(clusters: Vec<Vec<usize>>, labels: &[String]) -> Vec<Vec<String>> {
    clusters
        .into_iter()
        .map(|cluster| cluster.into_iter().map(|idx| labels[idx].clone()).collect())
        .collect()
}

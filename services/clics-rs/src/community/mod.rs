//! Community detection over colexification graphs.
//!
//! Algorithms are registered in a static table mapping a name to a plain
//! function `(graph, options) -> lazy sequence of concept-id sets`. Options
//! arrive as a flat string map and each algorithm parses them into its own
//! typed record.
//!
//! | Name       | Output                                   | Re-iterable |
//! |------------|------------------------------------------|-------------|
//! | `subgraph` | overlapping ego neighbourhoods           | no          |
//! | `infomap`  | node-disjoint flow partition             | no          |
//! | `hlc`      | link communities (may overlap on nodes)  | no          |
//!
//! Every sequence is single-pass; collect it when it has to be reused.
//! [`Registry::cluster`] appends a singleton for every node the algorithm
//! did not place, so the union of all yielded sets covers the graph.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::graph::ColexGraph;
use crate::types::Community;

pub mod annotate;
pub mod hlc;
pub mod infomap;
pub mod subgraph;

pub use annotate::{annotate, ClusterAnnotation};
pub use hlc::{Hlc, HlcOptions, LineEdge};
pub use infomap::{infomap_with, FlowPartitioner, InfomapOptions, LabelPropagation, WeightedGraph};
pub use subgraph::SubgraphOptions;

/// Flat option mapping passed to every algorithm.
pub type Options = BTreeMap<String, String>;

/// Lazy, single-pass sequence of communities.
pub type Clusters<'g> = Box<dyn Iterator<Item = Community> + 'g>;

/// Signature shared by all registered algorithms.
pub type ClusterFn = for<'g> fn(&'g ColexGraph, &Options) -> Result<Clusters<'g>>;

/// A registered clustering algorithm.
#[derive(Clone, Copy)]
pub struct Algorithm {
    pub name: &'static str,
    pub description: &'static str,
    pub run: ClusterFn,
}

impl std::fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Algorithm")
            .field("name", &self.name)
            .finish()
    }
}

/// All algorithms known to the default registry.
pub static ALGORITHMS: [Algorithm; 3] = [
    Algorithm {
        name: "subgraph",
        description: "greedy cover by breadth-first ego neighbourhoods",
        run: subgraph::cluster,
    },
    Algorithm {
        name: "infomap",
        description: "flow-based partition over (optionally normalized) weights",
        run: infomap::cluster,
    },
    Algorithm {
        name: "hlc",
        description: "hierarchical link clustering (Ahn et al. 2010)",
        run: hlc::cluster,
    },
];

/// Name → algorithm lookup.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    algorithms: &'static [Algorithm],
}

impl Registry {
    pub fn new() -> Self {
        Self {
            algorithms: &ALGORITHMS,
        }
    }

    pub fn get(&self, name: &str) -> Result<&'static Algorithm> {
        self.algorithms
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::UnknownAlgorithm(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &'static Algorithm> {
        self.algorithms.iter()
    }

    /// Run `name` on `graph`, covering unplaced nodes with singletons.
    pub fn cluster<'g>(
        &self,
        graph: &'g ColexGraph,
        name: &str,
        options: &Options,
    ) -> Result<Clusters<'g>> {
        let algorithm = self.get(name)?;
        let clusters = (algorithm.run)(graph, options)?;
        Ok(Box::new(CoverNodes::new(graph, clusters)))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Yields the wrapped communities, then one singleton per uncovered node.
pub struct CoverNodes<'g> {
    graph: &'g ColexGraph,
    inner: Clusters<'g>,
    covered: FxHashSet<String>,
    remaining: Option<std::vec::IntoIter<String>>,
}

impl<'g> CoverNodes<'g> {
    pub fn new(graph: &'g ColexGraph, inner: Clusters<'g>) -> Self {
        Self {
            graph,
            inner,
            covered: FxHashSet::default(),
            remaining: None,
        }
    }
}

impl Iterator for CoverNodes<'_> {
    type Item = Community;

    fn next(&mut self) -> Option<Community> {
        if self.remaining.is_none() {
            if let Some(community) = self.inner.next() {
                self.covered.extend(community.iter().cloned());
                return Some(community);
            }
            let uncovered: Vec<String> = self
                .graph
                .nodes()
                .filter(|n| !self.covered.contains(&n.id))
                .map(|n| n.id.clone())
                .collect();
            self.remaining = Some(uncovered.into_iter());
        }
        self.remaining
            .as_mut()
            .and_then(Iterator::next)
            .map(|id| Community::from([id]))
    }
}

/// Parse `key` from the flat options, falling back to `default`.
pub(crate) fn option<T: FromStr>(options: &Options, key: &str, default: T) -> Result<T> {
    match options.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::invalid_option(key, raw.as_str())),
    }
}

/// Like [`option`] but without a default.
pub(crate) fn optional<T: FromStr>(options: &Options, key: &str) -> Result<Option<T>> {
    options
        .get(key)
        .map(|raw| {
            raw.parse()
                .map_err(|_| Error::invalid_option(key, raw.as_str()))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colexify::build;
    use crate::types::{Variety, WordForm, Wordlist};

    fn graph() -> ColexGraph {
        let forms = vec![
            WordForm::new("1", "ab", "a"),
            WordForm::new("2", "ab", "b"),
            WordForm::new("3", "zz", "lonely"),
        ];
        build(&[Wordlist::new(Variety::new("l1", "ds"), forms)]).unwrap()
    }

    #[test]
    fn test_registry_lookup() {
        let registry = Registry::new();
        assert!(registry.contains("hlc"));
        assert!(registry.contains("subgraph"));
        assert!(registry.contains("infomap"));
        assert!(matches!(
            registry.get("louvain"),
            Err(Error::UnknownAlgorithm(name)) if name == "louvain"
        ));
        assert_eq!(registry.algorithms().count(), 3);
    }

    #[test]
    fn test_every_algorithm_covers_all_nodes() {
        let g = graph();
        let registry = Registry::new();
        for algorithm in registry.algorithms() {
            let clusters: Vec<Community> = registry
                .cluster(&g, algorithm.name, &Options::new())
                .unwrap()
                .collect();
            let covered: FxHashSet<&String> = clusters.iter().flatten().collect();
            assert_eq!(covered.len(), 3, "{} left nodes uncovered", algorithm.name);
        }
    }

    #[test]
    fn test_option_parsing() {
        let mut options = Options::new();
        options.insert("min_size".into(), "4".into());
        options.insert("threshold".into(), "abc".into());
        assert_eq!(option(&options, "min_size", 3usize).unwrap(), 4);
        assert_eq!(option(&options, "missing", 3usize).unwrap(), 3);
        assert!(optional::<f64>(&options, "threshold").is_err());
        assert_eq!(optional::<f64>(&options, "missing").unwrap(), None);
    }
}

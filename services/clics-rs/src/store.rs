//! On-disk storage of built networks.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::graph::ColexGraph;
use crate::types::EdgeFilter;

/// A stored network, addressed by name, pruning threshold and edge filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub graphname: String,
    pub threshold: usize,
    pub edgefilter: EdgeFilter,
    pub graph_dir: PathBuf,
}

impl Network {
    pub fn new(
        graphname: impl Into<String>,
        threshold: usize,
        edgefilter: EdgeFilter,
        graph_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            graphname: graphname.into(),
            threshold,
            edgefilter,
            graph_dir: graph_dir.as_ref().to_path_buf(),
        }
    }

    /// `{graphname}-{threshold}-{edgefilter}.json` inside `graph_dir`.
    pub fn fname(&self) -> PathBuf {
        self.graph_dir.join(format!(
            "{}-{}-{}.json",
            self.graphname, self.threshold, self.edgefilter
        ))
    }

    pub fn exists(&self) -> bool {
        self.fname().exists()
    }

    pub fn save(&self, graph: &ColexGraph) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.graph_dir)?;
        let path = self.fname();
        std::fs::write(&path, graph.to_json()?)?;
        info!(path = %path.display(), nodes = graph.node_count(), edges = graph.edge_count(), "saved network");
        Ok(path)
    }

    pub fn load(&self) -> Result<ColexGraph> {
        let raw = std::fs::read_to_string(self.fname())?;
        ColexGraph::from_json(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colexify::build;
    use crate::types::{Variety, WordForm, Wordlist};

    #[test]
    fn test_fname() {
        let network = Network::new("network", 3, EdgeFilter::Families, "graphs");
        assert_eq!(network.fname(), Path::new("graphs").join("network-3-families.json"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let forms = vec![
            WordForm::new("1", "kan", "hand").with_gloss("HAND"),
            WordForm::new("2", "kan", "arm").with_gloss("ARM"),
        ];
        let variety = Variety::new("l1", "ds").with_family("f1");
        let mut graph = build(&[Wordlist::new(variety, forms)]).unwrap();
        graph
            .node_mut(graph.index_of("hand").unwrap())
            .annotations
            .insert("infomap".into(), "1".into());

        let network = Network::new("network", 1, EdgeFilter::Words, dir.path().join("nested"));
        assert!(!network.exists());
        let path = network.save(&graph).unwrap();
        assert!(path.ends_with("network-1-words.json"));

        let loaded = network.load().unwrap();
        assert_eq!(loaded.node("hand"), graph.node("hand"));
        assert_eq!(loaded.edge("arm", "hand"), graph.edge("hand", "arm"));
        assert_eq!(loaded.node("hand").unwrap().annotations["infomap"], "1");
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        let network = Network::new("missing", 1, EdgeFilter::Families, dir.path());
        assert!(matches!(network.load(), Err(crate::error::Error::Io(_))));
    }
}

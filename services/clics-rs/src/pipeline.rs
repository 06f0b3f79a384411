//! End-to-end run: build, prune, weight, cluster, annotate.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::cognacy::CognacyWeighter;
use crate::colexify::build_filtered;
use crate::community::{annotate, ClusterAnnotation, Registry};
use crate::config::ClicsConfig;
use crate::diffusion::{transition_matrix, TransitionMatrix};
use crate::error::Result;
use crate::graph::ColexGraph;
use crate::stats::{language_stats, LanguageStats};
use crate::store::Network;
use crate::types::{Community, Wordlist};

/// Annotated graph plus the materialized clusters.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub graph: ColexGraph,
    pub clusters: Vec<Community>,
    pub annotations: Vec<ClusterAnnotation>,
}

pub struct Pipeline {
    config: ClicsConfig,
    registry: Registry,
}

impl Pipeline {
    pub fn new(config: ClicsConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
        }
    }

    pub fn config(&self) -> &ClicsConfig {
        &self.config
    }

    /// Build and prune without clustering.
    pub fn graph(&self, wordlists: &[Wordlist]) -> Result<ColexGraph> {
        let mut graph = build_filtered(wordlists, &self.config.filter)?;
        graph.prune(self.config.edgefilter, self.config.threshold);

        match self.config.cognacy {
            Some(cognacy) => CognacyWeighter::new(cognacy.threshold)
                .with_clusterer(cognacy.method.clusterer())
                .weight(graph),
            None => Ok(graph),
        }
    }

    pub fn run(&self, wordlists: &[Wordlist]) -> Result<PipelineOutput> {
        let algorithm = self.registry.get(&self.config.algorithm)?;
        let mut graph = self.graph(wordlists)?;

        info!(algorithm = algorithm.name, "clustering");
        let clusters: Vec<Community> = self
            .registry
            .cluster(&graph, algorithm.name, &self.config.cluster_options)?
            .collect();
        let annotations = annotate(&mut graph, algorithm.name, clusters.iter().cloned());

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            clusters = annotations.len(),
            "pipeline finished"
        );
        Ok(PipelineOutput {
            graph,
            clusters,
            annotations,
        })
    }

    /// Per-language statistics over the unpruned graph, counting edges
    /// against the configured edge filter and threshold.
    pub fn language_stats(&self, wordlists: &[Wordlist]) -> Result<Vec<LanguageStats>> {
        let graph = build_filtered(wordlists, &self.config.filter)?;
        let admitted: Vec<Wordlist> = wordlists
            .iter()
            .filter(|list| self.config.filter.accepts_variety(&list.variety))
            .cloned()
            .collect();
        Ok(language_stats(
            &graph,
            &admitted,
            self.config.edgefilter,
            self.config.threshold,
        ))
    }

    /// Diffusion scores under the configured weight and step count.
    pub fn diffusion(&self, graph: &ColexGraph) -> Result<TransitionMatrix> {
        let d = &self.config.diffusion;
        transition_matrix(graph, d.weight, d.steps, d.normalize)
    }

    /// Store `graph` under the configured name in `graph_dir`.
    pub fn save(&self, graph: &ColexGraph, graph_dir: impl AsRef<Path>) -> Result<PathBuf> {
        self.network(graph_dir).save(graph)
    }

    pub fn network(&self, graph_dir: impl AsRef<Path>) -> Network {
        Network::new(
            self.config.graphname.clone(),
            self.config.threshold,
            self.config.edgefilter,
            graph_dir,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::{EdgeFilter, Variety, WordForm};

    fn wordlists() -> Vec<Wordlist> {
        let mut lists = Vec::new();
        for (i, family) in ["f1", "f2", "f3"].iter().enumerate() {
            let variety = Variety::new(format!("l{i}"), "ds").with_family(*family);
            let forms = vec![
                WordForm::new("1", "kan", "hand"),
                WordForm::new("2", "kan", "arm"),
                WordForm::new("3", "lo", "tree"),
                WordForm::new("4", "lo", "wood"),
            ];
            lists.push(Wordlist::new(variety, forms));
        }
        lists.push(Wordlist::new(
            Variety::new("l9", "ds").with_family("f9"),
            vec![WordForm::new("1", "su", "sun"), WordForm::new("2", "su", "day")],
        ));
        lists
    }

    #[test]
    fn test_unknown_algorithm_fails_before_building() {
        let config = ClicsConfig {
            algorithm: "louvain".into(),
            ..ClicsConfig::default()
        };
        let err = Pipeline::new(config).run(&wordlists()).unwrap_err();
        assert!(matches!(err, Error::UnknownAlgorithm(_)));
    }

    #[test]
    fn test_prune_then_cluster() {
        let config = ClicsConfig {
            threshold: 2,
            edgefilter: EdgeFilter::Families,
            ..ClicsConfig::default()
        };
        let output = Pipeline::new(config).run(&wordlists()).unwrap();

        assert_eq!(output.graph.edge_count(), 2);
        assert!(output.graph.edge("sun", "day").is_none());
        assert_eq!(output.graph.node_count(), 6);

        let hand = output.graph.node("hand").unwrap();
        let arm = output.graph.node("arm").unwrap();
        assert_eq!(hand.annotations["infomap"], arm.annotations["infomap"]);
        assert_eq!(output.annotations.len(), output.clusters.len());
    }

    #[test]
    fn test_cognacy_stage() {
        let config = ClicsConfig {
            cognacy: Some(Default::default()),
            ..ClicsConfig::default()
        };
        let graph = Pipeline::new(config).graph(&wordlists()).unwrap();
        // identical tokens across families collapse into one cognate set
        assert_eq!(graph.edge("hand", "arm").unwrap().cognate_count, Some(1));
    }

    #[test]
    fn test_filtered_graph() {
        let config = ClicsConfig {
            filter: crate::colexify::BuildFilter::default().concepts(["sun", "day", "tree"]),
            ..ClicsConfig::default()
        };
        let graph = Pipeline::new(config).graph(&wordlists()).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge("sun", "day").is_some());
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_language_stats_ignore_pruning() {
        let config = ClicsConfig {
            threshold: 2,
            ..ClicsConfig::default()
        };
        let stats = Pipeline::new(config).language_stats(&wordlists()).unwrap();
        assert_eq!(stats.len(), 4);
        let l9 = stats.iter().find(|s| s.variety == "ds-l9").unwrap();
        assert_eq!(l9.colexifications_all, 1);
        assert_eq!(l9.colexifications_threshold, 0);
        let l0 = stats.iter().find(|s| s.variety == "ds-l0").unwrap();
        assert_eq!((l0.colexifications_all, l0.colexifications_threshold), (2, 2));
    }
}

//! Run configuration.
//!
//! Every field has a default, so a partial (or empty) JSON document is a
//! valid configuration:
//!
//! ```json
//! { "threshold": 3, "algorithm": "hlc", "cluster_options": { "min_size": "4" } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cluster::ClusterMethod;
use crate::cognacy::DEFAULT_THRESHOLD;
use crate::colexify::BuildFilter;
use crate::community::Options;
use crate::error::Result;
use crate::types::{EdgeFilter, EdgeWeight};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClicsConfig {
    /// Base name of the stored network.
    pub graphname: String,
    /// Varieties and concepts admitted to the graph.
    pub filter: BuildFilter,
    /// Minimum `edgefilter` count an edge needs to survive pruning.
    pub threshold: usize,
    pub edgefilter: EdgeFilter,
    /// Cognate-aware weighting; skipped when absent.
    pub cognacy: Option<CognacyConfig>,
    pub algorithm: String,
    pub cluster_options: Options,
    pub diffusion: DiffusionConfig,
}

impl Default for ClicsConfig {
    fn default() -> Self {
        Self {
            graphname: "network".to_string(),
            filter: BuildFilter::default(),
            threshold: 1,
            edgefilter: EdgeFilter::default(),
            cognacy: None,
            algorithm: "infomap".to_string(),
            cluster_options: Options::new(),
            diffusion: DiffusionConfig::default(),
        }
    }
}

impl ClicsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CognacyConfig {
    pub threshold: f64,
    pub method: ClusterMethod,
}

impl Default for CognacyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            method: ClusterMethod::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionConfig {
    pub weight: EdgeWeight,
    pub steps: usize,
    pub normalize: bool,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            weight: EdgeWeight::Families,
            steps: 10,
            normalize: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ClicsConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ClicsConfig::default());
        assert_eq!(config.edgefilter, EdgeFilter::Families);
        assert!(config.cognacy.is_none());
        assert_eq!(config.filter, BuildFilter::default());
    }

    #[test]
    fn test_filter_section() {
        let config = ClicsConfig::from_json_str(
            r#"{"filter": {"family": "Uralic", "concepts": ["HAND", "ARM"]}}"#,
        )
        .unwrap();
        assert_eq!(config.filter.family.as_deref(), Some("Uralic"));
        assert_eq!(config.filter.concepts.unwrap().len(), 2);
        assert!(config.filter.languages.is_none());
    }

    #[test]
    fn test_partial_document() {
        let config = ClicsConfig::from_json_str(
            r#"{
                "threshold": 3,
                "edgefilter": "words",
                "algorithm": "hlc",
                "cluster_options": {"min_size": "4"},
                "cognacy": {"method": "single_linkage"},
                "diffusion": {"weight": "LanguageWeight"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.threshold, 3);
        assert_eq!(config.edgefilter, EdgeFilter::Words);
        assert_eq!(config.cluster_options["min_size"], "4");
        let cognacy = config.cognacy.unwrap();
        assert_eq!(cognacy.threshold, DEFAULT_THRESHOLD);
        assert_eq!(cognacy.method, ClusterMethod::SingleLinkage);
        assert_eq!(config.diffusion.weight, EdgeWeight::Languages);
        assert_eq!(config.diffusion.steps, 10);
    }

    #[test]
    fn test_bad_document() {
        assert!(ClicsConfig::from_json_str(r#"{"edgefilter": "concepts"}"#).is_err());
    }
}

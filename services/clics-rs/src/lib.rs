//! CLICS Core: colexification networks and their communities.
//!
//! Provides:
//! - Graph construction from per-language word lists
//! - Edge pruning and cognate-aware edge weighting
//! - Per-language colexification statistics
//! - Random-walk diffusion scores
//! - Community detection (ego subgraphs, flow partition, link clustering)
//! - JSON storage of annotated networks
//! - Python bindings via PyO3 (feature `python`)

pub mod cluster;
pub mod cognacy;
pub mod colexify;
pub mod community;
pub mod config;
pub mod diffusion;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod stats;
pub mod store;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use cluster::{ClusterMethod, FlatClusterer, FlatUpgma, SingleLinkage, UnionFind};
pub use cognacy::{weight_by_cognacy, CognacyWeighter, EditDistanceOracle, SimilarityOracle};
pub use colexify::{build, build_filtered, BuildFilter};
pub use community::{annotate, Options, Registry};
pub use config::ClicsConfig;
pub use diffusion::{transition_matrix, TransitionMatrix};
pub use error::{Error, Result};
pub use graph::{ColexGraph, GraphStats};
pub use pipeline::{Pipeline, PipelineOutput};
pub use stats::{colex2lang, language_stats, LanguageStats};
pub use store::Network;
pub use types::{
    ColexEdge, Community, ConceptNode, EdgeFilter, EdgeWeight, NodeWeight, Variety, WordForm,
    Wordlist,
};

//! Error types for the colexification kernel.

use thiserror::Error;

/// Result alias for `clics_core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by graph construction, weighting and clustering.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Forms of a variety were not grouped by token, so per-token
    /// deduplication would silently undercount.
    #[error("forms of variety '{variety}' are not grouped by token: '{token}' reappears after another token")]
    DataIntegrity {
        /// Variety whose word list is out of order.
        variety: String,
        /// Token that reappeared.
        token: String,
    },

    /// A node with zero weighted degree reached the diffusion analyzer.
    #[error("node '{node}' has zero weighted degree")]
    DegenerateInput {
        /// Offending concept id.
        node: String,
    },

    /// Clustering algorithm not present in the registry.
    #[error("unknown cluster algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The similarity oracle rejected its input.
    #[error("similarity oracle failed: {0}")]
    Oracle(String),

    /// A flat option could not be parsed into its typed field.
    #[error("invalid value '{value}' for option '{key}'")]
    InvalidOption {
        /// Option name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// Distance matrix and label list disagree in size.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Unknown node or edge attribute name.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an oracle error.
    pub fn oracle(msg: impl Into<String>) -> Self {
        Error::Oracle(msg.into())
    }

    /// Create an invalid option error.
    pub fn invalid_option(key: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidOption {
            key: key.into(),
            value: value.into(),
        }
    }
}

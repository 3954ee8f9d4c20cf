//! Engine error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A required spec reference has no matching asset id in its store.
    #[error("Missing asset: {category} '{id}' not found")]
    MissingAsset { category: String, id: String },

    /// The tabular source backing a Tenner or chunk component is absent.
    #[error("Missing source for {category}: {}", path.display())]
    MissingSource { category: String, path: PathBuf },

    #[error("Tenner {category} must have exactly {expected} items, found {found}")]
    Cardinality {
        category: String,
        expected: usize,
        found: usize,
    },

    #[error("Permutation {index} not found, available: 0-{available}")]
    PermutationOutOfRange { index: usize, available: usize },

    #[error("Combination space of {categories} categories exceeds the addressable range")]
    CombinationSpaceTooLarge { categories: usize },

    #[error("Invalid chunk id: {0}")]
    InvalidChunkId(String),

    #[error("Invalid component reference: {0}")]
    InvalidComponent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tabular source error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn missing_asset(category: impl Into<String>, id: impl Into<String>) -> Self {
        Self::MissingAsset {
            category: category.into(),
            id: id.into(),
        }
    }

    pub fn missing_source(category: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingSource {
            category: category.into(),
            path: path.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("Cannot build an index from zero vectors")]
    EmptyIndex,

    #[error("Feature column '{column}' has zero variance and cannot be standardized")]
    DegenerateFeature { column: String },

    #[error("Vector contains NaN or infinite values")]
    NonFiniteVector,

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ScoutError {
    /// Whether this error is a lookup miss that should be shown to the user as a message
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub mod catalog;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod features;
pub mod format;
pub mod index;
pub mod reports;
pub mod resolver;
pub mod search;
pub mod summarize;

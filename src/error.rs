//! Error types for the clustering library

use thiserror::Error;

/// Errors raised while configuring or feeding the clustering engine
#[derive(Debug, Error)]
pub enum Error {
    /// Merging method name not recognised
    #[error("unknown merging method: {0}")]
    UnknownMergingMethod(String),

    /// Similarity function name not recognised
    #[error("unknown similarity function: {0}")]
    UnknownSimilarity(String),

    /// Seed method name is empty
    #[error("unknown seed method: '{0}'")]
    UnknownSeedMethod(String),

    /// Merging method is known but has no implementation
    #[error("merging method '{0}' is not supported; use 'single'")]
    UnsupportedMergingMethod(String),

    /// Seed or graph input could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input line could not be interpreted
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

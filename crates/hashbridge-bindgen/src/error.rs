//! Error types for binding generation

use std::path::PathBuf;

use hashbridge_abi::TypeId;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while loading reflected metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read metadata {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse metadata {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while building the type graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Two distinct reflected types render to paths with the same identity.
    #[error("TypeId collision {type_id}: '{first}' and '{second}'")]
    TypeIdCollision {
        type_id: TypeId,
        first: String,
        second: String,
    },

    #[error("Service '{0}' is not a bindable interface")]
    UnknownService(String),
}

/// Top-level generation error
#[derive(Debug, Error)]
pub enum BindgenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

//! Defines the error types for the loader module.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed document")]
    Malformed(#[from] serde_json::Error),
    #[error("atomic model is missing the 'nos' key")]
    MissingNodes,
    #[error("a super document must contain at least one module")]
    NoModules,
    #[error("a super-model must declare its root explicitly")]
    MissingRoot,
    #[error("module '{module}' contains a node without an 'id'")]
    NodeWithoutId { module: String },
    #[error("duplicate node id '{id}' across modules")]
    DuplicateNodeId { id: String },
    #[error("duplicate context key '{key}' across modules")]
    DuplicateContextKey { key: String },
    #[error("composite models with imports are not supported")]
    CompositeUnsupported,
    #[error("a context document must be a JSON object")]
    ContextNotObject,
}

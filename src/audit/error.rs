//! Defines the error types for the audit module.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("i/o failure at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize artifact")]
    Serialization(#[from] serde_json::Error),
    #[error("context snapshot has no blocks")]
    EmptyContext,
    #[error("'{name}' is a reserved block name")]
    ReservedBlockName { name: String },
}

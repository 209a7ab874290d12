//! Defines the error types for the validation module.
use thiserror::Error;

use crate::model::Arity;

/// A structural defect found by the static verifier.
///
/// Verification accumulates every detectable error into one list, so a
/// single invalid model yields a complete diagnostic report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("node at position {position} has no 'id'")]
    EmptyId { position: usize },
    #[error("duplicate node id '{id}'")]
    DuplicateId { id: String },
    #[error("node '{id}': unknown operator kind '{kind}'")]
    UnknownKind { id: String, kind: String },
    #[error("node '{id}' references missing node '{dependency}'")]
    DanglingReference { id: String, dependency: String },
    #[error("node '{id}' of kind '{kind}' requires {required}, found {actual}")]
    ArityMismatch {
        id: String,
        kind: String,
        required: Arity,
        actual: usize,
    },
    #[error("cycle detected involving node '{id}'")]
    Cycle { id: String },
    #[error("no root candidate found (the model has no consolidation point)")]
    NoRootCandidate,
    #[error("node '{id}' is unreachable from every root candidate")]
    Orphan { id: String },
}

//! Deterministic, auditable evaluation of declarative normative models.
//!
//! A normative model is an expression DAG encoding a legal
//! cost-calculation rule; the context is the set of externally supplied
//! leaf values with their provenance. The pipeline is: static structural
//! verification of the graph, memoized evaluation of one root against
//! the context, and append-only persistence of the execution with
//! canonical content hashes, so every number can later be traced to its
//! legal or documentary source.

pub mod audit;
pub mod context;
pub mod interpreter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod validation;

pub use audit::{canonical_hash, ContextStore, ExecutionRecord, ExecutionStore};
pub use context::{Context, ContextEntry, ContextValue};
pub use interpreter::{EvaluatedNode, EvaluationError, ExecutionResult, Interpreter, Trail};
pub use model::{LegalMetadata, Node, NormativeModel, OperatorKind};
pub use pipeline::{execute, execute_and_record, execute_from_files, PipelineError};
pub use validation::{StaticVerifier, ValidationError};

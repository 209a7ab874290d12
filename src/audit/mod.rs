//! Deterministic audit persistence: canonical hashing, execution records
//! and context snapshots. Everything here is append-only.
pub mod context_store;
pub mod error;
pub mod execution;
pub mod hash;

pub use context_store::{ContextBlocks, ContextSnapshotMeta, ContextStore, SavedContext};
pub use error::AuditError;
pub use execution::{
    DecisionExcerpt, ExecutionMeta, ExecutionRecord, ExecutionStore, RecordedExecution,
    PERSISTENCE_FORMAT_VERSION,
};
pub use hash::canonical_hash;

//! Evaluates verified normative models against a context.
pub mod engine;
pub mod trail;

pub use engine::Interpreter;
pub use trail::{EvaluatedNode, EvaluationError, ExecutionResult, Trail};

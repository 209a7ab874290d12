//! Core data structures of the normative model graph.
pub mod node;
pub mod normative;

pub use node::{Arity, LegalMetadata, Node, OperatorKind};
pub use normative::NormativeModel;

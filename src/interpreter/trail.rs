//! The audit trail and execution result produced by one evaluation.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::LegalMetadata;

pub use self::error::EvaluationError;
mod error {
    use thiserror::Error;

    use crate::model::Arity;

    /// An error raised during evaluation. Fail-fast: the first error
    /// aborts the whole execution and no partial result is returned.
    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum EvaluationError {
        #[error("node '{id}' does not exist in the model")]
        MissingNode { id: String },
        #[error("value for '{id}' not found in the context")]
        MissingContextValue { id: String },
        #[error("value for '{id}' still holds {candidates} candidates (decision not finalized)")]
        DecisionNotFinalized { id: String, candidates: usize },
        #[error("division by zero at node '{id}', operand {position}")]
        DivisionByZero { id: String, position: usize },
        #[error("node '{id}' would produce a non-real result")]
        NonRealResult { id: String },
        #[error("node '{id}': root index must be a non-zero integer, found {index}")]
        InvalidRootIndex { id: String, index: f64 },
        #[error("node '{id}' of kind '{kind}' requires {required}, found {actual}")]
        OperandCountMismatch {
            id: String,
            kind: String,
            required: Arity,
            actual: usize,
        },
        #[error("unknown operator kind '{kind}' at node '{id}'")]
        UnknownKind { id: String, kind: String },
        #[error("cycle detected at node '{id}'")]
        CycleDetected { id: String },
    }
}

/// The per-node audit record: what was computed, from what, under which
/// legal annotation. This is the artifact reporting and persistence read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedNode {
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "dependencias")]
    pub dependencies: Vec<String>,
    #[serde(rename = "valor_calculado")]
    pub computed_value: f64,
    #[serde(rename = "metadados_juridicos", default)]
    pub legal_metadata: LegalMetadata,
}

/// The ordered record of one evaluation: node id to evaluated node, in
/// first-computed order.
///
/// Serializes as a JSON object that preserves insertion order, which is
/// why this is a vector with a hand-written map impl rather than a
/// sorted map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trail {
    entries: Vec<(String, EvaluatedNode)>,
}

impl Trail {
    pub fn push(&mut self, id: &str, node: EvaluatedNode) {
        self.entries.push((id.to_string(), node));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EvaluatedNode)> {
        self.entries.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn get(&self, id: &str) -> Option<&EvaluatedNode> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, node)| node)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Trail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, node) in &self.entries {
            map.serialize_entry(id, node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Trail {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TrailVisitor;

        impl<'de> Visitor<'de> for TrailVisitor {
            type Value = Trail;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of node id to evaluated node")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Trail, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, EvaluatedNode>()? {
                    entries.push(entry);
                }
                Ok(Trail { entries })
            }
        }

        deserializer.deserialize_map(TrailVisitor)
    }
}

/// The complete outcome of evaluating one root against one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(rename = "no_raiz")]
    pub root_id: String,
    #[serde(rename = "valor_final")]
    pub final_value: f64,
    #[serde(rename = "trilha_calculo")]
    pub trail: Trail,
    #[serde(rename = "nos_avaliados")]
    pub evaluated_nodes: BTreeMap<String, EvaluatedNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluated(kind: &str, deps: &[&str], value: f64) -> EvaluatedNode {
        EvaluatedNode {
            kind: kind.into(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            computed_value: value,
            legal_metadata: LegalMetadata::default(),
        }
    }

    #[test]
    fn trail_serialization_preserves_insertion_order() {
        let mut trail = Trail::default();
        trail.push("zebra", evaluated("constante", &[], 1.0));
        trail.push("alfa", evaluated("constante", &[], 2.0));
        trail.push("total", evaluated("soma", &["zebra", "alfa"], 3.0));

        let json = serde_json::to_string(&trail).unwrap();
        let zebra = json.find("\"zebra\"").unwrap();
        let alfa = json.find("\"alfa\"").unwrap();
        let total = json.find("\"total\"").unwrap();
        assert!(zebra < alfa && alfa < total, "order lost in {json}");

        let back: Trail = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trail);
    }

    #[test]
    fn trail_lookup_by_id() {
        let mut trail = Trail::default();
        trail.push("x", evaluated("constante", &[], 10.0));
        assert!(trail.contains("x"));
        assert_eq!(trail.get("x").unwrap().computed_value, 10.0);
        assert!(trail.get("y").is_none());
    }
}

//! The `NormativeModel`: the unit handed to the verifier and interpreter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::node::Node;

/// A normative model as produced by the loaders: the declaration-ordered
/// node list plus an optional declared root.
///
/// The declared root is informational. The verifier computes root
/// candidates independently, and evaluation targets whichever root id the
/// caller passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormativeModel {
    #[serde(rename = "nos")]
    pub nodes: Vec<Node>,
    #[serde(rename = "raiz", default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl NormativeModel {
    pub fn new(nodes: Vec<Node>, root: Option<String>) -> Self {
        Self { nodes, root }
    }

    /// Builds the id index. On duplicate ids the first occurrence wins;
    /// flagging duplicates is the verifier's job.
    pub fn index(&self) -> HashMap<&str, &Node> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.entry(node.id.as_str()).or_insert(node);
        }
        index
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: &str, deps: &[&str]) -> Node {
        Node {
            id: id.into(),
            kind: kind.into(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            legal_metadata: None,
        }
    }

    #[test]
    fn index_keeps_first_occurrence_of_duplicates() {
        let model = NormativeModel::new(
            vec![node("x", "constante", &[]), node("x", "soma", &["a", "b"])],
            None,
        );
        let index = model.index();
        assert_eq!(index.len(), 1);
        assert_eq!(index["x"].kind, "constante");
    }

    #[test]
    fn deserializes_with_optional_root() {
        let model: NormativeModel = serde_json::from_str(
            r#"{"nos": [{"id": "x", "tipo": "constante", "dependencias": []}], "raiz": "x"}"#,
        )
        .unwrap();
        assert_eq!(model.root.as_deref(), Some("x"));
        assert_eq!(model.len(), 1);

        let bare: NormativeModel = serde_json::from_str(r#"{"nos": []}"#).unwrap();
        assert!(bare.root.is_none());
    }
}

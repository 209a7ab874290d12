//! Generates the operational context skeleton an operator still has to
//! fill in: one null-valued entry per undecided leaf of a super-model,
//! grouped by the model's own module names.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::loader::{SuperContextDocument, SuperModelDocument};
use crate::model::OperatorKind;

/// A placeholder entry awaiting a human decision. Serializes with
/// explicit nulls so the pending fields are visible in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PendingEntry {
    #[serde(rename = "valor")]
    pub value: Option<f64>,
    #[serde(rename = "origem")]
    pub origin: Option<String>,
    #[serde(rename = "referencia_documental")]
    pub documentary_reference: Option<String>,
}

/// A `super_contexto` skeleton aligned with the model's modules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalScaffold {
    #[serde(rename = "tipo")]
    pub document_kind: String,
    #[serde(rename = "modulos")]
    pub modules: BTreeMap<String, BTreeMap<String, PendingEntry>>,
}

/// Builds the scaffold: only leaf nodes need a human value, and keys
/// already decided in the legal context are excluded. Modules with
/// nothing left to decide are omitted entirely.
pub fn operational_context(
    model: &SuperModelDocument,
    legal: &SuperContextDocument,
) -> OperationalScaffold {
    let decided: BTreeSet<&str> = legal
        .modules
        .values()
        .flat_map(|block| block.keys().map(String::as_str))
        .collect();

    let mut modules = BTreeMap::new();
    for (name, module) in &model.modules {
        let mut fields = BTreeMap::new();
        for node in &module.nodes {
            let is_leaf = node.operator().map_or(false, OperatorKind::is_leaf);
            if !is_leaf || decided.contains(node.id.as_str()) {
                continue;
            }
            fields.insert(node.id.clone(), PendingEntry::default());
        }
        if !fields.is_empty() {
            modules.insert(name.clone(), fields);
        }
    }

    OperationalScaffold {
        document_kind: "super_contexto".to_string(),
        modules,
    }
}

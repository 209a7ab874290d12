//! Loads normative models: atomic documents pass through with shape
//! checks; super-models are flattened into a single graph, rejecting any
//! node id collision across modules. No validation beyond structure and
//! no calculation happens here; the static verifier owns model soundness.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::error::LoadError;
use crate::model::{Node, NormativeModel};

/// The modular, pre-merge form of a model: nodes grouped under named
/// modules, with a mandatory explicit root.
#[derive(Debug, Clone, Deserialize)]
pub struct SuperModelDocument {
    #[serde(rename = "modulos", default)]
    pub modules: BTreeMap<String, ModelModule>,
    #[serde(rename = "raiz", default)]
    pub root: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelModule {
    #[serde(rename = "nos", default)]
    pub nodes: Vec<Node>,
}

/// Single entry point for loading a model file from an injected base
/// directory. Accepts atomic models and super-models; the composite
/// (import-based) form is reserved and rejected.
pub fn load_model(base_dir: &Path, name: &str) -> Result<NormativeModel, LoadError> {
    let path = base_dir.join(name);
    let raw = fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.clone(),
        source,
    })?;
    normalize_model(document)
}

/// Normalizes an already-parsed model document into the flat shape the
/// verifier and interpreter consume.
pub fn normalize_model(document: Value) -> Result<NormativeModel, LoadError> {
    let document_kind = document
        .get("tipo")
        .and_then(Value::as_str)
        .map(str::to_owned);

    match document_kind.as_deref() {
        Some("super_modelo") => {
            let super_model: SuperModelDocument = serde_json::from_value(document)?;
            flatten_super_model(super_model)
        }
        Some("composto") => Err(LoadError::CompositeUnsupported),
        _ => {
            if document.get("nos").is_none() {
                return Err(LoadError::MissingNodes);
            }
            Ok(serde_json::from_value(document)?)
        }
    }
}

/// Flattens a super-model into a single graph. Node ids must be unique
/// across all modules; the first collision aborts the load.
pub fn flatten_super_model(document: SuperModelDocument) -> Result<NormativeModel, LoadError> {
    if document.modules.is_empty() {
        return Err(LoadError::NoModules);
    }
    let root = match document.root {
        Some(root) if !root.is_empty() => root,
        _ => return Err(LoadError::MissingRoot),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut nodes = Vec::new();
    for (module, content) in document.modules {
        for node in content.nodes {
            if node.id.is_empty() {
                return Err(LoadError::NodeWithoutId { module });
            }
            if !seen.insert(node.id.clone()) {
                return Err(LoadError::DuplicateNodeId { id: node.id });
            }
            nodes.push(node);
        }
    }

    Ok(NormativeModel::new(nodes, Some(root)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn atomic_model_passes_through() {
        let model = normalize_model(json!({
            "nos": [{"id": "x", "tipo": "constante", "dependencias": []}],
            "raiz": "x"
        }))
        .unwrap();
        assert_eq!(model.len(), 1);
        assert_eq!(model.root.as_deref(), Some("x"));
    }

    #[test]
    fn atomic_model_without_nodes_key_is_rejected() {
        let err = normalize_model(json!({"raiz": "x"})).unwrap_err();
        assert!(matches!(err, LoadError::MissingNodes));
    }

    #[test]
    fn super_model_is_flattened_across_modules() {
        let model = normalize_model(json!({
            "tipo": "super_modelo",
            "modulos": {
                "remuneracao": {"nos": [{"id": "x", "tipo": "constante", "dependencias": []}]},
                "totais": {"nos": [{"id": "y", "tipo": "soma", "dependencias": ["x", "x"]}]}
            },
            "raiz": "y"
        }))
        .unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.root.as_deref(), Some("y"));
    }

    #[test]
    fn super_model_requires_an_explicit_root() {
        let err = normalize_model(json!({
            "tipo": "super_modelo",
            "modulos": {"m": {"nos": [{"id": "x", "tipo": "constante"}]}}
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingRoot));
    }

    #[test]
    fn cross_module_id_collision_is_a_load_error() {
        let err = normalize_model(json!({
            "tipo": "super_modelo",
            "modulos": {
                "a": {"nos": [{"id": "x", "tipo": "constante"}]},
                "b": {"nos": [{"id": "x", "tipo": "constante"}]}
            },
            "raiz": "x"
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateNodeId { id } if id == "x"));
    }

    #[test]
    fn composite_models_are_explicitly_unsupported() {
        let err = normalize_model(json!({"tipo": "composto"})).unwrap_err();
        assert!(matches!(err, LoadError::CompositeUnsupported));
    }

    #[test]
    fn load_model_reads_from_the_injected_directory() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("modelo.json"),
            r#"{"nos": [{"id": "x", "tipo": "constante", "dependencias": []}]}"#,
        )
        .unwrap();

        let model = load_model(dir.path(), "modelo.json").unwrap();
        assert_eq!(model.len(), 1);

        let err = load_model(dir.path(), "inexistente.json").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

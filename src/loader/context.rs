//! Loads value contexts: atomic flat documents and super-contexts
//! flattened across modules with duplicate-key detection.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::error::LoadError;
use crate::context::{Context, ContextEntry};

/// The modular, pre-merge form of a context.
#[derive(Debug, Clone, Deserialize)]
pub struct SuperContextDocument {
    #[serde(rename = "modulos", default)]
    pub modules: BTreeMap<String, BTreeMap<String, ContextEntry>>,
}

/// Single entry point for loading a context file from an injected base
/// directory.
pub fn load_context(base_dir: &Path, name: &str) -> Result<Context, LoadError> {
    let path = base_dir.join(name);
    let raw = fs::read_to_string(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: path.clone(),
        source,
    })?;
    normalize_context(document)
}

/// Normalizes an already-parsed context document into the flat mapping
/// the interpreter consumes.
pub fn normalize_context(document: Value) -> Result<Context, LoadError> {
    let document_kind = document
        .get("tipo")
        .and_then(Value::as_str)
        .map(str::to_owned);

    if document_kind.as_deref() == Some("super_contexto") {
        let super_context: SuperContextDocument = serde_json::from_value(document)?;
        return flatten_super_context(super_context);
    }

    let map = match document {
        Value::Object(map) => map,
        _ => return Err(LoadError::ContextNotObject),
    };
    let mut context = Context::new();
    for (key, value) in map {
        // "tipo" and "meta" are envelope keys, never context entries.
        if key == "tipo" || key == "meta" {
            continue;
        }
        let entry: ContextEntry = serde_json::from_value(value)?;
        context.insert(key, entry);
    }
    Ok(context)
}

/// Flattens a super-context into a single mapping. Keys must be unique
/// across all modules; the first collision aborts the load.
pub fn flatten_super_context(document: SuperContextDocument) -> Result<Context, LoadError> {
    if document.modules.is_empty() {
        return Err(LoadError::NoModules);
    }

    let mut context = Context::new();
    for (_, entries) in document.modules {
        for (key, entry) in entries {
            if context.contains_key(&key) {
                return Err(LoadError::DuplicateContextKey { key });
            }
            context.insert(key, entry);
        }
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn atomic_context_passes_through() {
        let context = normalize_context(json!({
            "x": {"valor": 1412.0, "origem": "norma", "referencia_documental": null},
            "y": {"valor": [1.0, 2.0], "origem": "decisao_gestor"}
        }))
        .unwrap();
        assert_eq!(context.len(), 2);
        assert_eq!(context["x"].value.finalized(), Some(1412.0));
        assert_eq!(context["y"].value.finalized(), None);
    }

    #[test]
    fn non_object_context_is_rejected() {
        let err = normalize_context(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, LoadError::ContextNotObject));
    }

    #[test]
    fn super_context_is_flattened_across_modules() {
        let context = normalize_context(json!({
            "tipo": "super_contexto",
            "modulos": {
                "a": {"x": {"valor": 1.0, "origem": "norma"}},
                "b": {"y": {"valor": 2.0, "origem": "norma"}}
            }
        }))
        .unwrap();
        assert_eq!(context.len(), 2);
        assert_eq!(context["y"].value.finalized(), Some(2.0));
    }

    #[test]
    fn cross_module_key_collision_is_a_load_error() {
        let err = normalize_context(json!({
            "tipo": "super_contexto",
            "modulos": {
                "a": {"x": {"valor": 1.0, "origem": "norma"}},
                "b": {"x": {"valor": 2.0, "origem": "norma"}}
            }
        }))
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateContextKey { key } if key == "x"));
    }

    #[test]
    fn load_context_reads_from_the_injected_directory() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("contexto.json"),
            r#"{"x": {"valor": 10.0, "origem": "norma"}}"#,
        )
        .unwrap();

        let context = load_context(dir.path(), "contexto.json").unwrap();
        assert_eq!(context["x"].value.finalized(), Some(10.0));
    }
}

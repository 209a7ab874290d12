//! Immutable, versioned persistence of executions.
//!
//! One append-only JSON artifact per execution, named by the execution
//! id. No update or delete operation exists. The store directory is
//! injected at construction; the engine itself never touches the
//! filesystem.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::error::AuditError;
use super::hash::canonical_hash;
use crate::context::{Context, ContextEntry};
use crate::interpreter::{ExecutionResult, Trail};
use crate::model::{NormativeModel, OperatorKind};

pub const PERSISTENCE_FORMAT_VERSION: &str = "1.0.0";

/// Identification block of a persisted execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMeta {
    #[serde(rename = "id_execucao")]
    pub execution_id: String,
    #[serde(rename = "formato_persistencia_version")]
    pub format_version: String,
    #[serde(rename = "data_execucao_utc")]
    pub executed_at_utc: String,
    #[serde(rename = "no_raiz")]
    pub root_id: String,
    #[serde(rename = "hash_modelo_normativo")]
    pub model_hash: String,
    #[serde(rename = "hash_contexto")]
    pub context_hash: String,
}

/// The context entry behind one evaluated leaf, or an explicit absence
/// marker so a hole in the context is itself auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionExcerpt {
    #[serde(rename = "presente_no_contexto")]
    pub present: bool,
    #[serde(rename = "conteudo")]
    pub entry: Option<ContextEntry>,
}

/// The full persisted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(rename = "meta_execucao")]
    pub meta: ExecutionMeta,
    #[serde(rename = "resultado")]
    pub result: ExecutionResult,
    #[serde(rename = "decisoes_humanas")]
    pub human_decisions: BTreeMap<String, DecisionExcerpt>,
}

/// Handle returned by a successful write.
#[derive(Debug, Clone)]
pub struct RecordedExecution {
    pub record: ExecutionRecord,
    pub path: PathBuf,
}

pub struct ExecutionStore {
    directory: PathBuf,
}

impl ExecutionStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Snapshots one completed execution.
    ///
    /// The execution id is a UTC timestamp at microsecond resolution plus
    /// a short random suffix: collision-resistant, sortable and
    /// human-legible. The artifact is created exclusively; an id
    /// collision surfaces as an error instead of overwriting history.
    pub fn record(
        &self,
        model: &NormativeModel,
        context: &Context,
        result: &ExecutionResult,
    ) -> Result<RecordedExecution, AuditError> {
        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let execution_id = format!(
            "execucao_{}_{}",
            now.format("%Y%m%d_%H%M%S_%6f"),
            &suffix[..8]
        );

        let meta = ExecutionMeta {
            execution_id: execution_id.clone(),
            format_version: PERSISTENCE_FORMAT_VERSION.to_string(),
            executed_at_utc: now.to_rfc3339_opts(SecondsFormat::Micros, true),
            root_id: result.root_id.clone(),
            model_hash: canonical_hash(model)?,
            context_hash: canonical_hash(context)?,
        };
        let record = ExecutionRecord {
            meta,
            result: result.clone(),
            human_decisions: human_decisions(context, &result.trail),
        };

        fs::create_dir_all(&self.directory).map_err(|source| AuditError::Io {
            path: self.directory.clone(),
            source,
        })?;
        let path = self.directory.join(format!("{execution_id}.json"));
        // Pretty-printed for manual audit, like every other artifact here.
        let payload = serde_json::to_string_pretty(&record)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| AuditError::Io {
                path: path.clone(),
                source,
            })?;
        file.write_all(payload.as_bytes())
            .map_err(|source| AuditError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(execution_id = %record.meta.execution_id, path = %path.display(), "execution recorded");
        Ok(RecordedExecution { record, path })
    }
}

/// The decision excerpt: for every leaf node of the trail, the matching
/// context entry with its provenance, or an absence marker.
fn human_decisions(context: &Context, trail: &Trail) -> BTreeMap<String, DecisionExcerpt> {
    let mut decisions = BTreeMap::new();
    for (id, node) in trail.iter() {
        let is_leaf = OperatorKind::parse(&node.kind).map_or(false, OperatorKind::is_leaf)
            || node.dependencies.is_empty();
        if !is_leaf {
            continue;
        }
        let excerpt = match context.get(id) {
            Some(entry) => DecisionExcerpt {
                present: true,
                entry: Some(entry.clone()),
            },
            None => DecisionExcerpt {
                present: false,
                entry: None,
            },
        };
        decisions.insert(id.to_string(), excerpt);
    }
    decisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::entry;
    use crate::interpreter::Interpreter;
    use crate::model::Node;
    use tempfile::tempdir;

    fn node(id: &str, kind: &str, deps: &[&str]) -> Node {
        Node {
            id: id.into(),
            kind: kind.into(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            legal_metadata: None,
        }
    }

    fn sample() -> (NormativeModel, Context, ExecutionResult) {
        let model = NormativeModel::new(
            vec![
                node("x", "constante", &[]),
                node("y", "referencia", &[]),
                node("z", "soma", &["x", "y"]),
            ],
            Some("z".into()),
        );
        let mut context = Context::new();
        context.insert("x".into(), entry(10.0, "norma", Some("salario minimo")));
        context.insert("y".into(), entry(5.0, "decisao_gestor", None));
        let result = Interpreter::new(&model, &context).execute("z").unwrap();
        (model, context, result)
    }

    #[test]
    fn record_writes_one_artifact_named_by_execution_id() {
        let dir = tempdir().expect("tempdir");
        let store = ExecutionStore::new(dir.path().join("execucoes"));
        let (model, context, result) = sample();

        let recorded = store.record(&model, &context, &result).unwrap();
        assert!(recorded.path.exists());
        assert_eq!(
            recorded.path.file_name().unwrap().to_str().unwrap(),
            format!("{}.json", recorded.record.meta.execution_id)
        );
        assert!(recorded
            .record
            .meta
            .execution_id
            .starts_with("execucao_20"));

        let raw = fs::read_to_string(&recorded.path).unwrap();
        let reloaded: ExecutionRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(reloaded, recorded.record);
        assert_eq!(reloaded.meta.format_version, PERSISTENCE_FORMAT_VERSION);
        assert_eq!(reloaded.result.final_value, 15.0);
    }

    #[test]
    fn record_hashes_model_and_context_separately() {
        let dir = tempdir().expect("tempdir");
        let store = ExecutionStore::new(dir.path());
        let (model, context, result) = sample();

        let recorded = store.record(&model, &context, &result).unwrap();
        assert_eq!(
            recorded.record.meta.model_hash,
            canonical_hash(&model).unwrap()
        );
        assert_eq!(
            recorded.record.meta.context_hash,
            canonical_hash(&context).unwrap()
        );
        assert_ne!(
            recorded.record.meta.model_hash,
            recorded.record.meta.context_hash
        );
    }

    #[test]
    fn decision_excerpt_covers_exactly_the_evaluated_leaves() {
        let dir = tempdir().expect("tempdir");
        let store = ExecutionStore::new(dir.path());
        let (model, context, result) = sample();

        let recorded = store.record(&model, &context, &result).unwrap();
        let decisions = &recorded.record.human_decisions;
        assert_eq!(decisions.len(), 2);
        assert!(decisions["x"].present);
        assert_eq!(
            decisions["x"].entry.as_ref().unwrap().documentary_reference,
            Some("salario minimo".into())
        );
        assert_eq!(decisions["y"].entry.as_ref().unwrap().origin, "decisao_gestor");
        assert!(!decisions.contains_key("z"));
    }

    #[test]
    fn absent_context_entry_is_marked_not_silently_dropped() {
        let mut trail = Trail::default();
        trail.push(
            "orfao",
            crate::interpreter::EvaluatedNode {
                kind: "constante".into(),
                dependencies: vec![],
                computed_value: 0.0,
                legal_metadata: Default::default(),
            },
        );
        let decisions = human_decisions(&Context::new(), &trail);
        assert!(!decisions["orfao"].present);
        assert!(decisions["orfao"].entry.is_none());
    }

    #[test]
    fn successive_records_get_distinct_ids() {
        let dir = tempdir().expect("tempdir");
        let store = ExecutionStore::new(dir.path());
        let (model, context, result) = sample();

        let first = store.record(&model, &context, &result).unwrap();
        let second = store.record(&model, &context, &result).unwrap();
        assert_ne!(
            first.record.meta.execution_id,
            second.record.meta.execution_id
        );
        assert!(first.path.exists() && second.path.exists());
    }
}

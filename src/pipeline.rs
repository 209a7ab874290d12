//! The single canonical execution flow: verify, evaluate, and
//! optionally persist. Nothing else composes the components; the
//! verifier and interpreter stay free of any I/O.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::audit::{AuditError, ExecutionStore, RecordedExecution};
use crate::context::Context;
use crate::interpreter::{EvaluationError, ExecutionResult, Interpreter};
use crate::loader::{self, LoadError};
use crate::model::NormativeModel;
use crate::validation::{StaticVerifier, ValidationError};

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Verification failed; the payload carries every structural error
    /// found, and the interpreter was never invoked.
    #[error("model failed static verification with {} error(s)", .0.len())]
    InvalidModel(Vec<ValidationError>),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Verifies the model, then evaluates `root_id` against the context.
/// An unverified model never reaches the interpreter.
#[instrument(skip_all, fields(root = %root_id))]
pub fn execute(
    model: &NormativeModel,
    context: &Context,
    root_id: &str,
) -> Result<ExecutionResult, PipelineError> {
    StaticVerifier::validate(model).map_err(PipelineError::InvalidModel)?;
    let result = Interpreter::new(model, context).execute(root_id)?;
    debug!(
        final_value = result.final_value,
        evaluated = result.trail.len(),
        "execution finished"
    );
    Ok(result)
}

/// Like [`execute`], additionally snapshotting the execution through the
/// injected store.
pub fn execute_and_record(
    model: &NormativeModel,
    context: &Context,
    root_id: &str,
    store: &ExecutionStore,
) -> Result<(ExecutionResult, RecordedExecution), PipelineError> {
    let result = execute(model, context, root_id)?;
    let recorded = store.record(model, context, &result)?;
    Ok((result, recorded))
}

/// The from-files variant: loads model and context through the loaders,
/// then runs the same flow.
pub fn execute_from_files(
    models_dir: &Path,
    model_name: &str,
    contexts_dir: &Path,
    context_name: &str,
    root_id: &str,
    store: Option<&ExecutionStore>,
) -> Result<ExecutionResult, PipelineError> {
    let model = loader::load_model(models_dir, model_name)?;
    let context = loader::load_context(contexts_dir, context_name)?;
    let result = execute(&model, &context, root_id)?;
    if let Some(store) = store {
        store.record(&model, &context, &result)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::entry;
    use crate::model::Node;
    use std::fs;
    use tempfile::tempdir;

    fn node(id: &str, kind: &str, deps: &[&str]) -> Node {
        Node {
            id: id.into(),
            kind: kind.into(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            legal_metadata: None,
        }
    }

    #[test]
    fn invalid_model_never_reaches_evaluation() {
        let model = NormativeModel::new(
            vec![
                node("leaf", "constante", &[]),
                node("a", "soma", &["b", "leaf"]),
                node("b", "soma", &["a", "leaf"]),
            ],
            None,
        );
        // An empty context would also fail evaluation; the error must be
        // the verification one.
        let err = execute(&model, &Context::new(), "a").unwrap_err();
        match err {
            PipelineError::InvalidModel(errors) => assert!(!errors.is_empty()),
            other => panic!("expected InvalidModel, got {other:?}"),
        }
    }

    #[test]
    fn verified_model_evaluates_and_records() {
        let model = NormativeModel::new(
            vec![
                node("x", "constante", &[]),
                node("y", "constante", &[]),
                node("z", "soma", &["x", "y"]),
            ],
            Some("z".into()),
        );
        let mut context = Context::new();
        context.insert("x".into(), entry(10.0, "norma", None));
        context.insert("y".into(), entry(5.0, "decisao_gestor", None));

        let dir = tempdir().expect("tempdir");
        let store = ExecutionStore::new(dir.path().join("execucoes"));
        let (result, recorded) = execute_and_record(&model, &context, "z", &store).unwrap();

        assert_eq!(result.final_value, 15.0);
        assert!(recorded.path.exists());
        assert_eq!(recorded.record.result, result);
    }

    #[test]
    fn from_files_flow_loads_verifies_evaluates_and_persists() {
        let dir = tempdir().expect("tempdir");
        let models = dir.path().join("modelos");
        let contexts = dir.path().join("contextos");
        fs::create_dir_all(&models).unwrap();
        fs::create_dir_all(&contexts).unwrap();
        fs::write(
            models.join("diarias.json"),
            r#"{
                "tipo": "super_modelo",
                "modulos": {
                    "base": {"nos": [
                        {"id": "valor_diaria", "tipo": "constante", "dependencias": []},
                        {"id": "quantidade", "tipo": "referencia", "dependencias": []}
                    ]},
                    "totais": {"nos": [
                        {"id": "total", "tipo": "multiplicacao",
                         "dependencias": ["valor_diaria", "quantidade"]}
                    ]}
                },
                "raiz": "total"
            }"#,
        )
        .unwrap();
        fs::write(
            contexts.join("agosto.json"),
            r#"{
                "tipo": "super_contexto",
                "modulos": {
                    "base": {
                        "valor_diaria": {"valor": 320.0, "origem": "norma"},
                        "quantidade": {"valor": 3.0, "origem": "decisao_gestor"}
                    }
                }
            }"#,
        )
        .unwrap();

        let store = ExecutionStore::new(dir.path().join("execucoes"));
        let result = execute_from_files(
            &models,
            "diarias.json",
            &contexts,
            "agosto.json",
            "total",
            Some(&store),
        )
        .unwrap();

        assert_eq!(result.final_value, 960.0);
        let artifacts: Vec<_> = fs::read_dir(store.directory())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(artifacts.len(), 1);
    }
}

//! Versioned persistence of operator-edited context blocks.
//!
//! A context snapshot is the durable form of the human decisions feeding
//! an evaluation: who fixed the values, when, and on what documentary
//! evidence. Like execution records, snapshots are write-once.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::error::AuditError;
use super::hash::canonical_hash;
use crate::context::ContextEntry;

pub const CONTEXT_FORMAT_VERSION: &str = "1.0.0";

/// Context entries grouped by named block (e.g. "remuneracao", "insumos").
pub type ContextBlocks = BTreeMap<String, BTreeMap<String, ContextEntry>>;

/// Authorship block of a persisted context snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshotMeta {
    #[serde(rename = "id_contexto")]
    pub context_id: String,
    #[serde(rename = "formato_contexto_version")]
    pub format_version: String,
    #[serde(rename = "autor")]
    pub author: String,
    #[serde(rename = "data_criacao_utc")]
    pub created_at_utc: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "fonte_evidencia")]
    pub evidence_sources: Vec<String>,
    /// Hash of the whole snapshot with this field absent.
    #[serde(rename = "hash_contexto", default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SavedContext {
    pub context_id: String,
    pub path: PathBuf,
}

pub struct ContextStore {
    directory: PathBuf,
}

impl ContextStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persists one auditable context snapshot: a `meta` block plus the
    /// context blocks at the top level, content-hashed as a whole.
    pub fn save(
        &self,
        blocks: &ContextBlocks,
        author: &str,
        description: &str,
        evidence_sources: &[String],
    ) -> Result<SavedContext, AuditError> {
        if blocks.is_empty() {
            return Err(AuditError::EmptyContext);
        }
        // A block named "meta" would collide with the snapshot's own
        // meta block and corrupt the artifact.
        if blocks.contains_key("meta") {
            return Err(AuditError::ReservedBlockName {
                name: "meta".into(),
            });
        }

        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let context_id = format!("contexto_{}_{}", now.format("%Y%m%d_%H%M%S_%6f"), &suffix[..6]);

        let mut meta = ContextSnapshotMeta {
            context_id: context_id.clone(),
            format_version: CONTEXT_FORMAT_VERSION.to_string(),
            author: author.to_string(),
            created_at_utc: now.to_rfc3339_opts(SecondsFormat::Micros, true),
            description: description.to_string(),
            evidence_sources: evidence_sources.to_vec(),
            content_hash: None,
        };

        let mut document = json!({ "meta": &meta });
        for (name, block) in blocks {
            document[name.as_str()] = serde_json::to_value(block)?;
        }
        meta.content_hash = Some(canonical_hash(&document)?);
        document["meta"] = serde_json::to_value(&meta)?;

        fs::create_dir_all(&self.directory).map_err(|source| AuditError::Io {
            path: self.directory.clone(),
            source,
        })?;
        let path = self.directory.join(format!("{context_id}.json"));
        let payload = serde_json::to_string_pretty(&document)?;
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

        debug!(context_id = %context_id, path = %path.display(), "context snapshot saved");
        Ok(SavedContext { context_id, path })
    }
}

/// Reads back the `meta` block of a persisted snapshot document.
pub fn snapshot_meta(document: &Value) -> Option<ContextSnapshotMeta> {
    document
        .get("meta")
        .and_then(|meta| serde_json::from_value(meta.clone()).ok())
}

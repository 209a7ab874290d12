//! The context of externally supplied values a model is evaluated against.
pub mod scaffold;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A context value. A number once the decision behind it is finalized; a
/// list of candidate numbers while it is still open. Evaluation refuses
/// candidate lists, it never picks one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Number(f64),
    Candidates(Vec<f64>),
}

impl ContextValue {
    /// The finalized number, if any.
    pub fn finalized(&self) -> Option<f64> {
        match self {
            ContextValue::Number(value) => Some(*value),
            ContextValue::Candidates(_) => None,
        }
    }
}

/// One externally supplied value with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    #[serde(rename = "valor")]
    pub value: ContextValue,
    /// Provenance tag, e.g. "norma" or "decisao_gestor".
    #[serde(rename = "origem")]
    pub origin: String,
    #[serde(rename = "referencia_documental", default)]
    pub documentary_reference: Option<String>,
}

/// Flat mapping from key to entry; keys correspond 1:1 to the leaf node
/// ids of the model under evaluation.
pub type Context = BTreeMap<String, ContextEntry>;

/// Convenience constructor for a finalized entry.
pub fn entry(value: f64, origin: &str, documentary_reference: Option<&str>) -> ContextEntry {
    ContextEntry {
        value: ContextValue::Number(value),
        origin: origin.to_string(),
        documentary_reference: documentary_reference.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_deserializes_number_or_candidates() {
        let single: ContextEntry =
            serde_json::from_str(r#"{"valor": 1412.0, "origem": "norma"}"#).unwrap();
        assert_eq!(single.value.finalized(), Some(1412.0));
        assert!(single.documentary_reference.is_none());

        let open: ContextEntry = serde_json::from_str(
            r#"{"valor": [5.0, 7.5], "origem": "decisao_gestor", "referencia_documental": null}"#,
        )
        .unwrap();
        assert_eq!(open.value.finalized(), None);
        assert_eq!(open.value, ContextValue::Candidates(vec![5.0, 7.5]));
    }
}

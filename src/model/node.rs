//! Defines the `Node` and its associated types, representing a single
//! operator or value reference in a normative model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of operators a normative model may use.
///
/// The operator set is fixed by design; dispatch is an exhaustive match,
/// never a runtime registry. Wire names are the Portuguese identifiers of
/// the external model format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// A leaf whose value is fixed by norm and resolved from the context.
    Constant,
    /// A leaf whose value is a managerial decision, also resolved from the
    /// context. Distinguished from `Constant` only for audit clarity.
    Reference,
    Sum,
    Product,
    Difference,
    Quotient,
    Power,
    Root,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 8] = [
        OperatorKind::Constant,
        OperatorKind::Reference,
        OperatorKind::Sum,
        OperatorKind::Product,
        OperatorKind::Difference,
        OperatorKind::Quotient,
        OperatorKind::Power,
        OperatorKind::Root,
    ];

    /// Parses a wire-format kind name. Unknown names return `None` so the
    /// verifier can flag them instead of failing at deserialization.
    pub fn parse(wire: &str) -> Option<Self> {
        match wire {
            "constante" => Some(OperatorKind::Constant),
            "referencia" => Some(OperatorKind::Reference),
            "soma" => Some(OperatorKind::Sum),
            "multiplicacao" => Some(OperatorKind::Product),
            "subtracao" => Some(OperatorKind::Difference),
            "divisao" => Some(OperatorKind::Quotient),
            "potencia" => Some(OperatorKind::Power),
            "raiz" => Some(OperatorKind::Root),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            OperatorKind::Constant => "constante",
            OperatorKind::Reference => "referencia",
            OperatorKind::Sum => "soma",
            OperatorKind::Product => "multiplicacao",
            OperatorKind::Difference => "subtracao",
            OperatorKind::Quotient => "divisao",
            OperatorKind::Power => "potencia",
            OperatorKind::Root => "raiz",
        }
    }

    /// Leaves resolve from the context; everything else computes.
    pub fn is_leaf(self) -> bool {
        matches!(self, OperatorKind::Constant | OperatorKind::Reference)
    }

    /// The dependency count each operator admits.
    pub fn arity(self) -> Arity {
        match self {
            OperatorKind::Constant | OperatorKind::Reference => Arity::Exactly(0),
            OperatorKind::Power | OperatorKind::Root => Arity::Exactly(2),
            OperatorKind::Sum
            | OperatorKind::Product
            | OperatorKind::Difference
            | OperatorKind::Quotient => Arity::AtLeast(2),
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Dependency-count requirement of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn admits(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(0) => write!(f, "no dependencies"),
            Arity::Exactly(n) => write!(f, "exactly {n} dependencies"),
            Arity::AtLeast(n) => write!(f, "at least {n} dependencies"),
        }
    }
}

/// Legal annotation attached to a node. Carried through to the audit trail
/// verbatim; evaluation never reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegalMetadata {
    #[serde(rename = "fundamento_legal", default, skip_serializing_if = "Option::is_none")]
    pub legal_basis: Option<String>,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Free-form annotations beyond the known fields. Preserved so the
    /// content hash of a model reflects every authored byte.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LegalMetadata {
    pub fn is_empty(&self) -> bool {
        self.legal_basis.is_none()
            && self.description.is_none()
            && self.notes.is_none()
            && self.extra.is_empty()
    }
}

/// One entry of a normative model.
///
/// The kind stays a wire string here; the verifier is the component that
/// flags unknown kinds, and it must be able to report them alongside every
/// other structural problem rather than aborting the parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "tipo")]
    pub kind: String,
    /// Ordered; order is significant for `subtracao`, `divisao`,
    /// `potencia` and `raiz`.
    #[serde(rename = "dependencias", default)]
    pub dependencies: Vec<String>,
    #[serde(rename = "metadados_juridicos", default, skip_serializing_if = "Option::is_none")]
    pub legal_metadata: Option<LegalMetadata>,
}

impl Node {
    pub fn operator(&self) -> Option<OperatorKind> {
        OperatorKind::parse(&self.kind)
    }
}

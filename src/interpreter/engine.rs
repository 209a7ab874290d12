//! A synchronous, single-threaded evaluation engine.
//!
//! Memoized depth-first evaluation keyed by node id: the dependency DAG
//! is walked with an explicit work stack into a post-order evaluation
//! sequence, then each node is computed exactly once with its operands
//! already in the memo table. Errors surface in pre-order, fail-fast.
//!
//! Numeric semantics are strict. Every operation that could silently
//! produce a non-real or undefined value (zero division, even root of a
//! negative, fractional power of a negative base) is rejected with a
//! typed error instead of propagating NaN.

use std::collections::{BTreeMap, HashMap, HashSet};

use smallvec::SmallVec;

use super::trail::{EvaluatedNode, EvaluationError, ExecutionResult, Trail};
use crate::context::{Context, ContextValue};
use crate::model::{Node, NormativeModel, OperatorKind};

pub struct Interpreter<'a> {
    index: HashMap<&'a str, &'a Node>,
    context: &'a Context,
    memo: HashMap<&'a str, f64>,
    trail: Trail,
    evaluated: BTreeMap<String, EvaluatedNode>,
}

impl<'a> Interpreter<'a> {
    /// The model must already have passed static verification; the
    /// engine re-checks only what it cannot afford to assume.
    pub fn new(model: &'a NormativeModel, context: &'a Context) -> Self {
        Self {
            index: model.index(),
            context,
            memo: HashMap::new(),
            trail: Trail::default(),
            evaluated: BTreeMap::new(),
        }
    }

    /// Evaluates `root_id` and returns the full execution result. The
    /// memo table and trail live and die with this one execution.
    pub fn execute(mut self, root_id: &str) -> Result<ExecutionResult, EvaluationError> {
        for (id, node) in self.evaluation_order(root_id)? {
            let value = self.compute_node(id, node)?;
            self.commit(id, node, value);
        }

        let final_value = self
            .memo
            .get(root_id)
            .copied()
            .ok_or_else(|| EvaluationError::MissingNode {
                id: root_id.to_string(),
            })?;

        Ok(ExecutionResult {
            root_id: root_id.to_string(),
            final_value,
            trail: self.trail,
            evaluated_nodes: self.evaluated,
        })
    }

    /// Builds the post-order evaluation sequence below `root_id` with an
    /// explicit frame stack, visiting each node once. Missing nodes are
    /// discovered in pre-order, before anything is computed.
    fn evaluation_order(
        &self,
        root_id: &str,
    ) -> Result<Vec<(&'a str, &'a Node)>, EvaluationError> {
        let (root_key, root_node) = match self.index.get_key_value(root_id) {
            Some((key, node)) => (*key, *node),
            None => {
                return Err(EvaluationError::MissingNode {
                    id: root_id.to_string(),
                })
            }
        };

        let mut order = Vec::new();
        let mut discovered: HashSet<&'a str> = HashSet::new();
        let mut in_progress: HashSet<&'a str> = HashSet::new();
        discovered.insert(root_key);
        in_progress.insert(root_key);
        let mut stack: Vec<(&'a str, &'a Node, usize)> = vec![(root_key, root_node, 0)];

        while !stack.is_empty() {
            let top = stack.len() - 1;
            let (_, node, cursor) = stack[top];
            if let Some(dependency) = node.dependencies.get(cursor) {
                stack[top].2 += 1;
                let (dep_key, dep_node) = match self.index.get_key_value(dependency.as_str()) {
                    Some((key, node)) => (*key, *node),
                    None => {
                        return Err(EvaluationError::MissingNode {
                            id: dependency.clone(),
                        })
                    }
                };
                // Impossible after verification, like everything defensive
                // here: an unverified cyclic model must fail, not panic on
                // a missing memo entry later.
                if in_progress.contains(dep_key) {
                    return Err(EvaluationError::CycleDetected {
                        id: dependency.clone(),
                    });
                }
                if discovered.insert(dep_key) {
                    in_progress.insert(dep_key);
                    stack.push((dep_key, dep_node, 0));
                }
            } else if let Some((id, node, _)) = stack.pop() {
                in_progress.remove(id);
                order.push((id, node));
            }
        }

        Ok(order)
    }

    fn compute_node(&self, id: &str, node: &Node) -> Result<f64, EvaluationError> {
        // Impossible after verification; kept as a typed error because an
        // unverified model here must fail loudly, not panic.
        let kind = match node.operator() {
            Some(kind) => kind,
            None => {
                return Err(EvaluationError::UnknownKind {
                    id: id.to_string(),
                    kind: node.kind.clone(),
                })
            }
        };

        if kind.is_leaf() {
            return self.resolve_leaf(id);
        }

        let operands: SmallVec<[f64; 8]> = node
            .dependencies
            .iter()
            .map(|dep| {
                *self
                    .memo
                    .get(dep.as_str())
                    .expect("dependency evaluated before its consumer")
            })
            .collect();

        match kind {
            OperatorKind::Sum => Ok(operands.iter().sum()),
            OperatorKind::Product => Ok(operands.iter().product()),
            OperatorKind::Difference => {
                self.require_operands(id, kind, operands.len())?;
                Ok(operands[0] - operands[1..].iter().sum::<f64>())
            }
            OperatorKind::Quotient => {
                self.require_operands(id, kind, operands.len())?;
                let mut value = operands[0];
                for (offset, divisor) in operands[1..].iter().enumerate() {
                    if *divisor == 0.0 {
                        return Err(EvaluationError::DivisionByZero {
                            id: id.to_string(),
                            position: offset + 2,
                        });
                    }
                    value /= divisor;
                }
                Ok(value)
            }
            OperatorKind::Power => {
                self.require_operands(id, kind, operands.len())?;
                let (base, exponent) = (operands[0], operands[1]);
                if base < 0.0 && exponent.fract() != 0.0 {
                    return Err(EvaluationError::NonRealResult { id: id.to_string() });
                }
                Ok(base.powf(exponent))
            }
            OperatorKind::Root => {
                self.require_operands(id, kind, operands.len())?;
                let (radicand, index) = (operands[0], operands[1]);
                if index == 0.0 || index.fract() != 0.0 {
                    return Err(EvaluationError::InvalidRootIndex {
                        id: id.to_string(),
                        index,
                    });
                }
                if radicand < 0.0 {
                    if (index as i64) % 2 == 0 {
                        return Err(EvaluationError::NonRealResult { id: id.to_string() });
                    }
                    // Odd root of a negative radicand is real; powf alone
                    // would yield NaN, so the sign is taken out first.
                    return Ok(-((-radicand).powf(index.recip())));
                }
                Ok(radicand.powf(index.recip()))
            }
            OperatorKind::Constant | OperatorKind::Reference => {
                unreachable!("leaves resolve from the context")
            }
        }
    }

    /// `constante` and `referencia` resolve identically from the context;
    /// the two kinds exist for audit and legal clarity only.
    fn resolve_leaf(&self, id: &str) -> Result<f64, EvaluationError> {
        let entry =
            self.context
                .get(id)
                .ok_or_else(|| EvaluationError::MissingContextValue {
                    id: id.to_string(),
                })?;
        match &entry.value {
            ContextValue::Number(value) => Ok(*value),
            ContextValue::Candidates(candidates) => Err(EvaluationError::DecisionNotFinalized {
                id: id.to_string(),
                candidates: candidates.len(),
            }),
        }
    }

    fn require_operands(
        &self,
        id: &str,
        kind: OperatorKind,
        actual: usize,
    ) -> Result<(), EvaluationError> {
        let required = kind.arity();
        if required.admits(actual) {
            Ok(())
        } else {
            Err(EvaluationError::OperandCountMismatch {
                id: id.to_string(),
                kind: kind.as_wire().to_string(),
                required,
                actual,
            })
        }
    }

    fn commit(&mut self, id: &'a str, node: &Node, value: f64) {
        self.memo.insert(id, value);
        let evaluated = EvaluatedNode {
            kind: node.kind.clone(),
            dependencies: node.dependencies.clone(),
            computed_value: value,
            legal_metadata: node.legal_metadata.clone().unwrap_or_default(),
        };
        self.trail.push(id, evaluated.clone());
        self.evaluated.insert(id.to_string(), evaluated);
    }
}

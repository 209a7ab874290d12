//! The static verifier that validates a model graph before any evaluation.
//!
//! Unlike evaluation, verification has no data-dependent order, so it
//! collects every detectable error in one pass. Operators auditing a model
//! should see all problems at once, not iterate one at a time.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use tracing::{debug, warn};

use super::error::ValidationError;
use crate::model::{Node, NormativeModel};

/// Orchestrates the structural checks over one model.
pub struct StaticVerifier<'a> {
    /// Indexed nodes in declaration order; duplicates and id-less nodes
    /// are excluded here and flagged in `errors`.
    order: Vec<&'a Node>,
    index: HashMap<&'a str, &'a Node>,
    errors: Vec<ValidationError>,
}

impl<'a> StaticVerifier<'a> {
    /// Runs every check against the model.
    ///
    /// # Returns
    /// - `Ok(())` if the model is structurally sound.
    /// - `Err(Vec<ValidationError>)` with every error discovered; the
    ///   model must never reach the interpreter in that case.
    pub fn validate(model: &'a NormativeModel) -> Result<(), Vec<ValidationError>> {
        let mut verifier = Self::index_nodes(model);
        verifier.check_kinds();
        verifier.check_references();
        verifier.check_arity();

        let graph = verifier.dependency_graph();
        verifier.check_cycles(&graph);
        verifier.check_reachability(&graph);

        if verifier.errors.is_empty() {
            debug!(nodes = model.len(), "model passed static verification");
            Ok(())
        } else {
            warn!(
                nodes = model.len(),
                errors = verifier.errors.len(),
                "model failed static verification"
            );
            Err(verifier.errors)
        }
    }

    fn index_nodes(model: &'a NormativeModel) -> Self {
        let mut errors = Vec::new();
        let mut index = HashMap::with_capacity(model.len());
        let mut order = Vec::with_capacity(model.len());

        for (position, node) in model.nodes.iter().enumerate() {
            if node.id.is_empty() {
                errors.push(ValidationError::EmptyId { position });
                continue;
            }
            if index.contains_key(node.id.as_str()) {
                errors.push(ValidationError::DuplicateId {
                    id: node.id.clone(),
                });
                continue;
            }
            index.insert(node.id.as_str(), node);
            order.push(node);
        }

        Self {
            order,
            index,
            errors,
        }
    }

    fn check_kinds(&mut self) {
        for node in self.order.iter().copied() {
            if node.operator().is_none() {
                self.errors.push(ValidationError::UnknownKind {
                    id: node.id.clone(),
                    kind: node.kind.clone(),
                });
            }
        }
    }

    fn check_references(&mut self) {
        for node in self.order.iter().copied() {
            for dependency in &node.dependencies {
                if !self.index.contains_key(dependency.as_str()) {
                    self.errors.push(ValidationError::DanglingReference {
                        id: node.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
    }

    fn check_arity(&mut self) {
        for node in self.order.iter().copied() {
            // Unknown kinds have no arity contract; check_kinds flags them.
            let kind = match node.operator() {
                Some(kind) => kind,
                None => continue,
            };
            let required = kind.arity();
            let actual = node.dependencies.len();
            if !required.admits(actual) {
                self.errors.push(ValidationError::ArityMismatch {
                    id: node.id.clone(),
                    kind: node.kind.clone(),
                    required,
                    actual,
                });
            }
        }
    }

    /// Builds the dependency graph over the indexed nodes, edges pointing
    /// node -> dependency. Dangling references carry no edge; they are
    /// already flagged by `check_references`.
    fn dependency_graph(&self) -> DiGraph<&'a str, ()> {
        let mut graph = DiGraph::with_capacity(self.order.len(), 0);
        let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(self.order.len());

        for node in self.order.iter().copied() {
            let idx = graph.add_node(node.id.as_str());
            indices.insert(node.id.as_str(), idx);
        }
        for node in self.order.iter().copied() {
            let from = indices[node.id.as_str()];
            for dependency in &node.dependencies {
                if let Some(&to) = indices.get(dependency.as_str()) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        graph
    }

    /// Exhaustive depth-first cycle search over all nodes, not only roots,
    /// so cycles unreachable from any root are still caught. Iterative
    /// with an explicit frame stack; depth is bounded by heap, not the
    /// host stack.
    fn check_cycles(&mut self, graph: &DiGraph<&'a str, ()>) {
        #[derive(Clone, Copy, PartialEq)]
        enum VisitState {
            New,
            Visiting,
            Visited,
        }

        let mut state = vec![VisitState::New; graph.node_count()];

        for start in graph.node_indices() {
            if state[start.index()] != VisitState::New {
                continue;
            }
            state[start.index()] = VisitState::Visiting;
            let mut stack = vec![(start, graph.neighbors(start).detach())];

            while !stack.is_empty() {
                let top = stack.len() - 1;
                match stack[top].1.next_node(graph) {
                    Some(dependency) => match state[dependency.index()] {
                        // Re-entering a node still on the stack is a cycle.
                        VisitState::Visiting => self.errors.push(ValidationError::Cycle {
                            id: graph[dependency].to_string(),
                        }),
                        VisitState::New => {
                            state[dependency.index()] = VisitState::Visiting;
                            stack.push((dependency, graph.neighbors(dependency).detach()));
                        }
                        VisitState::Visited => {}
                    },
                    None => {
                        if let Some((node, _)) = stack.pop() {
                            state[node.index()] = VisitState::Visited;
                        }
                    }
                }
            }
        }
    }

    /// Root candidates are the nodes never referenced as a dependency,
    /// excluding bare leaves: a consolidation point must consolidate a
    /// calculation, and an unreferenced constant is precisely the orphan
    /// this check exists to catch. Zero candidates is fatal; several are
    /// legitimate (disconnected sub-calculations). Every node must be
    /// reachable from at least one.
    fn check_reachability(&mut self, graph: &DiGraph<&'a str, ()>) {
        let candidates: Vec<NodeIndex> = graph
            .externals(Direction::Incoming)
            .filter(|idx| {
                self.index[graph[*idx]]
                    .operator()
                    .map_or(true, |kind| !kind.is_leaf())
            })
            .collect();
        if candidates.is_empty() {
            self.errors.push(ValidationError::NoRootCandidate);
            return;
        }

        let mut reached = vec![false; graph.node_count()];
        for &candidate in &candidates {
            let mut dfs = Dfs::new(graph, candidate);
            while let Some(visited) = dfs.next(graph) {
                reached[visited.index()] = true;
            }
        }

        let mut orphans: Vec<&str> = graph
            .node_indices()
            .filter(|idx| !reached[idx.index()])
            .map(|idx| graph[idx])
            .collect();
        orphans.sort_unstable();
        for id in orphans {
            self.errors.push(ValidationError::Orphan { id: id.to_string() });
        }
    }
}

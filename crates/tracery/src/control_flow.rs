//! Caller/callee relations between call nodes.
//!
//! A [`ControlFlow`] is derived from a diagram's call and constructor edges in
//! one linear scan. It borrows the diagram, so it cannot outlive a mutation:
//! after any edit a new view has to be built.
//!
//! The view rejects diagrams in which a call has more than one caller or in
//! which the call relation contains a cycle; layout recursion relies on both.

use std::collections::{HashMap, HashSet};

use log::debug;
use petgraph::{algo::is_cyclic_directed, graphmap::DiGraphMap};

use tracery_core::diagram::{Diagram, EdgeKind, ModelError, NodeId, NodeKind};

/// Read-only caller/callee view over the call nodes of one diagram.
#[derive(Debug)]
pub struct ControlFlow<'d> {
    diagram: &'d Diagram,
    callers: HashMap<NodeId, NodeId>,
    callees: HashMap<NodeId, Vec<NodeId>>,
    constructed: HashSet<NodeId>,
}

impl<'d> ControlFlow<'d> {
    /// Builds the view from the current edges of `diagram`.
    ///
    /// Callees are ordered by the order in which their edges were added.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Structure`] if a call has two callers or the call
    /// relation is cyclic.
    pub fn build(diagram: &'d Diagram) -> Result<Self, ModelError> {
        let mut callers = HashMap::new();
        let mut callees: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut constructed = HashSet::new();
        let mut graph = DiGraphMap::<NodeId, ()>::new();

        for (edge_id, edge) in diagram.edges() {
            if !edge.kind().is_call() {
                continue;
            }
            let (caller, callee) = (edge.start(), edge.end());
            if callers.insert(callee, caller).is_some() {
                return Err(ModelError::Structure(format!(
                    "{callee} has more than one caller ({edge_id} is a second call)"
                )));
            }
            callees.entry(caller).or_default().push(callee);
            graph.add_edge(caller, callee, ());
            if edge.kind() == EdgeKind::Constructor {
                constructed.insert(callee);
            }
        }

        if is_cyclic_directed(&graph) {
            return Err(ModelError::Structure(
                "the call relation contains a cycle".to_string(),
            ));
        }

        debug!(calls = callers.len(), callers = callees.len(); "Control flow built");
        Ok(Self {
            diagram,
            callers,
            callees,
            constructed,
        })
    }

    /// The diagram this view was built from.
    pub fn diagram(&self) -> &'d Diagram {
        self.diagram
    }

    /// The call that calls `call`, if any.
    pub fn caller_of(&self, call: NodeId) -> Result<Option<NodeId>, ModelError> {
        self.check_call(call)?;
        Ok(self.callers.get(&call).copied())
    }

    /// Calls made by `call`, in call order.
    pub fn callees_of(&self, call: NodeId) -> Result<&[NodeId], ModelError> {
        self.check_call(call)?;
        Ok(self.callees.get(&call).map(Vec::as_slice).unwrap_or_default())
    }

    /// Returns `true` if `call` and its caller are on the same lifeline.
    pub fn is_nested(&self, call: NodeId) -> Result<bool, ModelError> {
        let Some(caller) = self.caller_of(call)? else {
            return Ok(false);
        };
        let lifeline = self.diagram.node(call)?.parent();
        Ok(lifeline.is_some() && lifeline == self.diagram.node(caller)?.parent())
    }

    /// Returns `true` if `call` is the first call made by its caller.
    ///
    /// A call without a caller is not a first callee.
    pub fn is_first_callee(&self, call: NodeId) -> Result<bool, ModelError> {
        let Some(caller) = self.caller_of(call)? else {
            return Ok(false);
        };
        Ok(self.callees_of(caller)?.first() == Some(&call))
    }

    /// The call made by the same caller right before `call`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Precondition`] if `call` has no caller or is its
    /// caller's first callee.
    pub fn previous_callee(&self, call: NodeId) -> Result<NodeId, ModelError> {
        let caller = self.caller_of(call)?.ok_or_else(|| {
            ModelError::Precondition(format!("{call} has no caller, so no previous callee"))
        })?;
        let siblings = self.callees_of(caller)?;
        let position = siblings
            .iter()
            .position(|sibling| *sibling == call)
            .unwrap_or_default();
        if position == 0 {
            return Err(ModelError::Precondition(format!(
                "{call} is the first callee of {caller}"
            )));
        }
        Ok(siblings[position - 1])
    }

    /// Number of calls in the caller chain of `call`.
    pub fn nesting_depth(&self, call: NodeId) -> Result<usize, ModelError> {
        let mut depth = 0;
        let mut current = self.caller_of(call)?;
        while let Some(caller) = current {
            depth += 1;
            current = self.callers.get(&caller).copied();
        }
        Ok(depth)
    }

    /// Returns `true` if `call` is the activation started by the constructor
    /// call that created its lifeline.
    pub fn is_constructor_execution(&self, call: NodeId) -> Result<bool, ModelError> {
        self.check_call(call)?;
        if !self.constructed.contains(&call) {
            return Ok(false);
        }
        let Some(lifeline) = self.diagram.node(call)?.parent() else {
            return Ok(false);
        };
        Ok(self.diagram.node(lifeline)?.children().first() == Some(&call))
    }

    fn check_call(&self, call: NodeId) -> Result<(), ModelError> {
        let kind = self.diagram.node(call)?.kind();
        if kind != NodeKind::Call {
            return Err(ModelError::Precondition(format!(
                "{call} is a {kind}, not a call node"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tracery_core::geometry::Point;

    use super::*;

    struct Fixture {
        diagram: Diagram,
        client: NodeId,
        server: NodeId,
    }

    fn fixture() -> Fixture {
        let mut diagram = Diagram::new();
        let client = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
        let server = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(200, 0));
        Fixture {
            diagram,
            client,
            server,
        }
    }

    #[test]
    fn test_callers_and_callees_in_edge_order() {
        let Fixture {
            mut diagram,
            client,
            server,
        } = fixture();
        let root = diagram.add_child(client, NodeKind::Call).unwrap();
        let second = diagram.add_child(server, NodeKind::Call).unwrap();
        let first = diagram.add_child(server, NodeKind::Call).unwrap();
        diagram.connect(EdgeKind::Call, root, first).unwrap();
        diagram.connect(EdgeKind::Call, root, second).unwrap();

        let flow = ControlFlow::build(&diagram).unwrap();
        assert_eq!(flow.callees_of(root).unwrap(), [first, second]);
        assert_eq!(flow.caller_of(first).unwrap(), Some(root));
        assert_eq!(flow.caller_of(root).unwrap(), None);
        assert!(flow.is_first_callee(first).unwrap());
        assert!(!flow.is_first_callee(second).unwrap());
        assert!(!flow.is_first_callee(root).unwrap());
        assert_eq!(flow.previous_callee(second).unwrap(), first);
    }

    #[test]
    fn test_previous_callee_preconditions() {
        let Fixture {
            mut diagram,
            client,
            server,
        } = fixture();
        let root = diagram.add_child(client, NodeKind::Call).unwrap();
        let callee = diagram.add_child(server, NodeKind::Call).unwrap();
        diagram.connect(EdgeKind::Call, root, callee).unwrap();

        let flow = ControlFlow::build(&diagram).unwrap();
        assert!(matches!(
            flow.previous_callee(callee),
            Err(ModelError::Precondition(_))
        ));
        assert!(matches!(
            flow.previous_callee(root),
            Err(ModelError::Precondition(_))
        ));
    }

    #[test]
    fn test_nested_and_depth() {
        let Fixture {
            mut diagram,
            client,
            server,
        } = fixture();
        let root = diagram.add_child(client, NodeKind::Call).unwrap();
        let remote = diagram.add_child(server, NodeKind::Call).unwrap();
        let self_call = diagram.add_child(server, NodeKind::Call).unwrap();
        diagram.connect(EdgeKind::Call, root, remote).unwrap();
        diagram.connect(EdgeKind::Call, remote, self_call).unwrap();

        let flow = ControlFlow::build(&diagram).unwrap();
        assert!(!flow.is_nested(root).unwrap());
        assert!(!flow.is_nested(remote).unwrap());
        assert!(flow.is_nested(self_call).unwrap());
        assert_eq!(flow.nesting_depth(root).unwrap(), 0);
        assert_eq!(flow.nesting_depth(remote).unwrap(), 1);
        assert_eq!(flow.nesting_depth(self_call).unwrap(), 2);
    }

    #[test]
    fn test_constructor_execution() {
        let Fixture {
            mut diagram,
            client,
            server,
        } = fixture();
        let root = diagram.add_child(client, NodeKind::Call).unwrap();
        let init = diagram.add_child(server, NodeKind::Call).unwrap();
        let later = diagram.add_child(server, NodeKind::Call).unwrap();
        diagram.connect(EdgeKind::Constructor, root, init).unwrap();
        diagram.connect(EdgeKind::Call, root, later).unwrap();

        let flow = ControlFlow::build(&diagram).unwrap();
        assert!(flow.is_constructor_execution(init).unwrap());
        assert!(!flow.is_constructor_execution(later).unwrap());
        assert!(!flow.is_constructor_execution(root).unwrap());
        assert_eq!(flow.callees_of(root).unwrap(), [init, later]);
    }

    #[test]
    fn test_two_callers_is_structural() {
        let Fixture {
            mut diagram,
            client,
            server,
        } = fixture();
        let a = diagram.add_child(client, NodeKind::Call).unwrap();
        let b = diagram.add_child(client, NodeKind::Call).unwrap();
        let target = diagram.add_child(server, NodeKind::Call).unwrap();
        diagram.connect(EdgeKind::Call, a, target).unwrap();
        diagram.connect(EdgeKind::Call, b, target).unwrap();

        assert!(matches!(
            ControlFlow::build(&diagram),
            Err(ModelError::Structure(_))
        ));
    }

    #[test]
    fn test_cycle_is_structural() {
        let Fixture {
            mut diagram,
            client,
            server,
        } = fixture();
        let a = diagram.add_child(client, NodeKind::Call).unwrap();
        let b = diagram.add_child(server, NodeKind::Call).unwrap();
        diagram.connect(EdgeKind::Call, a, b).unwrap();
        diagram.connect(EdgeKind::Call, b, a).unwrap();

        assert!(matches!(
            ControlFlow::build(&diagram),
            Err(ModelError::Structure(_))
        ));
    }

    #[test]
    fn test_self_loop_is_structural() {
        let Fixture {
            mut diagram,
            client,
            ..
        } = fixture();
        let a = diagram.add_child(client, NodeKind::Call).unwrap();
        diagram.connect(EdgeKind::Call, a, a).unwrap();

        assert!(ControlFlow::build(&diagram).is_err());
    }

    #[test]
    fn test_queries_on_foreign_or_non_call_nodes() {
        let Fixture {
            mut diagram,
            client,
            ..
        } = fixture();
        diagram.add_child(client, NodeKind::Call).unwrap();
        let mut other = Diagram::new();
        let lifeline = other.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
        let foreign = other.add_child(lifeline, NodeKind::Call).unwrap();

        let flow = ControlFlow::build(&diagram).unwrap();
        assert!(matches!(
            flow.caller_of(foreign),
            Err(ModelError::Precondition(_))
        ));
        assert!(matches!(
            flow.nesting_depth(client),
            Err(ModelError::Precondition(_))
        ));
    }
}

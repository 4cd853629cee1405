//! Arena graph.

use crate::errors::{EngineError, Result};
use crate::features::program_graph::domain::node::{BlockRef, Node, NodeId, NodeKind};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// A pending call site: the splice into the callee happens at finalize, once
/// every function has been ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    pub caller: NodeId,
    pub callee: String,
    /// Node of the caller's fall-through continuation block
    pub continuation: NodeId,
}

/// Directed graph over a dense node arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramGraph {
    nodes: Vec<Node>,
    entry: Option<NodeId>,
    exit: Option<NodeId>,
    function_entries: FxHashMap<String, NodeId>,
    function_returns: FxHashMap<String, Vec<NodeId>>,
    pub(crate) call_sites: Vec<CallSite>,
    finalized: bool,
}

impl ProgramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
        block: Option<BlockRef>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let mut node = Node::new(id, name, kind);
        node.block = block;
        debug!(id = id.0, name = node.name.as_str(), "adding node");
        self.nodes.push(node);
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        if from.index() >= self.nodes.len() || to.index() >= self.nodes.len() {
            return Err(EngineError::construction(format!(
                "edge ({from}, {to}) references a nonexistent node"
            )));
        }
        self.nodes[from.index()].successors.insert(to);
        self.nodes[to.index()].predecessors.insert(from);
        Ok(())
    }

    /// Record `(tail, header)` as a back-edge. The edge itself must exist.
    pub fn mark_back_edge(&mut self, tail: NodeId, header: NodeId) -> Result<()> {
        if !self.nodes[header.index()].predecessors.contains(&tail) {
            return Err(EngineError::construction(format!(
                "back-edge ({tail}, {header}) marked without a matching edge"
            )));
        }
        let node = &mut self.nodes[header.index()];
        node.back_edge_predecessors.insert(tail);
        node.is_loop_header = true;
        Ok(())
    }

    pub fn is_back_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.nodes[to.index()].back_edge_predecessors.contains(&from)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All edges in `(from, to)` form, ordered by source then target.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = Vec::new();
        for node in &self.nodes {
            for &succ in &node.successors {
                edges.push((node.id, succ));
            }
        }
        edges
    }

    pub fn set_entry_exit(&mut self, entry: NodeId, exit: NodeId) {
        self.entry = Some(entry);
        self.exit = Some(exit);
    }

    pub fn entry(&self) -> Option<NodeId> {
        self.entry
    }

    pub fn exit(&self) -> Option<NodeId> {
        self.exit
    }

    pub fn set_function_entry(&mut self, function: impl Into<String>, node: NodeId) {
        self.function_entries.insert(function.into(), node);
    }

    pub fn function_entry(&self, function: &str) -> Option<NodeId> {
        self.function_entries.get(function).copied()
    }

    pub fn add_function_return(&mut self, function: impl Into<String>, node: NodeId) {
        self.function_returns.entry(function.into()).or_default().push(node);
    }

    pub fn function_returns(&self, function: &str) -> &[NodeId] {
        self.function_returns
            .get(function)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub(crate) fn set_finalized(&mut self) {
        self.finalized = true;
    }

    /// Nodes reachable from the virtual entry.
    pub fn reachable_from_entry(&self) -> FxHashSet<NodeId> {
        let mut seen = FxHashSet::default();
        let Some(entry) = self.entry else {
            return seen;
        };
        let mut queue = VecDeque::from([entry]);
        seen.insert(entry);
        while let Some(id) = queue.pop_front() {
            for &succ in &self.nodes[id.index()].successors {
                if seen.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }
        seen
    }

    /// Structural invariants, checked once splicing is done.
    ///
    /// Unreachable subgraphs (functions never called from the start function)
    /// are tolerated; the flow equations pin their execution counts to zero.
    pub fn validate(&self) -> Result<()> {
        for node in &self.nodes {
            if !node.back_edge_predecessors.is_subset(&node.predecessors) {
                return Err(EngineError::construction(format!(
                    "node {} ({}) has back-edge predecessors that are not predecessors",
                    node.id,
                    node.qualified_name()
                )));
            }
            if node.is_loop_header && node.back_edge_predecessors.is_empty() {
                return Err(EngineError::construction(format!(
                    "node {} ({}) is flagged as a loop header but has no back-edge predecessor",
                    node.id,
                    node.qualified_name()
                )));
            }
            if let Some(bound) = node.loop_bound {
                if bound.upper < bound.lower {
                    return Err(EngineError::construction(format!(
                        "node {} ({}) has inverted loop bounds [{}, {}]",
                        node.id,
                        node.qualified_name(),
                        bound.lower,
                        bound.upper
                    )));
                }
            }
        }
        let reachable = self.reachable_from_entry();
        for node in &self.nodes {
            if !reachable.contains(&node.id) {
                continue;
            }
            let is_exit = Some(node.id) == self.exit;
            if !is_exit && node.successors.is_empty() {
                return Err(EngineError::construction(format!(
                    "reachable node {} ({}) has no successor",
                    node.id,
                    node.qualified_name()
                )));
            }
            let is_entry = Some(node.id) == self.entry;
            if !is_entry && node.predecessors.is_empty() {
                return Err(EngineError::construction(format!(
                    "reachable node {} ({}) has no predecessor",
                    node.id,
                    node.qualified_name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(graph: &mut ProgramGraph, name: &str) -> NodeId {
        graph.add_node(name, NodeKind::Block, None)
    }

    #[test]
    fn test_edge_endpoints_checked() {
        let mut graph = ProgramGraph::new();
        let a = block(&mut graph, "a");
        let err = graph.add_edge(a, NodeId(9)).unwrap_err();
        assert!(matches!(err, EngineError::Construction(_)));
    }

    #[test]
    fn test_back_edge_requires_edge() {
        let mut graph = ProgramGraph::new();
        let a = block(&mut graph, "a");
        let b = block(&mut graph, "b");
        assert!(graph.mark_back_edge(a, b).is_err());
        graph.add_edge(a, b).unwrap();
        graph.mark_back_edge(a, b).unwrap();
        assert!(graph.is_back_edge(a, b));
        assert!(graph.node(b).is_loop_header);
    }

    #[test]
    fn test_reachability() {
        let mut graph = ProgramGraph::new();
        let entry = graph.add_node("Entry", NodeKind::VirtualEntry, None);
        let a = block(&mut graph, "a");
        let exit = graph.add_node("Exit", NodeKind::VirtualExit, None);
        let orphan = block(&mut graph, "orphan");
        graph.set_entry_exit(entry, exit);
        graph.add_edge(entry, a).unwrap();
        graph.add_edge(a, exit).unwrap();

        let reachable = graph.reachable_from_entry();
        assert!(reachable.contains(&a));
        assert!(!reachable.contains(&orphan));
        // orphan is tolerated by validation
        graph.validate().unwrap();
    }

    #[test]
    fn test_reachable_dead_end_rejected() {
        let mut graph = ProgramGraph::new();
        let entry = graph.add_node("Entry", NodeKind::VirtualEntry, None);
        let a = block(&mut graph, "a");
        let exit = graph.add_node("Exit", NodeKind::VirtualExit, None);
        graph.set_entry_exit(entry, exit);
        graph.add_edge(entry, a).unwrap();

        let err = graph.validate().unwrap_err();
        assert!(err.to_string().contains("no successor"));
    }
}

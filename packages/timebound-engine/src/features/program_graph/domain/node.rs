//! Graph nodes.

use crate::features::loop_bounds::domain::LoopBound;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Dense node index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Backed by a basic block of the lowered program
    Block,
    /// Synthetic program entry
    VirtualEntry,
    /// Synthetic program exit
    VirtualExit,
}

/// Index of a basic block inside the lowered program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub function: u32,
    pub block: u32,
}

/// One program-graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Block label, or "Entry"/"Exit" for the virtual nodes
    pub name: String,
    /// Owning function name, absent for virtual nodes
    pub function: Option<String>,
    pub kind: NodeKind,
    pub block: Option<BlockRef>,
    /// Cycle cost of one execution of this node
    pub cost: u64,
    pub is_loop_header: bool,
    /// Iteration bound, present only on headers that received one
    pub loop_bound: Option<LoopBound>,
    pub is_nested_loop: bool,
    /// Header node of the enclosing loop, for nested headers
    pub enclosing_header: Option<NodeId>,
    /// Predecessors whose edge into this node closes a loop
    pub back_edge_predecessors: BTreeSet<NodeId>,
    pub successors: BTreeSet<NodeId>,
    pub predecessors: BTreeSet<NodeId>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            function: None,
            kind,
            block: None,
            cost: 0,
            is_loop_header: false,
            loop_bound: None,
            is_nested_loop: false,
            enclosing_header: None,
            back_edge_predecessors: BTreeSet::new(),
            successors: BTreeSet::new(),
            predecessors: BTreeSet::new(),
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, NodeKind::VirtualEntry | NodeKind::VirtualExit)
    }

    pub fn is_free(&self) -> bool {
        self.successors.is_empty() && self.predecessors.is_empty()
    }

    /// `function:name` where a function is known, plain name otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.function {
            Some(function) => format!("{}:{}", function, self.name),
            None => self.name.clone(),
        }
    }

    /// Label text for graph dumps.
    pub fn describe(&self) -> String {
        let mut descr = format!("id: {}, name: {}, cycles: {}", self.id, self.name, self.cost);
        if let Some(bound) = self.loop_bound {
            descr.push_str(&format!("\\nloop: [{}, {}]", bound.lower, bound.upper));
        } else if self.is_loop_header {
            descr.push_str("\\nloop: unbounded");
        }
        descr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_node() {
        let mut node = Node::new(NodeId(0), "entry", NodeKind::Block);
        assert!(node.is_free());
        node.successors.insert(NodeId(1));
        assert!(!node.is_free());
    }

    #[test]
    fn test_describe_mentions_bound() {
        let mut node = Node::new(NodeId(3), "while.cond", NodeKind::Block);
        node.is_loop_header = true;
        assert!(node.describe().contains("unbounded"));
        node.loop_bound = Some(LoopBound::from_trip_count(5));
        assert!(node.describe().contains("[1, 5]"));
    }

    #[test]
    fn test_qualified_name() {
        let mut node = Node::new(NodeId(0), "bb2", NodeKind::Block);
        assert_eq!(node.qualified_name(), "bb2");
        node.function = Some("main".into());
        assert_eq!(node.qualified_name(), "main:bb2");
    }
}

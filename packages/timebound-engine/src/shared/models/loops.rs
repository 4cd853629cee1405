//! Loop-info oracle types.
//!
//! Natural-loop structure is computed by the front-end (it owns dominance
//! information) and handed over per function: which blocks are headers, which
//! predecessors close a back-edge, and the constant trip count where scalar
//! evolution could prove one.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One natural loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NaturalLoop {
    /// Header block label
    pub header: String,
    /// Blocks whose edge to the header is a back-edge
    pub latches: Vec<String>,
    /// Constant maximum trip count (max backedge-taken count + 1), if proven
    pub trip_count: Option<u32>,
    /// Header label of the enclosing loop, if nested
    pub parent: Option<String>,
}

impl NaturalLoop {
    pub fn new(header: impl Into<String>, latches: Vec<&str>) -> Self {
        Self {
            header: header.into(),
            latches: latches.into_iter().map(str::to_string).collect(),
            trip_count: None,
            parent: None,
        }
    }

    pub fn with_trip_count(mut self, count: u32) -> Self {
        self.trip_count = Some(count);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// All natural loops of one function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionLoops {
    pub loops: Vec<NaturalLoop>,
}

impl FunctionLoops {
    pub fn new(loops: Vec<NaturalLoop>) -> Self {
        Self { loops }
    }

    pub fn loop_with_header(&self, header: &str) -> Option<&NaturalLoop> {
        self.loops.iter().find(|l| l.header == header)
    }

    /// Is `(from, to)` a back-edge of some natural loop?
    pub fn is_back_edge(&self, from: &str, to: &str) -> bool {
        self.loop_with_header(to)
            .is_some_and(|l| l.latches.iter().any(|latch| latch == from))
    }
}

/// Loop information for the whole module, keyed by function name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleLoops {
    pub by_function: FxHashMap<String, FunctionLoops>,
}

impl ModuleLoops {
    pub fn insert(&mut self, function: impl Into<String>, loops: FunctionLoops) {
        self.by_function.insert(function.into(), loops);
    }

    pub fn for_function(&self, function: &str) -> Option<&FunctionLoops> {
        self.by_function.get(function)
    }
}

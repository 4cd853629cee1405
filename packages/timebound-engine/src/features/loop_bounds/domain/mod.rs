//! Loop bound values.

use serde::{Deserialize, Serialize};

/// Where a bound came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundSource {
    /// Constant trip count from the scalar-evolution oracle
    TripCount,
    /// Source-level annotation table
    Annotation,
    /// Configured absolute cap applied because nothing else was known
    FallbackCap,
}

impl BoundSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundSource::TripCount => "trip-count",
            BoundSource::Annotation => "annotation",
            BoundSource::FallbackCap => "fallback-cap",
        }
    }
}

/// Iteration bound of one loop header, per invocation of its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopBound {
    pub lower: u32,
    pub upper: u32,
    pub source: BoundSource,
}

impl LoopBound {
    pub fn from_trip_count(count: u32) -> Self {
        Self {
            lower: 1.min(count),
            upper: count,
            source: BoundSource::TripCount,
        }
    }

    pub fn fallback(cap: u32) -> Self {
        Self {
            lower: 0,
            upper: cap,
            source: BoundSource::FallbackCap,
        }
    }
}

//! Lattice values.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Lattice interface: join-semilattice with a comparison and a widening
/// accelerator.
pub trait Lattice: Clone + PartialEq + std::fmt::Display {
    /// Least upper bound, in place. Returns true when `self` changed.
    fn join(&mut self, other: &Self) -> bool;

    /// Partial order: is `self` below or equal to `other`?
    fn leq(&self, other: &Self) -> bool;

    /// Accelerate an ascending chain. Components of `self` strictly above
    /// `previous` are promoted by `steps` times their observed increase, or
    /// straight to top when `saturate` is set.
    fn widen(&mut self, previous: &Self, steps: u64, saturate: bool);
}

/// Hardware resource identifier (ALU, memory port).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ResourceId(pub u16);

/// Snapshot of the machine at a program point: cycles consumed so far and
/// the cycle at which each tracked resource becomes free again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    pub cycle_count: u64,
    pub resources: FxHashMap<ResourceId, u64>,
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance time; saturates instead of wrapping.
    pub fn advance(&mut self, cycles: u64) {
        self.cycle_count = self.cycle_count.saturating_add(cycles);
    }

    /// Record that a resource is busy until the given cycle.
    pub fn reserve(&mut self, resource: ResourceId, until: u64) {
        let slot = self.resources.entry(resource).or_insert(0);
        *slot = (*slot).max(until);
    }

    fn resource(&self, id: ResourceId) -> u64 {
        self.resources.get(&id).copied().unwrap_or(0)
    }
}

impl Lattice for SystemState {
    fn join(&mut self, other: &Self) -> bool {
        let mut changed = false;
        if other.cycle_count > self.cycle_count {
            self.cycle_count = other.cycle_count;
            changed = true;
        }
        for (&id, &avail) in &other.resources {
            let slot = self.resources.entry(id).or_insert(0);
            if avail > *slot {
                *slot = avail;
                changed = true;
            }
        }
        changed
    }

    fn leq(&self, other: &Self) -> bool {
        self.cycle_count <= other.cycle_count
            && self
                .resources
                .iter()
                .all(|(&id, &avail)| avail <= other.resource(id))
    }

    fn widen(&mut self, previous: &Self, steps: u64, saturate: bool) {
        if self.cycle_count > previous.cycle_count {
            self.cycle_count = if saturate {
                u64::MAX
            } else {
                let delta = self.cycle_count - previous.cycle_count;
                self.cycle_count.saturating_add(delta.saturating_mul(steps))
            };
        }
        let ids: Vec<ResourceId> = self.resources.keys().copied().collect();
        for id in ids {
            let current = self.resource(id);
            let before = previous.resource(id);
            if current > before {
                let widened = if saturate {
                    u64::MAX
                } else {
                    current.saturating_add((current - before).saturating_mul(steps))
                };
                self.resources.insert(id, widened);
            }
        }
    }
}

impl std::fmt::Display for SystemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cycles: {}", self.cycle_count)?;
        if !self.resources.is_empty() {
            let mut entries: Vec<_> = self.resources.iter().collect();
            entries.sort_by_key(|(id, _)| **id);
            write!(f, ", resources: {{")?;
            for (index, (id, avail)) in entries.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", id.0, avail)?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

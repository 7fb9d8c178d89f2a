//! The quad-store abstraction (§4.1): a backend-agnostic contract the
//! iterator algebra is built against, plus the one backend this crate
//! ships, [`memory::MemoryStore`].

pub mod memory;

use crate::error::DeltaError;
use crate::iterator::fixed::Fixed;
use crate::iterator::QueryIterator;
use graphforge_model::{Direction, NodeHash, Quad, QuadHash, Value};

/// Opaque, monotonically advancing write watermark (§4.1, §9: "callers
/// must not interpret the encoding"). `MemoryStore` happens to implement it
/// as a sequential counter (see `DESIGN.md`), but callers must treat it as
/// opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimaryKey(u64);

impl PrimaryKey {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Whether a [`Delta`] adds or removes a quad (§4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Delete,
}

/// One unit of change in an `apply_deltas` batch (§4.1.1). `id` is stamped
/// by the store during the batch's log phase; a caller-constructed `Delta`
/// carries a placeholder until then.
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    pub quad: Quad,
    pub action: Action,
    pub id: PrimaryKey,
}

impl Delta {
    #[must_use]
    pub const fn add(quad: Quad) -> Self {
        Self {
            quad,
            action: Action::Add,
            id: PrimaryKey(0),
        }
    }

    #[must_use]
    pub const fn delete(quad: Quad) -> Self {
        Self {
            quad,
            action: Action::Delete,
            id: PrimaryKey(0),
        }
    }
}

/// Per-batch suppression flags for the verify phase of `apply_deltas`
/// (§4.1.1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnoreOpts {
    pub ignore_dup: bool,
    pub ignore_missing: bool,
}

/// The backend-agnostic contract the iterator algebra (§4.2) and path
/// compiler (§4.3) are built against (§4.1).
///
/// All operations are free of iterator dependencies except the four that
/// construct iterator trees (`quad_iterator`, `nodes_all_iterator`,
/// `quads_all_iterator`, `fixed_iterator`) and `optimize_iterator`.
pub trait QuadStore: Send + Sync + std::fmt::Debug {
    /// Pure, infallible, stable across calls (§4.1).
    fn value_of(&self, value: &Value) -> NodeHash;

    /// Resolves a hash back to its literal. May consult an LRU cache;
    /// `None` if the hash has no currently-visible node.
    fn name_of(&self, hash: NodeHash) -> Option<Value>;

    /// Resolves all four directions of `hash` via [`Self::name_of`].
    fn quad(&self, hash: QuadHash) -> Option<Quad>;

    /// Pure slice into `hash`; doesn't touch the store (§4.1).
    fn quad_direction(&self, hash: QuadHash, dir: Direction) -> NodeHash {
        hash.get(dir)
    }

    /// Atomically applies a batch of adds/deletes with the verify/log/commit
    /// pre-check semantics of §4.1.1.
    fn apply_deltas(&self, deltas: Vec<Delta>, opts: IgnoreOpts) -> Result<(), DeltaError>;

    fn quad_iterator(&self, dir: Direction, value: NodeHash) -> Box<dyn QueryIterator>;

    fn nodes_all_iterator(&self) -> Box<dyn QueryIterator>;

    fn quads_all_iterator(&self) -> Box<dyn QueryIterator>;

    /// A fresh, empty `Fixed` iterator bound to no particular values yet —
    /// callers `add` handles to it (§4.1).
    fn fixed_iterator(&self) -> Fixed {
        Fixed::new()
    }

    /// Count of currently-visible quads.
    fn size(&self) -> i64;

    /// The current write watermark (§9: opaque, monotonic).
    fn horizon(&self) -> PrimaryKey;

    /// Backend-local rewrite hook (§4.1, §4.4); the second element reports
    /// whether anything changed (§7 kind 6, `OptimizeDidNothing`).
    fn optimize_iterator(&self, it: Box<dyn QueryIterator>) -> (Box<dyn QueryIterator>, bool) {
        (it, false)
    }
}

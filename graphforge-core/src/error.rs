//! Error kinds for the store and iterator layers, per spec §7.
//!
//! Layered the way the teacher's `storage/error.rs` layers `StorageError`:
//! a small, `#[non_exhaustive]` top-level enum with `#[error(transparent)]`
//! wrapping for the nested error kinds, leaving room to add variants (a
//! second backend, say) without a breaking change.

use crate::store::Delta;
use std::fmt;
use thiserror::Error;

/// Errors raised by the quad-store contract (§4.1), outside of the delta
/// batch path (see [`DeltaError`] for that).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// A backend I/O or internal invariant failure unrelated to a specific
    /// delta; §7 kind 3 (`BackendUnavailable`).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// An internal consistency check failed (e.g. a node referenced by a
    /// visible quad has no side-table entry).
    #[error("corrupted store state: {0}")]
    Corruption(String),
    /// Wraps a failed delta batch so `apply_deltas` can return a single
    /// error type alongside `StoreError`.
    #[error(transparent)]
    Delta(#[from] DeltaError),
}

/// One failed delta within a batch, per §4.1.1's verify phase.
#[derive(Debug, Error)]
#[error("delta on {delta} failed: {kind}")]
pub struct DeltaError {
    pub delta: Delta,
    pub kind: DeltaErrorKind,
}

/// §7 kinds 1–2, scoped to the delta-batch verify phase.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeltaErrorKind {
    /// An unrecognized action was seen on a delta; fatal to the whole batch.
    #[error("invalid delta action")]
    InvalidAction,
    /// An `Add` targeted a quad already visible, and `ignore_dup` was false.
    #[error("quad already exists")]
    QuadExists,
    /// A `Delete` targeted a quad not currently visible, and
    /// `ignore_missing` was false.
    #[error("quad does not exist")]
    QuadNotExist,
    /// A backend-level I/O failure occurred mid-batch.
    #[error("backend error: {0}")]
    BackendError(String),
}

/// Errors latched by an iterator's `err()` (§4.2, §7 kinds 3–5).
///
/// Iterators never raise: on encountering one of these they record it and
/// return `false` from `next`/`contains` for the remainder of their
/// lifetime, per §7's propagation policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IteratorError {
    /// Transient backend I/O failure (§7 kind 3).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// Cooperative cancellation fired before the iterator could finish
    /// (§7 kind 4, §5's cancellation token).
    #[error("query cancelled or timed out")]
    Cancelled,
    /// `contains` was called with a handle not produced by a compatible
    /// iterator (§7 kind 5). Treated as a false-returning error, not a
    /// panic.
    #[error("handle type mismatch")]
    TypeMismatch,
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}", self.action, self.quad)
    }
}

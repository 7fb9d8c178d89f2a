//! Builder-style option structs, in the shape the teacher's SPARQL layer
//! uses for `QueryOptions`/`UpdateOptions`: small structs passed by value,
//! constructed via `::default()` then `.with_*` chaining.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tunables for a [`MemoryStore`](crate::store::MemoryStore).
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    lru_capacity: usize,
}

/// Default LRU capacity for the node-hash → value cache, per §5: "sized by
/// capacity (default 65 536 entries) with least-recently-used eviction".
pub const DEFAULT_LRU_CAPACITY: usize = 65_536;

impl StoreOptions {
    #[must_use]
    pub const fn with_lru_capacity(mut self, lru_capacity: usize) -> Self {
        self.lru_capacity = lru_capacity;
        self
    }

    #[must_use]
    pub const fn lru_capacity(&self) -> usize {
        self.lru_capacity
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            lru_capacity: DEFAULT_LRU_CAPACITY,
        }
    }
}

/// A cooperative cancellation signal threaded through the execution driver
/// (§5). Cloning shares the same underlying flag; call [`CancellationToken::cancel`]
/// from any clone to stop every iterator checking it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Options for a single query execution (§2 row J: `TagEach`, `AllValues`,
/// `Paths`).
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    cancellation: Option<CancellationToken>,
}

impl ExecutionOptions {
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

//! The one backend this crate ships: an in-process, index-backed
//! implementation of the [`QuadStore`] contract.
//!
//! Deliberately simpler than the teacher's MVCC `MemoryStorage`
//! (version-ranged quad linked lists, per-transaction snapshots): §1's
//! Non-goals exclude update concurrency beyond a stable per-query snapshot,
//! so there is no concurrent-writer isolation to build. What's kept from
//! the teacher's design is the shape — `DashMap`/`DashSet` keyed by
//! `FxHasher` for the hot indices, an `id2str`-style side table for
//! resolving hashes back to values, and a `tracing`-instrumented batch
//! write path.

use crate::config::StoreOptions;
use crate::error::{DeltaError, DeltaErrorKind};
use crate::iterator::all::All;
use crate::iterator::quad_iter::QuadIterator;
use crate::iterator::{Handle, QueryIterator};
use crate::store::{Action, Delta, IgnoreOpts, PrimaryKey, QuadStore};
use dashmap::{DashMap, DashSet};
use graphforge_model::{Direction, NodeHash, Quad, QuadHash, Value};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

struct NodeRecord {
    value: Value,
    /// Count of visible quads referencing this node across any direction
    /// (§6.1's `nodes.size`). Gates node removal — see §9's refcount-gated
    /// deletion guidance.
    refcount: AtomicI64,
}

struct QuadRecord {
    quad: Quad,
    added: i64,
    deleted: i64,
}

impl QuadRecord {
    fn is_visible(&self) -> bool {
        self.added > self.deleted
    }
}

/// An in-memory [`QuadStore`] backed by per-direction hash indices.
///
/// Horizon is a plain sequential counter (§9's open question, resolved in
/// `DESIGN.md`): every successfully logged delta advances it by one,
/// independent of wall-clock time, which keeps `apply_deltas` deterministic
/// and easy to test.
#[derive(Debug)]
pub struct MemoryStore {
    nodes: DashMap<NodeHash, NodeRecord, FxBuildHasher>,
    quads: DashMap<QuadHash, QuadRecord, FxBuildHasher>,
    by_subject: DashMap<NodeHash, DashSet<QuadHash, FxBuildHasher>, FxBuildHasher>,
    by_predicate: DashMap<NodeHash, DashSet<QuadHash, FxBuildHasher>, FxBuildHasher>,
    by_object: DashMap<NodeHash, DashSet<QuadHash, FxBuildHasher>, FxBuildHasher>,
    by_label: DashMap<NodeHash, DashSet<QuadHash, FxBuildHasher>, FxBuildHasher>,
    name_cache: Mutex<lru::LruCache<NodeHash, Value>>,
    horizon: AtomicU64,
    visible_count: AtomicI64,
    options: StoreOptions,
}

impl std::fmt::Debug for NodeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRecord")
            .field("value", &self.value)
            .field("refcount", &self.refcount.load(Ordering::Relaxed))
            .finish()
    }
}

impl std::fmt::Debug for QuadRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadRecord")
            .field("quad", &self.quad)
            .field("added", &self.added)
            .field("deleted", &self.deleted)
            .finish()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new(options: StoreOptions) -> Self {
        let capacity = std::num::NonZeroUsize::new(options.lru_capacity().max(1))
            .unwrap_or(std::num::NonZeroUsize::MIN);
        Self {
            nodes: DashMap::default(),
            quads: DashMap::default(),
            by_subject: DashMap::default(),
            by_predicate: DashMap::default(),
            by_object: DashMap::default(),
            by_label: DashMap::default(),
            name_cache: Mutex::new(lru::LruCache::new(capacity)),
            horizon: AtomicU64::new(0),
            visible_count: AtomicI64::new(0),
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn index_for(&self, dir: Direction) -> &DashMap<NodeHash, DashSet<QuadHash, FxBuildHasher>, FxBuildHasher> {
        match dir {
            Direction::Subject => &self.by_subject,
            Direction::Predicate => &self.by_predicate,
            Direction::Object => &self.by_object,
            Direction::Label => &self.by_label,
            Direction::Any => unreachable!("MemoryStore index requested for Direction::Any"),
        }
    }

    fn bump_refcount(&self, hash: NodeHash, value: &Value, delta: i64) {
        if let Some(record) = self.nodes.get(&hash) {
            let new_count = record.refcount.fetch_add(delta, Ordering::SeqCst) + delta;
            drop(record);
            if new_count <= 0 {
                self.nodes.remove(&hash);
                self.name_cache
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .pop(&hash);
            }
        } else if delta > 0 {
            self.nodes.insert(
                hash,
                NodeRecord {
                    value: value.clone(),
                    refcount: AtomicI64::new(delta),
                },
            );
        }
    }

    fn index_quad(&self, hash: QuadHash, quad: &Quad) {
        for dir in Direction::QUAD_DIRECTIONS {
            if dir == Direction::Label && !hash.has_label() {
                continue;
            }
            let node_hash = hash.get(dir);
            self.index_for(dir)
                .entry(node_hash)
                .or_default()
                .insert(hash);
            self.bump_refcount(node_hash, quad_value(quad, dir), 1);
        }
    }

    fn unindex_quad(&self, hash: QuadHash, quad: &Quad) {
        for dir in Direction::QUAD_DIRECTIONS {
            if dir == Direction::Label && !hash.has_label() {
                continue;
            }
            let node_hash = hash.get(dir);
            if let Some(set) = self.index_for(dir).get(&node_hash) {
                set.remove(&hash);
            }
            self.bump_refcount(node_hash, quad_value(quad, dir), -1);
        }
    }

    /// Verify phase of §4.1.1: checks each delta's pre-condition and
    /// returns the first violation unless suppressed by `opts`.
    fn verify(&self, deltas: &[Delta], opts: IgnoreOpts) -> Result<(), DeltaError> {
        for delta in deltas {
            let hash = quad_hash_of(self, &delta.quad);
            let visible = self.quads.get(&hash).is_some_and(|r| r.is_visible());
            match delta.action {
                Action::Add if visible && !opts.ignore_dup => {
                    return Err(DeltaError {
                        delta: delta.clone(),
                        kind: DeltaErrorKind::QuadExists,
                    });
                }
                Action::Delete if !visible && !opts.ignore_missing => {
                    return Err(DeltaError {
                        delta: delta.clone(),
                        kind: DeltaErrorKind::QuadNotExist,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Caller must only request `Label` when `quad.label.is_some()` — callers
/// in this module guard every `Label` request on `QuadHash::has_label()`
/// first, so there is no label-less quad indexed under an empty handle
/// (see `index_quad`/`unindex_quad`).
fn quad_value(quad: &Quad, dir: Direction) -> &Value {
    match dir {
        Direction::Subject => &quad.subject,
        Direction::Predicate => &quad.predicate,
        Direction::Object => &quad.object,
        Direction::Label => quad.label.as_ref().expect("Label requested for a label-less quad"),
        Direction::Any => unreachable!("quad_value requested for Direction::Any"),
    }
}

fn quad_hash_of(store: &MemoryStore, quad: &Quad) -> QuadHash {
    let subject = store.value_of(&quad.subject);
    let predicate = store.value_of(&quad.predicate);
    let object = store.value_of(&quad.object);
    let label = quad.label.as_ref().map(|l| store.value_of(l));
    QuadHash::new(subject, predicate, object, label)
}

impl QuadStore for MemoryStore {
    fn value_of(&self, value: &Value) -> NodeHash {
        NodeHash::of(value)
    }

    fn name_of(&self, hash: NodeHash) -> Option<Value> {
        if let Some(cached) = self.name_cache.lock().unwrap_or_else(|e| e.into_inner()).get(&hash) {
            return Some(cached.clone());
        }
        let value = self.nodes.get(&hash).map(|r| r.value.clone())?;
        self.name_cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(hash, value.clone());
        Some(value)
    }

    fn quad(&self, hash: QuadHash) -> Option<Quad> {
        let subject = self.name_of(hash.get(Direction::Subject))?;
        let predicate = self.name_of(hash.get(Direction::Predicate))?;
        let object = self.name_of(hash.get(Direction::Object))?;
        let label = if hash.has_label() {
            Some(self.name_of(hash.get(Direction::Label))?)
        } else {
            None
        };
        Some(Quad::new(subject, predicate, object, label))
    }

    #[tracing::instrument(skip(self, deltas), fields(batch_size = deltas.len()))]
    fn apply_deltas(&self, deltas: Vec<Delta>, opts: IgnoreOpts) -> Result<(), DeltaError> {
        self.verify(&deltas, opts)?;

        // Log phase: stamp each surviving delta with the next horizon value.
        let stamped: Vec<(QuadHash, Action)> = deltas
            .iter()
            .map(|delta| {
                let hash = quad_hash_of(self, &delta.quad);
                self.horizon.fetch_add(1, Ordering::SeqCst);
                (hash, delta.action)
            })
            .collect();

        // Commit phase: nodes before quads, so a concurrent reader never
        // observes a quad whose endpoints are missing.
        for (delta, (hash, action)) in deltas.iter().zip(&stamped) {
            match action {
                Action::Add => {
                    let mut entry = self.quads.entry(*hash).or_insert_with(|| QuadRecord {
                        quad: delta.quad.clone(),
                        added: 0,
                        deleted: 0,
                    });
                    let was_visible = entry.is_visible();
                    entry.added += 1;
                    if !was_visible && entry.is_visible() {
                        drop(entry);
                        self.index_quad(*hash, &delta.quad);
                        self.visible_count.fetch_add(1, Ordering::SeqCst);
                    }
                }
                Action::Delete => {
                    if let Some(mut entry) = self.quads.get_mut(hash) {
                        let was_visible = entry.is_visible();
                        entry.deleted += 1;
                        let now_visible = entry.is_visible();
                        if was_visible && !now_visible {
                            let quad = entry.quad.clone();
                            drop(entry);
                            self.unindex_quad(*hash, &quad);
                            self.visible_count.fetch_sub(1, Ordering::SeqCst);
                        }
                    } else {
                        tracing::warn!(?hash, "delete targeted a quad with no record");
                    }
                }
            }
        }
        Ok(())
    }

    fn quad_iterator(&self, dir: Direction, value: NodeHash) -> Box<dyn QueryIterator> {
        let items: Vec<QuadHash> = self
            .index_for(dir)
            .get(&value)
            .map(|set| {
                set.iter()
                    .map(|q| *q)
                    .filter(|q| self.quads.get(q).is_some_and(|r| r.is_visible()))
                    .collect()
            })
            .unwrap_or_default();
        Box::new(QuadIterator::new(dir, value, items.into()))
    }

    fn nodes_all_iterator(&self) -> Box<dyn QueryIterator> {
        let items: Vec<Handle> = self.nodes.iter().map(|e| Handle::Node(*e.key())).collect();
        Box::new(All::new(items.into()))
    }

    fn quads_all_iterator(&self) -> Box<dyn QueryIterator> {
        let items: Vec<Handle> = self
            .quads
            .iter()
            .filter(|e| e.value().is_visible())
            .map(|e| Handle::Quad(*e.key()))
            .collect();
        Box::new(All::new(items.into()))
    }

    fn size(&self) -> i64 {
        self.visible_count.load(Ordering::SeqCst)
    }

    fn horizon(&self) -> PrimaryKey {
        PrimaryKey::new(self.horizon.load(Ordering::SeqCst))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphforge_model::Quad;

    fn triple(s: &str, p: &str, o: &str) -> Quad {
        Quad::triple(Value::iri(s), Value::iri(p), Value::iri(o))
    }

    #[test]
    fn label_less_quad_does_not_populate_the_empty_label_handle() {
        let store = MemoryStore::default();
        let q = triple("a", "follows", "b");
        store
            .apply_deltas(vec![Delta::add(q.clone())], IgnoreOpts::default())
            .unwrap();
        assert!(store.name_of(NodeHash::empty()).is_none());
        assert!(store.by_label.get(&NodeHash::empty()).is_none());
    }

    #[test]
    fn add_then_visible_via_quad_iterator() {
        let store = MemoryStore::default();
        let q = triple("a", "follows", "b");
        store
            .apply_deltas(vec![Delta::add(q.clone())], IgnoreOpts::default())
            .unwrap();
        assert_eq!(store.size(), 1);
        let subject_hash = store.value_of(&q.subject);
        let mut it = store.quad_iterator(Direction::Subject, subject_hash);
        assert!(it.next());
        assert!(!it.next());
    }

    #[test]
    fn duplicate_add_without_ignore_dup_errors() {
        let store = MemoryStore::default();
        let q = triple("a", "follows", "b");
        store
            .apply_deltas(vec![Delta::add(q.clone())], IgnoreOpts::default())
            .unwrap();
        let err = store
            .apply_deltas(vec![Delta::add(q.clone())], IgnoreOpts::default())
            .unwrap_err();
        assert_eq!(err.kind, DeltaErrorKind::QuadExists);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn duplicate_add_with_ignore_dup_is_ok_and_size_unchanged() {
        let store = MemoryStore::default();
        let q = triple("a", "follows", "b");
        store
            .apply_deltas(vec![Delta::add(q.clone())], IgnoreOpts::default())
            .unwrap();
        let opts = IgnoreOpts {
            ignore_dup: true,
            ignore_missing: false,
        };
        store
            .apply_deltas(vec![Delta::add(q.clone())], opts)
            .unwrap();
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn delete_then_readd_is_visible_again() {
        let store = MemoryStore::default();
        let q = triple("a", "follows", "b");
        store
            .apply_deltas(vec![Delta::add(q.clone())], IgnoreOpts::default())
            .unwrap();
        store
            .apply_deltas(vec![Delta::delete(q.clone())], IgnoreOpts::default())
            .unwrap();
        assert_eq!(store.size(), 0);
        store
            .apply_deltas(vec![Delta::add(q.clone())], IgnoreOpts::default())
            .unwrap();
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn horizon_advances_monotonically() {
        let store = MemoryStore::default();
        let before = store.horizon();
        store
            .apply_deltas(
                vec![Delta::add(triple("a", "follows", "b"))],
                IgnoreOpts::default(),
            )
            .unwrap();
        assert!(store.horizon().as_u64() > before.as_u64());
    }

    #[test]
    fn node_is_garbage_collected_when_refcount_reaches_zero() {
        let store = MemoryStore::default();
        let q = triple("a", "follows", "b");
        store
            .apply_deltas(vec![Delta::add(q.clone())], IgnoreOpts::default())
            .unwrap();
        let subject_hash = store.value_of(&q.subject);
        assert!(store.name_of(subject_hash).is_some());
        store
            .apply_deltas(vec![Delta::delete(q)], IgnoreOpts::default())
            .unwrap();
        assert!(store.nodes.get(&subject_hash).is_none());
    }
}

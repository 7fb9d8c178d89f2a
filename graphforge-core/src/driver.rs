//! The execution driver (§2 row J, §5): turns a built, optimized iterator
//! tree into concrete result rows, the way the teacher's query evaluator
//! turns a compiled SPARQL algebra into a solution-bindings iterator.

use crate::config::ExecutionOptions;
use crate::error::IteratorError;
use crate::iterator::skip_limit::Count;
use crate::iterator::unique::Unique;
use crate::iterator::{Handle, QueryIterator, TerminalLiteral};
use crate::path::Path;
use crate::store::QuadStore;
use graphforge_model::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One row of a [`QueryDriver::paths`] result: the iterator's yield plus
/// whatever tags were bound to produce it (§4.2's `tag_results`).
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub result: Handle,
    pub tags: FxHashMap<String, Handle>,
}

/// Drives a built iterator tree to completion, per §2 row J
/// (`Paths`/`TagEach`/`AllValues`) and §5's execution model.
///
/// Built from a [`Path`]: compiles it, hands the tree to the generic
/// optimizer and then to the backend's own [`QuadStore::optimize_iterator`]
/// hook, logging whichever rewrites fired, the way the teacher logs a query
/// plan's rewrite passes at `debug` level before evaluating it.
#[derive(Debug)]
pub struct QueryDriver {
    store: Arc<dyn QuadStore>,
    root: Box<dyn QueryIterator>,
    options: ExecutionOptions,
}

impl QueryDriver {
    #[must_use]
    pub fn new(path: &Path, options: ExecutionOptions) -> Self {
        let store = Arc::clone(path.store());
        let tree = path.build_iterator_on();
        let (tree, generic_changed) = crate::optimizer::optimize(&store, tree);
        let (tree, backend_changed) = store.optimize_iterator(tree);
        if generic_changed || backend_changed {
            tracing::debug!(
                generic_changed,
                backend_changed,
                "optimizer rewrote the query tree before execution"
            );
        }
        Self {
            store,
            root: tree,
            options,
        }
    }

    /// Every row `(result, tags)` the tree produces, expanding `next_path`
    /// alternate tag bindings for a given `result` (§4.2: "next_path: step
    /// to the next tag binding that produces the same result").
    ///
    /// `unique` wraps the root in one more [`Unique`] before driving it —
    /// offered here for callers that didn't already end their [`Path`] with
    /// `.unique()`.
    pub fn paths(mut self, unique: bool) -> Result<Vec<PathResult>, IteratorError> {
        if unique {
            self.root = Box::new(Unique::new(self.root));
        }
        let mut rows = Vec::new();
        self.run_rows(|root| loop {
            let Some(result) = root.result() else { break };
            let mut tags = FxHashMap::default();
            root.tag_results(&mut tags);
            rows.push(PathResult { result, tags });
            if !root.next_path() {
                break;
            }
        })?;
        Ok(rows)
    }

    /// One `tags` map per row, without expanding `next_path` alternates —
    /// the `TagEach` of §2 row J.
    pub fn tag_each(mut self) -> Result<Vec<FxHashMap<String, Handle>>, IteratorError> {
        let mut rows = Vec::new();
        self.run_rows(|root| {
            let mut tags = FxHashMap::default();
            root.tag_results(&mut tags);
            rows.push(tags);
        })?;
        Ok(rows)
    }

    /// Every row's primary result, resolved back to a [`Value`] — the
    /// `AllValues` of §2 row J. A row whose result no longer resolves (the
    /// node was garbage-collected between build and drive) is silently
    /// skipped rather than treated as an error, matching `name_of`'s own
    /// `Option` contract.
    ///
    /// A root compiled from a terminal `.count()` morphism (§4.2.1) never
    /// yields through `result()` — it reports its single integer yield via
    /// [`TerminalLiteral`] instead — so that case is detected by downcast
    /// and surfaced as the row directly.
    pub fn all_values(mut self) -> Result<Vec<Value>, IteratorError> {
        let store = Arc::clone(&self.store);
        let mut rows = Vec::new();
        self.run_rows(|root| {
            if let Some(value) = terminal_literal(root) {
                rows.push(value);
                return;
            }
            if let Some(value) = root.result().and_then(|h| resolve(&store, h)) {
                rows.push(value);
            }
        })?;
        Ok(rows)
    }

    /// Drives the tree to completion and returns how many rows it produced.
    ///
    /// Distinct from compiling a `.count()` morphism onto the [`Path`]
    /// itself (§4.2.1's terminal `Count` iterator, which makes counting
    /// part of the tree and its cost estimate): this counts whatever rows
    /// `paths`/`tag_each` would otherwise have materialized, without
    /// collecting them.
    pub fn count(mut self) -> Result<u64, IteratorError> {
        let mut n: u64 = 0;
        self.run_rows(|_root| n += 1)?;
        Ok(n)
    }

    /// Drains `self.root`'s `next()` loop, handing each row to `on_row`
    /// before advancing, and always closes the tree before returning (§5) —
    /// whether it ran to completion, was cancelled, or latched an error.
    fn run_rows(&mut self, mut on_row: impl FnMut(&mut dyn QueryIterator)) -> Result<(), IteratorError> {
        let outcome = loop {
            if self.options.is_cancelled() {
                tracing::warn!("query driver stopped: cancellation token was set");
                break Err(IteratorError::Cancelled);
            }
            if !self.root.next() {
                break match self.root.err() {
                    Some(e) => Err(e.clone()),
                    None => Ok(()),
                };
            }
            on_row(self.root.as_mut());
        };
        self.root.close();
        outcome
    }
}

fn resolve(store: &Arc<dyn QuadStore>, handle: Handle) -> Option<Value> {
    match handle {
        Handle::Node(hash) => store.name_of(hash),
        Handle::Quad(hash) => store.quad(hash).map(|q| Value::string(q.to_string())),
    }
}

/// Downcasts to the one iterator whose yield isn't a `Handle` (§4.2.1's
/// terminal `Count`) and returns its literal, if `root` is one.
fn terminal_literal(root: &dyn QueryIterator) -> Option<Value> {
    root.as_any().downcast_ref::<Count>().and_then(TerminalLiteral::literal_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionOptions;
    use crate::store::{Delta, IgnoreOpts};
    use crate::store::memory::MemoryStore;
    use crate::path::morphism::Via;
    use graphforge_model::Quad;

    fn seeded_store() -> Arc<dyn QuadStore> {
        let store = MemoryStore::default();
        store
            .apply_deltas(
                vec![
                    Delta::add(Quad::triple(Value::iri("a"), Value::iri("follows"), Value::iri("b"))),
                    Delta::add(Quad::triple(Value::iri("b"), Value::iri("follows"), Value::iri("c"))),
                ],
                IgnoreOpts::default(),
            )
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn all_values_resolves_out_neighbors() {
        let store = seeded_store();
        let path = Path::start(Arc::clone(&store), vec![Value::iri("a")])
            .out(Via::Value(Value::iri("follows")));
        let driver = QueryDriver::new(&path, ExecutionOptions::default());
        let values = driver.all_values().unwrap();
        assert_eq!(values, vec![Value::iri("b")]);
    }

    #[test]
    fn all_values_surfaces_a_compiled_count_morphism_as_its_literal() {
        let store = seeded_store();
        let path = Path::start_all(Arc::clone(&store))
            .out(Via::Value(Value::iri("follows")))
            .count();
        let driver = QueryDriver::new(&path, ExecutionOptions::default());
        let values = driver.all_values().unwrap();
        assert_eq!(values, vec![Value::int(2)]);
    }

    #[test]
    fn count_matches_row_total() {
        let store = seeded_store();
        let path = Path::start_all(Arc::clone(&store)).out(Via::Value(Value::iri("follows")));
        let driver = QueryDriver::new(&path, ExecutionOptions::default());
        let n = driver.count().unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn cancellation_surfaces_as_an_error() {
        let store = seeded_store();
        let token = crate::config::CancellationToken::new();
        token.cancel();
        let path = Path::start_all(Arc::clone(&store)).out(Via::Value(Value::iri("follows")));
        let driver = QueryDriver::new(&path, ExecutionOptions::default().with_cancellation(token));
        assert!(matches!(driver.count(), Err(IteratorError::Cancelled)));
    }
}

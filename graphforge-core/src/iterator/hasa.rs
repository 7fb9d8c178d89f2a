use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::store::QuadStore;
use crate::tagger::Tagger;
use graphforge_model::{Direction, NodeHash, QuadHash};
use std::sync::Arc;

/// Inverse projection of [`LinksTo`](crate::iterator::linksto::LinksTo):
/// yields `quad_direction(q, dir)` for every quad `sub` produces (§4.2.2).
///
/// `next_path` must advance `sub` without changing the projected node until
/// it would project a different one (§4.2.2); since the iterator protocol
/// only allows a single forward step per call, a quad that turns out to
/// project a *different* node is buffered in `pending` rather than
/// discarded, so the following `next()` picks it up instead of re-pulling
/// from `sub`.
#[derive(Debug)]
pub struct HasA {
    sub: Box<dyn QueryIterator>,
    dir: Direction,
    store: Arc<dyn QuadStore>,
    current_node: Option<NodeHash>,
    pending: Option<QuadHash>,
    tagger: Tagger,
}

impl HasA {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>, dir: Direction, store: Arc<dyn QuadStore>) -> Self {
        Self {
            sub,
            dir,
            store,
            current_node: None,
            pending: None,
            tagger: Tagger::new(),
        }
    }

    /// Read by the optimizer (§4.4) when recursing through the canonical
    /// `HasA(And(LinksTo...), dir)` triple-pattern shape (§4.2.2).
    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.dir
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn QuadStore> {
        &self.store
    }

    fn next_quad(&mut self) -> Option<QuadHash> {
        if let Some(q) = self.pending.take() {
            return Some(q);
        }
        if !self.sub.next() {
            return None;
        }
        match self.sub.result() {
            Some(Handle::Quad(q)) => Some(q),
            _ => None,
        }
    }
}

impl QueryIterator for HasA {
    fn next(&mut self) -> bool {
        let Some(q) = self.next_quad() else {
            self.current_node = None;
            return false;
        };
        self.current_node = Some(self.store.quad_direction(q, self.dir));
        true
    }

    fn result(&self) -> Option<Handle> {
        self.current_node.map(Handle::Node)
    }

    fn contains(&mut self, handle: Handle) -> bool {
        let Handle::Node(node) = handle else {
            return false;
        };
        let mut cursor = self.store.quad_iterator(self.dir, node);
        while cursor.next() {
            if let Some(q) = cursor.result() {
                if self.sub.contains(q) {
                    return true;
                }
            }
        }
        false
    }

    fn next_path(&mut self) -> bool {
        if !self.sub.next() {
            return false;
        }
        let Some(Handle::Quad(q)) = self.sub.result() else {
            return false;
        };
        let node = self.store.quad_direction(q, self.dir);
        if Some(node) == self.current_node {
            true
        } else {
            self.pending = Some(q);
            false
        }
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.current_node = None;
        self.pending = None;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            dir: self.dir,
            store: Arc::clone(&self.store),
            current_node: self.current_node,
            pending: self.pending,
            tagger: self.tagger.clone(),
        })
    }

    fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    fn sub_iterators(&self) -> Vec<&dyn QueryIterator> {
        vec![self.sub.as_ref()]
    }

    fn stats(&self) -> Stats {
        let s = self.sub.stats();
        Stats::new(s.contains_cost + 1.0, s.next_cost + 1.0, s.size, false)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::HasA
    }

    fn close(&mut self) {
        self.sub.close();
    }

    fn err(&self) -> Option<&IteratorError> {
        self.sub.err()
    }
}

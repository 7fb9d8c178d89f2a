use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::store::QuadStore;
use crate::tagger::Tagger;
use graphforge_model::Direction;
use std::sync::Arc;

/// Bridges a node-set to the quads incident via `dir` (§4.2.2): for each
/// node `sub` produces, drains the backend's quad cursor for `(dir, node)`
/// before pulling the next node.
#[derive(Debug)]
pub struct LinksTo {
    sub: Box<dyn QueryIterator>,
    dir: Direction,
    store: Arc<dyn QuadStore>,
    current_quads: Option<Box<dyn QueryIterator>>,
    tagger: Tagger,
}

impl LinksTo {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>, dir: Direction, store: Arc<dyn QuadStore>) -> Self {
        Self {
            sub,
            dir,
            store,
            current_quads: None,
            tagger: Tagger::new(),
        }
    }

    /// The direction this `LinksTo` joins on; read by the optimizer (§4.4)
    /// when deciding whether to rewrite a `Fixed`-backed instance into a
    /// native [`QuadIterator`](crate::iterator::quad_iter::QuadIterator).
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.dir
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn QuadStore> {
        &self.store
    }
}

impl QueryIterator for LinksTo {
    fn next(&mut self) -> bool {
        loop {
            if let Some(cursor) = &mut self.current_quads {
                if cursor.next() {
                    return true;
                }
                self.current_quads = None;
            }
            if !self.sub.next() {
                return false;
            }
            let Some(Handle::Node(node)) = self.sub.result() else {
                continue;
            };
            self.current_quads = Some(self.store.quad_iterator(self.dir, node));
        }
    }

    fn result(&self) -> Option<Handle> {
        self.current_quads.as_ref().and_then(|c| c.result())
    }

    fn contains(&mut self, handle: Handle) -> bool {
        let Handle::Quad(quad_hash) = handle else {
            return false;
        };
        let node = self.store.quad_direction(quad_hash, self.dir);
        self.sub.contains(Handle::Node(node))
    }

    fn next_path(&mut self) -> bool {
        self.sub.next_path()
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.current_quads = None;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            dir: self.dir,
            store: Arc::clone(&self.store),
            current_quads: self.current_quads.as_ref().map(|c| c.clone_box()),
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
        IteratorType::LinksTo
    }

    fn close(&mut self) {
        if let Some(c) = &mut self.current_quads {
            c.close();
        }
        self.sub.close();
    }

    fn err(&self) -> Option<&IteratorError> {
        self.sub.err()
    }
}

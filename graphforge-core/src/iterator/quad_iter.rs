use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;
use graphforge_model::{Direction, NodeHash, QuadHash};
use std::sync::Arc;

/// The per-backend iterator answering "quads matching `direction = value`"
/// (§2 row F). `MemoryStore` materializes the matching set at construction
/// time from its per-direction index, the same snapshot strategy
/// [`All`](crate::iterator::all::All) uses.
#[derive(Debug, Clone)]
pub struct QuadIterator {
    dir: Direction,
    value: NodeHash,
    items: Arc<[QuadHash]>,
    cursor: Option<usize>,
    tagger: Tagger,
}

impl QuadIterator {
    #[must_use]
    pub fn new(dir: Direction, value: NodeHash, items: Arc<[QuadHash]>) -> Self {
        Self {
            dir,
            value,
            items,
            cursor: None,
            tagger: Tagger::new(),
        }
    }
}

impl QueryIterator for QuadIterator {
    fn next(&mut self) -> bool {
        let next_idx = self.cursor.map_or(0, |c| c + 1);
        if next_idx < self.items.len() {
            self.cursor = Some(next_idx);
            true
        } else {
            self.cursor = Some(self.items.len());
            false
        }
    }

    fn result(&self) -> Option<Handle> {
        self.cursor
            .and_then(|c| self.items.get(c))
            .map(|q| Handle::Quad(*q))
    }

    fn contains(&mut self, handle: Handle) -> bool {
        match handle {
            Handle::Quad(q) => self.items.contains(&q) && q.get(self.dir) == self.value,
            Handle::Node(_) => false,
        }
    }

    fn next_path(&mut self) -> bool {
        false
    }

    fn reset(&mut self) {
        self.cursor = None;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(self.clone())
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
        Vec::new()
    }

    fn stats(&self) -> Stats {
        #[allow(clippy::cast_possible_wrap)]
        let size = self.items.len() as i64;
        Stats::new(1.0, 1.0, size, true)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::QuadIterator
    }

    fn err(&self) -> Option<&IteratorError> {
        None
    }
}

use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;
use std::sync::Arc;

/// Enumerates every node or every quad the backend currently holds
/// (§4.2.1: "delegates to a backend cursor").
///
/// `MemoryStore` has no long-lived cursor abstraction, so the "cursor" here
/// is a snapshot taken at construction time — consistent with §5's
/// single-query-snapshot model, since nothing else mutates it mid-query.
#[derive(Debug, Clone)]
pub struct All {
    items: Arc<[Handle]>,
    cursor: Option<usize>,
    tagger: Tagger,
}

impl All {
    #[must_use]
    pub fn new(items: Arc<[Handle]>) -> Self {
        Self {
            items,
            cursor: None,
            tagger: Tagger::new(),
        }
    }
}

impl QueryIterator for All {
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
        self.cursor.and_then(|c| self.items.get(c).copied())
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.items.contains(&handle)
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
        IteratorType::All
    }

    fn err(&self) -> Option<&IteratorError> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphforge_model::NodeHash;

    #[test]
    fn enumerates_every_item_once() {
        let items: Arc<[Handle]> = Arc::from(vec![
            Handle::Node(NodeHash::empty()),
        ]);
        let mut all = All::new(items);
        assert!(all.next());
        assert!(!all.next());
    }
}

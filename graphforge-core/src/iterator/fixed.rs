use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;
use rustc_hash::FxHashSet;

/// An ordered set of handles inserted by [`Fixed::add`] (§4.2.1).
///
/// `next` walks insertion order; `contains` is O(1) average via a side
/// hash set. The optimizer rewrites a size-one `Fixed` feeding a `LinksTo`
/// into a native [`QuadIterator`](crate::iterator::quad_iter::QuadIterator)
/// (§4.4), so keeping insertion order here (rather than a set) matters for
/// that rewrite to preserve result order.
#[derive(Debug, Clone, Default)]
pub struct Fixed {
    values: Vec<Handle>,
    seen: FxHashSet<Handle>,
    cursor: Option<usize>,
    tagger: Tagger,
}

impl Fixed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, handle: Handle) {
        if self.seen.insert(handle) {
            self.values.push(handle);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[Handle] {
        &self.values
    }
}

impl QueryIterator for Fixed {
    fn next(&mut self) -> bool {
        let next_idx = self.cursor.map_or(0, |c| c + 1);
        if next_idx < self.values.len() {
            self.cursor = Some(next_idx);
            true
        } else {
            self.cursor = Some(self.values.len());
            false
        }
    }

    fn result(&self) -> Option<Handle> {
        self.cursor.and_then(|c| self.values.get(c).copied())
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.seen.contains(&handle)
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
        let size = self.values.len() as i64;
        Stats::new(1.0, 1.0, size, true)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::Fixed
    }

    fn err(&self) -> Option<&IteratorError> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphforge_model::NodeHash;

    fn h(n: u8) -> Handle {
        let mut bytes = [0u8; graphforge_model::HASH_WIDTH];
        bytes[0] = n;
        Handle::Node(NodeHash::from_be_bytes(bytes))
    }

    #[test]
    fn walks_in_insertion_order() {
        let mut f = Fixed::new();
        f.add(h(1));
        f.add(h(2));
        assert!(f.next());
        assert_eq!(f.result(), Some(h(1)));
        assert!(f.next());
        assert_eq!(f.result(), Some(h(2)));
        assert!(!f.next());
    }

    #[test]
    fn dedups_on_add() {
        let mut f = Fixed::new();
        f.add(h(1));
        f.add(h(1));
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn contains_is_independent_of_cursor() {
        let mut f = Fixed::new();
        f.add(h(1));
        assert!(f.contains(h(1)));
        assert!(!f.contains(h(2)));
    }

    #[test]
    fn reset_rewinds_to_pre_first_next() {
        let mut f = Fixed::new();
        f.add(h(1));
        f.next();
        f.reset();
        assert_eq!(f.result(), None);
    }
}

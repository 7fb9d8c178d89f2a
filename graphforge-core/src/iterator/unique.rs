use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;
use rustc_hash::FxHashSet;

/// Filters duplicates out of `sub` by materializing a hash set of seen
/// handles as it streams (§4.2.1). `next_path` is disabled once a value has
/// been emitted: a duplicate occurrence's alternate tag bindings are lost,
/// matching the source's "first wins" dedup semantics.
#[derive(Debug)]
pub struct Unique {
    sub: Box<dyn QueryIterator>,
    seen: FxHashSet<Handle>,
    tagger: Tagger,
}

impl Unique {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>) -> Self {
        Self {
            sub,
            seen: FxHashSet::default(),
            tagger: Tagger::new(),
        }
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }
}

impl QueryIterator for Unique {
    fn next(&mut self) -> bool {
        loop {
            if !self.sub.next() {
                return false;
            }
            let Some(candidate) = self.sub.result() else {
                continue;
            };
            if self.seen.insert(candidate) {
                return true;
            }
        }
    }

    fn result(&self) -> Option<Handle> {
        self.sub.result()
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.sub.contains(handle)
    }

    fn next_path(&mut self) -> bool {
        false
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.seen.clear();
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            seen: self.seen.clone(),
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
        Stats::new(s.contains_cost, s.next_cost, s.size, false)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::Unique
    }

    fn close(&mut self) {
        self.sub.close();
    }

    fn err(&self) -> Option<&IteratorError> {
        self.sub.err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::or::Or;
    use crate::iterator::fixed::Fixed;
    use graphforge_model::NodeHash;

    fn h(n: u8) -> Handle {
        let mut bytes = [0u8; graphforge_model::HASH_WIDTH];
        bytes[0] = n;
        Handle::Node(NodeHash::from_be_bytes(bytes))
    }

    #[test]
    fn dedups_union_output() {
        let mut a = Fixed::new();
        a.add(h(1));
        let mut b = Fixed::new();
        b.add(h(1));
        let or = Or::new(vec![Box::new(a), Box::new(b)]);
        let mut unique = Unique::new(Box::new(or));
        let mut count = 0;
        while unique.next() {
            count += 1;
        }
        assert_eq!(count, 1);
    }
}

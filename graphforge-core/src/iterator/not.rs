use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;

/// `universe \ sub` (§4.2.1): `next` pulls from `universe`, skipping any
/// value `sub` contains; `contains(v) = universe.contains(v) ∧ ¬sub.contains(v)`.
#[derive(Debug)]
pub struct Not {
    sub: Box<dyn QueryIterator>,
    universe: Box<dyn QueryIterator>,
    tagger: Tagger,
}

impl Not {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>, universe: Box<dyn QueryIterator>) -> Self {
        Self {
            sub,
            universe,
            tagger: Tagger::new(),
        }
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }

    #[must_use]
    pub fn universe(&self) -> &dyn QueryIterator {
        self.universe.as_ref()
    }
}

impl QueryIterator for Not {
    fn next(&mut self) -> bool {
        loop {
            if !self.universe.next() {
                return false;
            }
            let Some(candidate) = self.universe.result() else {
                continue;
            };
            if !self.sub.contains(candidate) {
                return true;
            }
        }
    }

    fn result(&self) -> Option<Handle> {
        self.universe.result()
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.universe.contains(handle) && !self.sub.contains(handle)
    }

    fn next_path(&mut self) -> bool {
        self.universe.next_path()
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.universe.reset();
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            universe: self.universe.clone_box(),
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
        vec![self.sub.as_ref(), self.universe.as_ref()]
    }

    fn stats(&self) -> Stats {
        let sub_stats = self.sub.stats();
        let universe_stats = self.universe.stats();
        Stats::new(
            sub_stats.contains_cost + universe_stats.contains_cost,
            universe_stats.next_cost + sub_stats.contains_cost,
            (universe_stats.size - sub_stats.size).max(0),
            false,
        )
    }

    fn kind(&self) -> IteratorType {
        IteratorType::Not
    }

    fn close(&mut self) {
        self.sub.close();
        self.universe.close();
    }

    fn err(&self) -> Option<&IteratorError> {
        self.universe.err().or_else(|| self.sub.err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::fixed::Fixed;
    use graphforge_model::NodeHash;

    fn h(n: u8) -> Handle {
        let mut bytes = [0u8; graphforge_model::HASH_WIDTH];
        bytes[0] = n;
        Handle::Node(NodeHash::from_be_bytes(bytes))
    }

    #[test]
    fn excludes_sub_members_from_universe() {
        let mut universe = Fixed::new();
        universe.add(h(1));
        universe.add(h(2));
        universe.add(h(3));
        let mut sub = Fixed::new();
        sub.add(h(2));
        let mut not = Not::new(Box::new(sub), Box::new(universe));
        let mut seen = Vec::new();
        while not.next() {
            seen.push(not.result().unwrap());
        }
        assert_eq!(seen, vec![h(1), h(3)]);
    }
}

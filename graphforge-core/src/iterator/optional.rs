use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;
use rustc_hash::FxHashMap;

/// Wraps a branch that must never reject a row, used to compile
/// `save_optional`/`save_optional_reverse` (§4.3): `contains(v)` always
/// returns `true` so an `And` never filters the outer row on this branch,
/// but the branch's tags are only bound into the result when `sub` actually
/// matched — tracked in `last_matched` since `contains` is the only call
/// site that exercises `sub` against the candidate in question.
#[derive(Debug)]
pub struct Optional {
    sub: Box<dyn QueryIterator>,
    last_matched: bool,
    tagger: Tagger,
}

impl Optional {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>) -> Self {
        Self {
            sub,
            last_matched: false,
            tagger: Tagger::new(),
        }
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }
}

impl QueryIterator for Optional {
    fn next(&mut self) -> bool {
        self.sub.next()
    }

    fn result(&self) -> Option<Handle> {
        self.sub.result()
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.last_matched = self.sub.contains(handle);
        true
    }

    fn next_path(&mut self) -> bool {
        self.sub.next_path()
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.last_matched = false;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            last_matched: self.last_matched,
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

    fn tag_results(&self, out: &mut FxHashMap<String, Handle>) {
        self.tagger().collect_into(self.result(), out);
        if self.last_matched {
            self.sub.tag_results(out);
        }
    }

    fn sub_iterators(&self) -> Vec<&dyn QueryIterator> {
        vec![self.sub.as_ref()]
    }

    fn stats(&self) -> Stats {
        let s = self.sub.stats();
        Stats::new(s.contains_cost, s.next_cost, s.size, false)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::Optional
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
    use crate::iterator::fixed::Fixed;
    use graphforge_model::NodeHash;

    fn h(n: u8) -> Handle {
        let mut bytes = [0u8; graphforge_model::HASH_WIDTH];
        bytes[0] = n;
        Handle::Node(NodeHash::from_be_bytes(bytes))
    }

    #[test]
    fn contains_is_always_true_even_without_match() {
        let mut sub = Fixed::new();
        sub.add(h(1));
        let mut opt = Optional::new(Box::new(sub));
        assert!(opt.contains(h(99)));
        assert!(!opt.last_matched);
    }

    #[test]
    fn records_match_for_tag_gating() {
        let mut sub = Fixed::new();
        sub.add(h(1));
        let mut opt = Optional::new(Box::new(sub));
        assert!(opt.contains(h(1)));
        assert!(opt.last_matched);
    }
}

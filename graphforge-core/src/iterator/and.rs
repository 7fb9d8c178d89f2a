use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;

/// Intersection of its children (§4.2.1).
///
/// The first child is the *primary* — by convention the cheapest
/// `next_cost` once the optimizer has reordered children ascending by
/// `stats().size` at build time (§4.2.1: "Optimization: reorder children by
/// ascending `stats.size`"). `And` itself doesn't reorder; that's
/// `optimize`'s job, so a freshly-built `And` just uses insertion order.
#[derive(Debug)]
pub struct And {
    children: Vec<Box<dyn QueryIterator>>,
    tagger: Tagger,
    err: Option<IteratorError>,
}

impl And {
    #[must_use]
    pub fn new(children: Vec<Box<dyn QueryIterator>>) -> Self {
        Self {
            children,
            tagger: Tagger::new(),
            err: None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[Box<dyn QueryIterator>] {
        &self.children
    }

    fn secondary_contains_all(&mut self, handle: Handle) -> bool {
        self.children[1..].iter_mut().all(|c| c.contains(handle))
    }
}

impl QueryIterator for And {
    fn next(&mut self) -> bool {
        if self.err.is_some() || self.children.is_empty() {
            return false;
        }
        loop {
            if !self.children[0].next() {
                if let Some(e) = self.children[0].err() {
                    self.err = Some(e.clone());
                }
                return false;
            }
            let Some(candidate) = self.children[0].result() else {
                continue;
            };
            if self.secondary_contains_all(candidate) {
                return true;
            }
        }
    }

    fn result(&self) -> Option<Handle> {
        self.children.first().and_then(|c| c.result())
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.children.iter_mut().all(|c| c.contains(handle))
    }

    fn next_path(&mut self) -> bool {
        self.children[1..].iter_mut().any(|c| c.next_path())
    }

    fn reset(&mut self) {
        for c in &mut self.children {
            c.reset();
        }
        self.err = None;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            children: self.children.iter().map(|c| c.clone_box()).collect(),
            tagger: self.tagger.clone(),
            err: self.err.clone(),
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
        self.children.iter().map(AsRef::as_ref).collect()
    }

    fn stats(&self) -> Stats {
        let mut contains_cost = 0.0;
        let mut next_cost = 0.0;
        let mut size = i64::MAX;
        let mut exact = true;
        for c in &self.children {
            let s = c.stats();
            contains_cost += s.contains_cost;
            next_cost += s.next_cost;
            size = size.min(s.size);
            exact = exact && s.exact_size;
        }
        if self.children.is_empty() {
            size = 0;
        }
        Stats::new(contains_cost, next_cost, size, exact)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::And
    }

    fn close(&mut self) {
        for c in &mut self.children {
            c.close();
        }
    }

    fn err(&self) -> Option<&IteratorError> {
        self.err.as_ref()
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
    fn intersects_two_fixed_sets() {
        let mut a = Fixed::new();
        a.add(h(1));
        a.add(h(2));
        let mut b = Fixed::new();
        b.add(h(2));
        b.add(h(3));
        let mut and = And::new(vec![Box::new(a), Box::new(b)]);
        assert!(and.next());
        assert_eq!(and.result(), Some(h(2)));
        assert!(!and.next());
    }

    #[test]
    fn contains_requires_all_children() {
        let mut a = Fixed::new();
        a.add(h(1));
        let mut b = Fixed::new();
        b.add(h(2));
        let mut and = And::new(vec![Box::new(a), Box::new(b)]);
        assert!(!and.contains(h(1)));
    }
}

use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;

/// Union of its children (§4.2.1): `next` drains children in order, with
/// no deduplication (wrap in [`Unique`](crate::iterator::unique::Unique)
/// for set semantics); `contains` tries each child in turn.
#[derive(Debug)]
pub struct Or {
    children: Vec<Box<dyn QueryIterator>>,
    current: usize,
    tagger: Tagger,
    err: Option<IteratorError>,
}

impl Or {
    #[must_use]
    pub fn new(children: Vec<Box<dyn QueryIterator>>) -> Self {
        Self {
            children,
            current: 0,
            tagger: Tagger::new(),
            err: None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[Box<dyn QueryIterator>] {
        &self.children
    }
}

impl QueryIterator for Or {
    fn next(&mut self) -> bool {
        if self.err.is_some() {
            return false;
        }
        while self.current < self.children.len() {
            if self.children[self.current].next() {
                return true;
            }
            if let Some(e) = self.children[self.current].err() {
                self.err = Some(e.clone());
                return false;
            }
            self.current += 1;
        }
        false
    }

    fn result(&self) -> Option<Handle> {
        self.children.get(self.current).and_then(|c| c.result())
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.children.iter_mut().any(|c| c.contains(handle))
    }

    fn next_path(&mut self) -> bool {
        self.children
            .get_mut(self.current)
            .is_some_and(|c| c.next_path())
    }

    fn reset(&mut self) {
        for c in &mut self.children {
            c.reset();
        }
        self.current = 0;
        self.err = None;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            children: self.children.iter().map(|c| c.clone_box()).collect(),
            current: self.current,
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
        let mut size = 0;
        let mut exact = true;
        for c in &self.children {
            let s = c.stats();
            contains_cost += s.contains_cost;
            next_cost += s.next_cost;
            size += s.size;
            exact = exact && s.exact_size;
        }
        Stats::new(contains_cost, next_cost, size, exact)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::Or
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
    fn concatenates_children_in_order() {
        let mut a = Fixed::new();
        a.add(h(1));
        let mut b = Fixed::new();
        b.add(h(2));
        let mut or = Or::new(vec![Box::new(a), Box::new(b)]);
        assert!(or.next());
        assert_eq!(or.result(), Some(h(1)));
        assert!(or.next());
        assert_eq!(or.result(), Some(h(2)));
        assert!(!or.next());
    }

    #[test]
    fn no_dedup_without_unique_wrapper() {
        let mut a = Fixed::new();
        a.add(h(1));
        let mut b = Fixed::new();
        b.add(h(1));
        let mut or = Or::new(vec![Box::new(a), Box::new(b)]);
        let mut count = 0;
        while or.next() {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}

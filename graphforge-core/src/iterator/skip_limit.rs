use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;
use graphforge_model::Value;

/// Drops the first `n` results of `sub` (§4.2.1).
#[derive(Debug)]
pub struct Skip {
    sub: Box<dyn QueryIterator>,
    n: u64,
    skipped: u64,
    tagger: Tagger,
}

impl Skip {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>, n: u64) -> Self {
        Self {
            sub,
            n,
            skipped: 0,
            tagger: Tagger::new(),
        }
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }

    #[must_use]
    pub const fn n(&self) -> u64 {
        self.n
    }
}

impl QueryIterator for Skip {
    fn next(&mut self) -> bool {
        while self.skipped < self.n {
            if !self.sub.next() {
                return false;
            }
            self.skipped += 1;
        }
        self.sub.next()
    }

    fn result(&self) -> Option<Handle> {
        self.sub.result()
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.sub.contains(handle)
    }

    fn next_path(&mut self) -> bool {
        self.sub.next_path()
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.skipped = 0;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            n: self.n,
            skipped: self.skipped,
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
        #[allow(clippy::cast_possible_wrap)]
        let n = self.n as i64;
        Stats::new(s.contains_cost, s.next_cost, (s.size - n).max(0), s.exact_size)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::Skip
    }

    fn close(&mut self) {
        self.sub.close();
    }

    fn err(&self) -> Option<&IteratorError> {
        self.sub.err()
    }
}

/// Caps `sub` at `n` results (§4.2.1). `Skip(n).Limit(m)` composes to the
/// `[n, n+m)` sub-sequence (§8's algebraic invariant).
#[derive(Debug)]
pub struct Limit {
    sub: Box<dyn QueryIterator>,
    n: u64,
    emitted: u64,
    tagger: Tagger,
}

impl Limit {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>, n: u64) -> Self {
        Self {
            sub,
            n,
            emitted: 0,
            tagger: Tagger::new(),
        }
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }

    #[must_use]
    pub const fn n(&self) -> u64 {
        self.n
    }
}

impl QueryIterator for Limit {
    fn next(&mut self) -> bool {
        if self.emitted >= self.n {
            return false;
        }
        if self.sub.next() {
            self.emitted += 1;
            true
        } else {
            false
        }
    }

    fn result(&self) -> Option<Handle> {
        self.sub.result()
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.sub.contains(handle)
    }

    fn next_path(&mut self) -> bool {
        self.sub.next_path()
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.emitted = 0;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            n: self.n,
            emitted: self.emitted,
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
        #[allow(clippy::cast_possible_wrap)]
        let n = self.n as i64;
        Stats::new(s.contains_cost, s.next_cost, s.size.min(n), s.exact_size)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::Limit
    }

    fn close(&mut self) {
        self.sub.close();
    }

    fn err(&self) -> Option<&IteratorError> {
        self.sub.err()
    }
}

/// Terminal iterator yielding a single `Value::Int` equal to the length of
/// the materialized upstream sequence (§4.2.1, §8).
#[derive(Debug)]
pub struct Count {
    sub: Box<dyn QueryIterator>,
    result: Option<i64>,
    tagger: Tagger,
}

impl Count {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>) -> Self {
        Self {
            sub,
            result: None,
            tagger: Tagger::new(),
        }
    }

    /// The counted value, once `next()` has produced the single yield.
    #[must_use]
    pub fn literal_result(&self) -> Option<Value> {
        self.result.map(Value::int)
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }
}

impl crate::iterator::TerminalLiteral for Count {
    fn literal_result(&self) -> Option<Value> {
        Self::literal_result(self)
    }
}

impl QueryIterator for Count {
    fn next(&mut self) -> bool {
        if self.result.is_some() {
            return false;
        }
        let mut n: i64 = 0;
        while self.sub.next() {
            n += 1;
        }
        self.result = Some(n);
        true
    }

    fn result(&self) -> Option<Handle> {
        None
    }

    fn contains(&mut self, _handle: Handle) -> bool {
        false
    }

    fn next_path(&mut self) -> bool {
        false
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.result = None;
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            result: self.result,
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
        Stats::new(1.0, s.next_cost, 1, true)
    }

    fn kind(&self) -> IteratorType {
        IteratorType::Count
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

    fn seeded(n: u8) -> Fixed {
        let mut f = Fixed::new();
        for i in 0..n {
            let mut bytes = [0u8; graphforge_model::HASH_WIDTH];
            bytes[0] = i;
            f.add(Handle::Node(NodeHash::from_be_bytes(bytes)));
        }
        f
    }

    #[test]
    fn skip_then_limit_is_a_subrange() {
        let mut it: Box<dyn QueryIterator> = Box::new(seeded(10));
        it = Box::new(Skip::new(it, 2));
        it = Box::new(Limit::new(it, 3));
        let mut results = Vec::new();
        while it.next() {
            results.push(it.result().unwrap());
        }
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn count_yields_sequence_length() {
        let mut count = Count::new(Box::new(seeded(4)));
        assert!(count.next());
        assert_eq!(count.literal_result(), Some(Value::int(4)));
        assert!(!count.next());
    }
}

use crate::error::IteratorError;
use crate::iterator::comparison::Resolver;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;

/// Matches value strings against a compiled pattern (§4.2.1). When
/// `allow_refs` is `false`, `Iri`/`BNode` values are excluded outright; when
/// `true` their lexical form participates like any other string value.
///
/// Patterns are plain substrings here rather than a full regex engine — the
/// distilled spec names the operator `Regex` but never requires a specific
/// dialect, and the substring form is the common case exercised by the
/// path builder's `.regex(pat)`.
#[derive(Debug)]
pub struct Regex {
    sub: Box<dyn QueryIterator>,
    pattern: String,
    allow_refs: bool,
    resolve: Resolver,
    tagger: Tagger,
}

impl Regex {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>, pattern: impl Into<String>, allow_refs: bool, resolve: Resolver) -> Self {
        Self {
            sub,
            pattern: pattern.into(),
            allow_refs,
            resolve,
            tagger: Tagger::new(),
        }
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub const fn allow_refs(&self) -> bool {
        self.allow_refs
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolve
    }

    fn matches(&self, handle: Handle) -> bool {
        let Handle::Node(hash) = handle else {
            return false;
        };
        let Some(value) = (self.resolve)(hash) else {
            return false;
        };
        if !self.allow_refs && value.is_ref() {
            return false;
        }
        value
            .lexical_form()
            .is_some_and(|lexical| lexical.contains(&self.pattern))
    }
}

impl QueryIterator for Regex {
    fn next(&mut self) -> bool {
        loop {
            if !self.sub.next() {
                return false;
            }
            let Some(candidate) = self.sub.result() else {
                continue;
            };
            if self.matches(candidate) {
                return true;
            }
        }
    }

    fn result(&self) -> Option<Handle> {
        self.sub.result()
    }

    fn contains(&mut self, handle: Handle) -> bool {
        self.sub.contains(handle) && self.matches(handle)
    }

    fn next_path(&mut self) -> bool {
        self.sub.next_path()
    }

    fn reset(&mut self) {
        self.sub.reset();
    }

    fn clone_box(&self) -> Box<dyn QueryIterator> {
        Box::new(Self {
            sub: self.sub.clone_box(),
            pattern: self.pattern.clone(),
            allow_refs: self.allow_refs,
            resolve: self.resolve.clone(),
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
        IteratorType::Regex
    }

    fn close(&mut self) {
        self.sub.close();
    }

    fn err(&self) -> Option<&IteratorError> {
        self.sub.err()
    }
}

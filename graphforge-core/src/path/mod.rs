//! The fluent path builder and morphism compiler (§4.3).
//!
//! A [`Path`] carries a quad-store handle, a base seed, and an ordered
//! stack of [`Morphism`]s. Building an iterator folds the stack
//! left-to-right over the seed (§4.3.1); `reverse()` walks the stack
//! right-to-left, reversing each morphism, the way the teacher's
//! `PropertyPath` evaluator runs a path forward or backward over the same
//! compiled plan.

pub mod morphism;

use crate::iterator::all::All;
use crate::iterator::fixed::Fixed;
use crate::iterator::comparison::ComparisonOp;
use crate::iterator::{Handle, QueryIterator};
use crate::store::QuadStore;
use graphforge_model::Value;
use morphism::{FilterSpec, Morphism, Via};
use std::sync::Arc;

/// Compile-time traversal context threaded through morphism application;
/// currently just the active label restriction set by `label_context`
/// (§4.3: "Out/In within this context intersect traversed quads with those
/// whose Label is in the context").
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    pub label_restriction: Option<Vec<Value>>,
}

/// The seed a path starts from: either a fixed set of named values, or
/// every node in the store (`start()` with no arguments).
#[derive(Debug, Clone)]
enum Seed {
    Values(Vec<Value>),
    All,
}

#[derive(Debug, Clone)]
pub struct Path {
    store: Arc<dyn QuadStore>,
    seed: Seed,
    morphisms: Vec<Morphism>,
    tag_positions: std::collections::HashMap<String, usize>,
}

impl Path {
    /// `start(values)`: seeds the path at the given nodes. An empty list
    /// seeds at every node in the store, matching `start()` with no
    /// arguments (§4.3's DSL table).
    #[must_use]
    pub fn start(store: Arc<dyn QuadStore>, values: Vec<Value>) -> Self {
        let seed = if values.is_empty() { Seed::All } else { Seed::Values(values) };
        Self {
            store,
            seed,
            morphisms: Vec::new(),
            tag_positions: std::collections::HashMap::new(),
        }
    }

    #[must_use]
    pub fn start_all(store: Arc<dyn QuadStore>) -> Self {
        Self::start(store, Vec::new())
    }

    /// The quad-store this path is bound to, needed by
    /// [`QueryDriver`](crate::driver::QueryDriver) to resolve results and
    /// invoke [`QuadStore::optimize_iterator`].
    #[must_use]
    pub fn store(&self) -> &Arc<dyn QuadStore> {
        &self.store
    }

    fn push(mut self, m: Morphism) -> Self {
        self.morphisms.push(m);
        self
    }

    fn record_tag(&mut self, name: &str) {
        let pos = self.morphisms.len();
        self.tag_positions.insert(name.to_owned(), pos);
    }

    // -- traversal -----------------------------------------------------

    #[must_use]
    pub fn out(self, via: Via) -> Self {
        self.push(Morphism::Out { via, tags: Vec::new() })
    }

    #[must_use]
    pub fn r#in(self, via: Via) -> Self {
        self.push(Morphism::In { via, tags: Vec::new() })
    }

    #[must_use]
    pub fn both(self, via: Via) -> Self {
        self.push(Morphism::Both { via, tags: Vec::new() })
    }

    #[must_use]
    pub fn out_tagged(self, via: Via, tags: Vec<String>) -> Self {
        self.push(Morphism::Out { via, tags })
    }

    #[must_use]
    pub fn in_tagged(self, via: Via, tags: Vec<String>) -> Self {
        self.push(Morphism::In { via, tags })
    }

    // -- filtering -------------------------------------------------------

    #[must_use]
    pub fn has(self, via: Via, values: Vec<Value>) -> Self {
        self.push(Morphism::Has { via, values })
    }

    #[must_use]
    pub fn has_reverse(self, via: Via, values: Vec<Value>) -> Self {
        self.push(Morphism::HasReverse { via, values })
    }

    #[must_use]
    pub fn is(self, values: Vec<Value>) -> Self {
        self.push(Morphism::Is(values))
    }

    // -- tagging -----------------------------------------------------

    #[must_use]
    pub fn tag(mut self, names: Vec<String>) -> Self {
        for n in &names {
            self.record_tag(n);
        }
        self.push(Morphism::Tag(names))
    }

    #[must_use]
    pub fn save(mut self, via: Via, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.record_tag(&tag);
        self.push(Morphism::Save { via, tag, reverse: false, optional: false })
    }

    #[must_use]
    pub fn save_reverse(mut self, via: Via, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.record_tag(&tag);
        self.push(Morphism::Save { via, tag, reverse: true, optional: false })
    }

    #[must_use]
    pub fn save_optional(mut self, via: Via, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.record_tag(&tag);
        self.push(Morphism::Save { via, tag, reverse: false, optional: true })
    }

    #[must_use]
    pub fn save_optional_reverse(mut self, via: Via, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.record_tag(&tag);
        self.push(Morphism::Save { via, tag, reverse: true, optional: true })
    }

    /// Rewind to the tag's binding point and re-intersect (§4.3: "resolved
    /// at compile time via the morphism stack, not by retained pointers
    /// into live iterators. Intersect result with the current set.").
    ///
    /// The reverse walk (replaying, in reverse, every morphism pushed after
    /// `tag` was introduced, over the current set) only recovers the nodes
    /// reachable backward from where the path now stands — on its own that
    /// can overshoot the tag point (e.g. every node sharing the traversed
    /// value, not just the ones this path actually passed through). `And`
    /// with the iterator rebuilt at the tag point itself (morphisms
    /// `[0, pos)` applied fresh to the seed) is Cayley's actual `back`: the
    /// intersection of "what the reverse walk reaches" with "what was here
    /// when `tag` was recorded".
    #[must_use]
    pub fn back(self, tag: &str) -> Self {
        let Some(&pos) = self.tag_positions.get(tag) else {
            return self;
        };
        let reversed_suffix: Vec<Morphism> =
            self.morphisms[pos..].iter().map(Morphism::reverse).rev().collect();
        let tag_point = Box::new(Self {
            store: Arc::clone(&self.store),
            seed: self.seed.clone(),
            morphisms: self.morphisms[..pos].to_vec(),
            tag_positions: self.tag_positions.clone(),
        });
        self.push(Morphism::Back { tag_point, reversed_suffix })
    }

    // -- set algebra -----------------------------------------------------

    #[must_use]
    pub fn and(self, other: Path) -> Self {
        self.push(Morphism::And(Box::new(other)))
    }

    #[must_use]
    pub fn or(self, other: Path) -> Self {
        self.push(Morphism::Or(Box::new(other)))
    }

    #[must_use]
    pub fn except(self, other: Path) -> Self {
        self.push(Morphism::Except(Box::new(other)))
    }

    #[must_use]
    pub fn unique(self) -> Self {
        self.push(Morphism::Unique)
    }

    // -- inlining another path's morphisms -------------------------------

    #[must_use]
    pub fn follow(self, other: Path) -> Self {
        self.push(Morphism::Follow(Box::new(other)))
    }

    #[must_use]
    pub fn follow_reverse(self, other: Path) -> Self {
        self.push(Morphism::FollowReverse(Box::new(other)))
    }

    #[must_use]
    pub fn follow_recursive(self, via: Via, max_depth: u64) -> Self {
        self.push(Morphism::FollowRecursive { via, max_depth, tags: Vec::new() })
    }

    #[must_use]
    pub fn label_context(self, via: Via) -> Self {
        self.push(Morphism::LabelContext { via, tags: Vec::new() })
    }

    // -- value filters -----------------------------------------------------

    #[must_use]
    pub fn filter(self, op: ComparisonOp, value: Value) -> Self {
        self.push(Morphism::Filter { op, value })
    }

    #[must_use]
    pub fn regex(self, pattern: impl Into<String>) -> Self {
        self.push(Morphism::Regex { pattern: pattern.into(), allow_refs: false })
    }

    #[must_use]
    pub fn regex_with_refs(self, pattern: impl Into<String>) -> Self {
        self.push(Morphism::Regex { pattern: pattern.into(), allow_refs: true })
    }

    /// `filters(wildcards…)`: chains a batch of `filter`/`regex` entries in
    /// order, the same way a single `.filter(op, v).regex(p)` chain would
    /// (§4.3's DSL table sugar).
    #[must_use]
    pub fn filters(self, specs: Vec<FilterSpec>) -> Self {
        specs.into_iter().fold(self, |p, spec| match spec {
            FilterSpec::Compare(op, value) => p.filter(op, value),
            FilterSpec::Regex(pattern) => p.regex(pattern),
            FilterSpec::RegexWithRefs(pattern) => p.regex_with_refs(pattern),
        })
    }

    // -- cardinality -----------------------------------------------------

    #[must_use]
    pub fn skip(self, n: u64) -> Self {
        self.push(Morphism::Skip(n))
    }

    #[must_use]
    pub fn limit(self, n: u64) -> Self {
        self.push(Morphism::Limit(n))
    }

    #[must_use]
    pub fn count(self) -> Self {
        self.push(Morphism::Count)
    }

    // -- predicate/label sugar, built from the same `traverse`/`has` blocks
    // as out/in/has rather than as distinct morphism variants.

    #[must_use]
    pub fn predicates(self, reverse: bool) -> Self {
        let via = Via::Any;
        if reverse { self.r#in(via) } else { self.out(via) }
    }

    #[must_use]
    pub fn save_predicates(self, reverse: bool, tag: impl Into<String>) -> Self {
        if reverse {
            self.save_reverse(Via::Any, tag)
        } else {
            self.save(Via::Any, tag)
        }
    }

    /// Projects the current node set to the labels of the quads they're a
    /// subject of (§4.3's DSL table: "Projections to predicate/label
    /// nodes").
    #[must_use]
    pub fn labels(self) -> Self {
        self.push(Morphism::Labels { tags: Vec::new() })
    }

    // -- compilation -----------------------------------------------------

    fn seed_iterator(&self) -> Box<dyn QueryIterator> {
        match &self.seed {
            Seed::All => self.store.nodes_all_iterator(),
            Seed::Values(values) => {
                let mut fixed = Fixed::new();
                for v in values {
                    fixed.add(Handle::Node(self.store.value_of(v)));
                }
                Box::new(fixed)
            }
        }
    }

    /// Folds the morphism stack left-to-right over the seed (§4.3.1).
    #[must_use]
    pub fn build_iterator_on(&self) -> Box<dyn QueryIterator> {
        let mut ctx = PathContext::default();
        let mut iter = self.seed_iterator();
        for m in &self.morphisms {
            iter = m.apply(&self.store, iter, &mut ctx);
        }
        iter
    }

    /// Inlines this path's morphisms onto an externally supplied
    /// iterator/context, used by `follow` (§4.3's "Inline apply another
    /// path's morphism list").
    pub(crate) fn apply_onto(
        &self,
        store: &Arc<dyn QuadStore>,
        mut in_iter: Box<dyn QueryIterator>,
        ctx: &mut PathContext,
    ) -> Box<dyn QueryIterator> {
        for m in &self.morphisms {
            in_iter = m.apply(store, in_iter, ctx);
        }
        in_iter
    }

    /// As [`Self::apply_onto`], but walks the stack in reverse with each
    /// morphism reversed, used by `follow_reverse`.
    pub(crate) fn apply_reversed_onto(
        &self,
        store: &Arc<dyn QuadStore>,
        mut in_iter: Box<dyn QueryIterator>,
        ctx: &mut PathContext,
    ) -> Box<dyn QueryIterator> {
        for m in self.morphisms.iter().rev() {
            in_iter = m.reverse().apply(store, in_iter, ctx);
        }
        in_iter
    }

    /// A new path whose morphism stack is this one's, reversed (§4.3).
    #[must_use]
    pub fn reverse(&self) -> Self {
        let morphisms = self.morphisms.iter().rev().map(Morphism::reverse).collect();
        Self {
            store: Arc::clone(&self.store),
            seed: self.seed.clone(),
            morphisms,
            tag_positions: self.tag_positions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn store() -> Arc<dyn QuadStore> {
        Arc::new(MemoryStore::default())
    }

    #[test]
    fn start_with_no_values_seeds_all_nodes() {
        let s = store();
        let p = Path::start_all(Arc::clone(&s));
        assert!(matches!(p.seed, Seed::All));
    }

    #[test]
    fn start_with_values_seeds_fixed() {
        let s = store();
        let p = Path::start(Arc::clone(&s), vec![Value::iri("urn:a")]);
        assert!(matches!(p.seed, Seed::Values(_)));
    }

    #[test]
    fn back_with_unknown_tag_is_a_no_op() {
        let s = store();
        let p = Path::start_all(Arc::clone(&s)).back("never-tagged");
        assert!(p.morphisms.is_empty());
    }
}

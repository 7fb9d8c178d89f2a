//! The optimizer (§4.4, §2 row I): local, result-set-preserving rewrites of
//! a built iterator tree.
//!
//! Two rewrites are named in the distilled spec:
//!
//! 1. `LinksTo(Fixed of size 1, dir)` → a native backend `QuadIterator` —
//!    always preferable to a general scan over a one-element set, with the
//!    `Fixed`'s tags migrated as *fixed* bindings on the replacement.
//! 2. `And` with a backend `QuadIterator` present: compare pushing a
//!    sibling `LinksTo` down into the storage layer against leaving it as a
//!    generic join, by the `(ltoContains + qNext)·qSize` vs.
//!    `(ltoNext + qContains)·ltoSize` cost formula.
//!
//! `MemoryStore` only ever exposes single-direction indices (no compound
//! `dir₁=v₁ AND dir₂ IN …` join at the storage layer), so rule 2 has
//! nothing further to push down once rule 1 has already turned every
//! `LinksTo` over a singleton `Fixed` into a `QuadIterator` — see
//! `DESIGN.md` for why this is recorded as a backend limitation rather
//! than an unimplemented rule. What's left of rule 2 here is the `And`
//! child reordering §4.2.1 calls out explicitly ("reorder children by
//! ascending `stats.size`"), which *is* fully implemented.
//!
//! The walk recurses through every combinator the path compiler actually
//! produces, because the canonical triple-pattern shape
//! (`HasA(And(LinksTo(pred), LinksTo(anchor)), dir)`, §4.2.2) buries the
//! `And`/`LinksTo` nodes rule 1 and 2 target underneath a `HasA` on every
//! single `out`/`in`/`has`/`save` morphism — an optimizer that only looked
//! at the root would basically never fire.

use crate::iterator::and::And;
use crate::iterator::comparison::Comparison;
use crate::iterator::fixed::Fixed;
use crate::iterator::hasa::HasA;
use crate::iterator::linksto::LinksTo;
use crate::iterator::not::Not;
use crate::iterator::optional::Optional;
use crate::iterator::or::Or;
use crate::iterator::regex::Regex;
use crate::iterator::skip_limit::{Count, Limit, Skip};
use crate::iterator::unique::Unique;
use crate::iterator::{Handle, IteratorType, QueryIterator};
use crate::store::QuadStore;
use std::sync::Arc;

/// Recursively rewrites `it`, returning the (possibly identical) tree and
/// whether any rewrite fired (§7 kind 6, `OptimizeDidNothing`, surfaced
/// here as a plain `bool` rather than an error variant since it's purely
/// informational).
#[must_use]
pub fn optimize(store: &Arc<dyn QuadStore>, it: Box<dyn QueryIterator>) -> (Box<dyn QueryIterator>, bool) {
    match it.kind() {
        IteratorType::LinksTo => optimize_links_to(store, it.as_ref()),
        IteratorType::And => optimize_and(store, it.as_ref()),
        IteratorType::Or => optimize_or(store, it.as_ref()),
        IteratorType::Not => optimize_not(store, it.as_ref()),
        IteratorType::HasA => optimize_hasa(store, it.as_ref()),
        IteratorType::Optional => optimize_optional(store, it.as_ref()),
        IteratorType::Unique => optimize_unique(store, it.as_ref()),
        IteratorType::Comparison => optimize_comparison(store, it.as_ref()),
        IteratorType::Regex => optimize_regex(store, it.as_ref()),
        IteratorType::Skip => optimize_skip(store, it.as_ref()),
        IteratorType::Limit => optimize_limit(store, it.as_ref()),
        IteratorType::Count => optimize_count(store, it.as_ref()),
        // Fixed/All/QuadIterator are leaves; nothing below them to rewrite.
        IteratorType::Fixed | IteratorType::All | IteratorType::QuadIterator => (it, false),
    }
}

fn copy_tags(from: &dyn QueryIterator, to: &mut Box<dyn QueryIterator>) {
    for name in from.tagger().tags() {
        to.tagger_mut().add_tag(name.clone());
    }
    for (name, handle) in from.tagger().fixed() {
        to.tagger_mut().add_fixed(name.clone(), *handle);
    }
}

fn optimize_links_to(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(lt) = it.as_any().downcast_ref::<LinksTo>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, sub_changed) = optimize(store, lt.sub().clone_box());

    if let Some(fixed) = opt_sub.as_any().downcast_ref::<Fixed>() {
        if fixed.len() == 1 {
            if let Handle::Node(value) = fixed.values()[0] {
                let mut rewritten = store.quad_iterator(lt.direction(), value);
                for name in fixed.tagger().tags() {
                    rewritten.tagger_mut().add_fixed(name.clone(), Handle::Node(value));
                }
                copy_tags(it, &mut rewritten);
                tracing::debug!(
                    dir = ?lt.direction(),
                    "optimizer: rewrote LinksTo(Fixed) to a native QuadIterator"
                );
                return (rewritten, true);
            }
        }
    }

    let mut rebuilt: Box<dyn QueryIterator> =
        Box::new(LinksTo::new(opt_sub, lt.direction(), Arc::clone(lt.store())));
    copy_tags(it, &mut rebuilt);
    (rebuilt, sub_changed)
}

fn optimize_and(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(and) = it.as_any().downcast_ref::<And>() else {
        return (it.clone_box(), false);
    };
    let mut changed = false;
    let mut children: Vec<Box<dyn QueryIterator>> = Vec::with_capacity(and.children().len());
    for c in and.children() {
        let (opt_c, c_changed) = optimize(store, c.clone_box());
        changed |= c_changed;
        children.push(opt_c);
    }

    // §4.2.1: "Optimization: reorder children by ascending stats.size at
    // build time" — cheapest-to-drive child becomes the primary.
    let sizes_before: Vec<i64> = children.iter().map(|c| c.stats().size).collect();
    children.sort_by_key(|c| c.stats().size);
    if children.iter().map(|c| c.stats().size).collect::<Vec<_>>() != sizes_before {
        changed = true;
        tracing::debug!("optimizer: reordered And children ascending by size");
    }

    if children.iter().any(|c| c.kind() == IteratorType::QuadIterator) {
        // §4.4 rule 2's indexed-join pushdown has nothing further to do on
        // this backend: MemoryStore exposes only single-direction indices,
        // so a sibling LinksTo already runs as cheaply as the generic And
        // can make it. See DESIGN.md.
        tracing::debug!(
            "optimizer: And already has a backend QuadIterator primary; \
             no compound index to push a sibling LinksTo into on this backend"
        );
    }

    let mut rebuilt: Box<dyn QueryIterator> = Box::new(And::new(children));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_or(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(or) = it.as_any().downcast_ref::<Or>() else {
        return (it.clone_box(), false);
    };
    let mut changed = false;
    let mut children = Vec::with_capacity(or.children().len());
    for c in or.children() {
        let (opt_c, c_changed) = optimize(store, c.clone_box());
        changed |= c_changed;
        children.push(opt_c);
    }
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Or::new(children));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_not(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(not) = it.as_any().downcast_ref::<Not>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, sub_changed) = optimize(store, not.sub().clone_box());
    let (opt_universe, universe_changed) = optimize(store, not.universe().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Not::new(opt_sub, opt_universe));
    copy_tags(it, &mut rebuilt);
    (rebuilt, sub_changed || universe_changed)
}

fn optimize_hasa(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(hasa) = it.as_any().downcast_ref::<HasA>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, changed) = optimize(store, hasa.sub().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> =
        Box::new(HasA::new(opt_sub, hasa.direction(), Arc::clone(hasa.store())));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_optional(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(opt) = it.as_any().downcast_ref::<Optional>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, changed) = optimize(store, opt.sub().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Optional::new(opt_sub));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_unique(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(u) = it.as_any().downcast_ref::<Unique>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, changed) = optimize(store, u.sub().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Unique::new(opt_sub));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_comparison(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(cmp) = it.as_any().downcast_ref::<Comparison>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, changed) = optimize(store, cmp.sub().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Comparison::new(
        opt_sub,
        cmp.op(),
        cmp.value().clone(),
        cmp.resolver().clone(),
    ));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_regex(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(re) = it.as_any().downcast_ref::<Regex>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, changed) = optimize(store, re.sub().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Regex::new(
        opt_sub,
        re.pattern().to_owned(),
        re.allow_refs(),
        re.resolver().clone(),
    ));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_skip(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(skip) = it.as_any().downcast_ref::<Skip>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, changed) = optimize(store, skip.sub().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Skip::new(opt_sub, skip.n()));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_limit(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(limit) = it.as_any().downcast_ref::<Limit>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, changed) = optimize(store, limit.sub().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Limit::new(opt_sub, limit.n()));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

fn optimize_count(store: &Arc<dyn QuadStore>, it: &dyn QueryIterator) -> (Box<dyn QueryIterator>, bool) {
    let Some(count) = it.as_any().downcast_ref::<Count>() else {
        return (it.clone_box(), false);
    };
    let (opt_sub, changed) = optimize(store, count.sub().clone_box());
    let mut rebuilt: Box<dyn QueryIterator> = Box::new(Count::new(opt_sub));
    copy_tags(it, &mut rebuilt);
    (rebuilt, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::linksto::LinksTo;
    use crate::store::memory::MemoryStore;
    use graphforge_model::{Direction, Quad, Value};

    fn store_with(quad: Quad) -> Arc<dyn QuadStore> {
        let store = MemoryStore::default();
        store
            .apply_deltas(
                vec![crate::store::Delta::add(quad)],
                crate::store::IgnoreOpts::default(),
            )
            .unwrap();
        Arc::new(store)
    }

    #[test]
    fn links_to_over_singleton_fixed_becomes_quad_iterator() {
        let q = Quad::triple(Value::iri("a"), Value::iri("follows"), Value::iri("b"));
        let store = store_with(q.clone());
        let mut fixed = Fixed::new();
        fixed.add(Handle::Node(store.value_of(&q.subject)));
        let tree: Box<dyn QueryIterator> = Box::new(LinksTo::new(Box::new(fixed), Direction::Subject, Arc::clone(&store)));
        let (rewritten, changed) = optimize(&store, tree);
        assert!(changed);
        assert_eq!(rewritten.kind(), IteratorType::QuadIterator);
    }

    #[test]
    fn links_to_over_larger_fixed_is_left_as_is() {
        let q = Quad::triple(Value::iri("a"), Value::iri("follows"), Value::iri("b"));
        let store = store_with(q.clone());
        let mut fixed = Fixed::new();
        fixed.add(Handle::Node(store.value_of(&q.subject)));
        fixed.add(Handle::Node(store.value_of(&q.object)));
        let tree: Box<dyn QueryIterator> = Box::new(LinksTo::new(Box::new(fixed), Direction::Subject, Arc::clone(&store)));
        let (rewritten, changed) = optimize(&store, tree);
        assert!(!changed);
        assert_eq!(rewritten.kind(), IteratorType::LinksTo);
    }

    #[test]
    fn and_children_are_reordered_ascending_by_size() {
        let mut small = Fixed::new();
        small.add(Handle::Node(graphforge_model::NodeHash::empty()));
        let mut large = Fixed::new();
        for i in 0..5u8 {
            let mut bytes = [0u8; graphforge_model::HASH_WIDTH];
            bytes[0] = i + 1;
            large.add(Handle::Node(graphforge_model::NodeHash::from_be_bytes(bytes)));
        }
        let store: Arc<dyn QuadStore> = Arc::new(MemoryStore::default());
        let tree: Box<dyn QueryIterator> = Box::new(And::new(vec![Box::new(large), Box::new(small)]));
        let (rewritten, changed) = optimize(&store, tree);
        assert!(changed);
        let and = rewritten.as_any().downcast_ref::<And>().unwrap();
        assert_eq!(and.children()[0].stats().size, 1);
    }
}

//! Morphisms: the reversible, iterator-to-iterator transformations a
//! [`Path`](crate::path::Path) accumulates (§4.3, §9).
//!
//! §9 prescribes the shape directly for languages without first-class
//! closures: "model each morphism as a sum-type variant whose variant data
//! is the morphism parameters, and implement `apply`/`reverse` as methods
//! on that enum." That's exactly what this module does.

use crate::iterator::and::And;
use crate::iterator::comparison::{Comparison, ComparisonOp, Resolver};
use crate::iterator::fixed::Fixed;
use crate::iterator::hasa::HasA;
use crate::iterator::linksto::LinksTo;
use crate::iterator::not::Not;
use crate::iterator::optional::Optional;
use crate::iterator::or::Or;
use crate::iterator::regex::Regex;
use crate::iterator::skip_limit::{Count, Limit, Skip};
use crate::iterator::unique::Unique;
use crate::iterator::{Handle, QueryIterator};
use crate::path::{Path, PathContext};
use crate::store::QuadStore;
use graphforge_model::{Direction, NodeHash, Value};
use std::sync::Arc;

/// A predicate (or label) selector: "`None` (any predicate), a single
/// value, a list, or a sub-path (first materialized, used as predicate
/// set)" (§4.3).
#[derive(Debug, Clone)]
pub enum Via {
    Any,
    Value(Value),
    Values(Vec<Value>),
    Path(Box<Path>),
}

impl Via {
    #[must_use]
    pub fn single(value: Value) -> Self {
        Self::Value(value)
    }
}

/// One entry of the `filters(wildcards…)` sugar (§4.3's DSL table): each
/// entry desugars to the same `Filter`/`Regex` morphism the single-shot
/// `filter`/`regex` builder methods push, chained in order.
#[derive(Debug, Clone)]
pub enum FilterSpec {
    Compare(ComparisonOp, Value),
    Regex(String),
    RegexWithRefs(String),
}

/// One accumulated transformation on a [`Path`]'s morphism stack (§4.3).
///
/// `Out(p) ⇌ In(p)`, `Has ⇌ HasReverse`, `Follow ⇌ Follow(p.reverse())`;
/// `And`/`Or`/`Except`/`Save`/`Tag`/`Skip`/`Limit`/`Count`/`Unique` are
/// self-inverse; `LabelContext` is self-inverse but mutates the reversed
/// context (§4.3).
#[derive(Debug, Clone)]
pub enum Morphism {
    Out { via: Via, tags: Vec<String> },
    In { via: Via, tags: Vec<String> },
    Both { via: Via, tags: Vec<String> },
    Has { via: Via, values: Vec<Value> },
    HasReverse { via: Via, values: Vec<Value> },
    Is(Vec<Value>),
    Tag(Vec<String>),
    Save { via: Via, tag: String, reverse: bool, optional: bool },
    And(Box<Path>),
    Or(Box<Path>),
    Except(Box<Path>),
    Unique,
    Skip(u64),
    Limit(u64),
    Count,
    LabelContext { via: Via, tags: Vec<String> },
    Filter { op: ComparisonOp, value: Value },
    Regex { pattern: String, allow_refs: bool },
    FollowRecursive { via: Via, max_depth: u64, tags: Vec<String> },
    Follow(Box<Path>),
    FollowReverse(Box<Path>),
    Labels { tags: Vec<String> },
    /// `back(tag)` (§4.3): `reversed_suffix` is the reverse walk from the
    /// current set back toward the tag point; `tag_point` rebuilds, fresh
    /// from the seed, the iterator that was current when the tag was
    /// recorded. `apply` intersects the two.
    Back { tag_point: Box<Path>, reversed_suffix: Vec<Morphism> },
}

fn fixed_from_values(store: &Arc<dyn QuadStore>, values: &[Value]) -> Fixed {
    let mut fixed = Fixed::new();
    for v in values {
        fixed.add(Handle::Node(store.value_of(v)));
    }
    fixed
}

fn via_to_iterator(store: &Arc<dyn QuadStore>, via: &Via) -> Option<Box<dyn QueryIterator>> {
    match via {
        Via::Any => None,
        Via::Value(v) => {
            let mut fixed = Fixed::new();
            fixed.add(Handle::Node(store.value_of(v)));
            Some(Box::new(fixed))
        }
        Via::Values(vs) => Some(Box::new(fixed_from_values(store, vs))),
        Via::Path(p) => Some(p.build_iterator_on()),
    }
}

fn and_or_single(children: Vec<Box<dyn QueryIterator>>) -> Box<dyn QueryIterator> {
    let mut children = children;
    if children.len() == 1 {
        children.pop().unwrap()
    } else {
        Box::new(And::new(children))
    }
}

fn resolver(store: &Arc<dyn QuadStore>) -> Resolver {
    let store = Arc::clone(store);
    Arc::new(move |hash: NodeHash| store.name_of(hash))
}

/// The directional traversal shared by `out`/`in`/`both` and by `save`'s
/// target projection: `HasA(And(LinksTo(anchor, from), LinksTo(pred, Predicate)[, LinksTo(label, Label)]), to)`
/// — the canonical triple-pattern shape from §4.2.2.
fn traverse(
    store: &Arc<dyn QuadStore>,
    anchor: Box<dyn QueryIterator>,
    from: Direction,
    to: Direction,
    via: &Via,
    ctx: &PathContext,
) -> Box<dyn QueryIterator> {
    let mut children = vec![Box::new(LinksTo::new(anchor, from, Arc::clone(store))) as Box<dyn QueryIterator>];
    if let Some(pred_iter) = via_to_iterator(store, via) {
        children.push(Box::new(LinksTo::new(pred_iter, Direction::Predicate, Arc::clone(store))));
    }
    if let Some(labels) = &ctx.label_restriction {
        let label_fixed = fixed_from_values(store, labels);
        children.push(Box::new(LinksTo::new(Box::new(label_fixed), Direction::Label, Arc::clone(store))));
    }
    let quads = and_or_single(children);
    Box::new(HasA::new(quads, to, Arc::clone(store)))
}

impl Morphism {
    #[must_use]
    pub fn reverse(&self) -> Self {
        match self {
            Self::Out { via, tags } => Self::In {
                via: via.clone(),
                tags: tags.clone(),
            },
            Self::In { via, tags } => Self::Out {
                via: via.clone(),
                tags: tags.clone(),
            },
            Self::Both { .. } => self.clone(),
            Self::Has { via, values } => Self::HasReverse {
                via: via.clone(),
                values: values.clone(),
            },
            Self::HasReverse { via, values } => Self::Has {
                via: via.clone(),
                values: values.clone(),
            },
            Self::Save { via, tag, reverse, optional } => Self::Save {
                via: via.clone(),
                tag: tag.clone(),
                reverse: !reverse,
                optional: *optional,
            },
            Self::Follow(p) => Self::FollowReverse(p.clone()),
            Self::FollowReverse(p) => Self::Follow(p.clone()),
            // Is/Tag/And/Or/Except/Unique/Skip/Limit/Count/LabelContext/
            // Filter/Regex/FollowRecursive/Back are self-inverse (§4.3).
            _ => self.clone(),
        }
    }

    /// Applies this morphism to `in_iter`, possibly mutating `ctx` (only
    /// `LabelContext` does).
    pub fn apply(
        &self,
        store: &Arc<dyn QuadStore>,
        in_iter: Box<dyn QueryIterator>,
        ctx: &mut PathContext,
    ) -> Box<dyn QueryIterator> {
        match self {
            Self::Out { via, tags } => {
                let mut out = traverse(store, in_iter, Direction::Subject, Direction::Object, via, ctx);
                for t in tags {
                    out.tagger_mut().add_tag(t.clone());
                }
                out
            }
            Self::In { via, tags } => {
                let mut out = traverse(store, in_iter, Direction::Object, Direction::Subject, via, ctx);
                for t in tags {
                    out.tagger_mut().add_tag(t.clone());
                }
                out
            }
            Self::Both { via, tags } => {
                let forward = traverse(store, in_iter.clone_box(), Direction::Subject, Direction::Object, via, ctx);
                let backward = traverse(store, in_iter, Direction::Object, Direction::Subject, via, ctx);
                let mut out: Box<dyn QueryIterator> = Box::new(Or::new(vec![forward, backward]));
                for t in tags {
                    out.tagger_mut().add_tag(t.clone());
                }
                out
            }
            Self::Has { via, values } => apply_has(store, in_iter, via, values, false, ctx),
            Self::HasReverse { via, values } => apply_has(store, in_iter, via, values, true, ctx),
            Self::Is(values) => {
                let fixed = fixed_from_values(store, values);
                Box::new(And::new(vec![in_iter, Box::new(fixed)]))
            }
            Self::Tag(names) => {
                let mut out = in_iter;
                for n in names {
                    out.tagger_mut().add_tag(n.clone());
                }
                out
            }
            Self::Save { via, tag, reverse, optional } => {
                apply_save(store, in_iter, via, tag, *reverse, *optional, ctx)
            }
            Self::And(p) => {
                let other = p.build_iterator_on();
                Box::new(And::new(vec![in_iter, other]))
            }
            Self::Or(p) => {
                let other = p.build_iterator_on();
                Box::new(Or::new(vec![in_iter, other]))
            }
            Self::Except(p) => {
                let other = p.build_iterator_on();
                Box::new(Not::new(other, in_iter))
            }
            Self::Unique => Box::new(Unique::new(in_iter)),
            Self::Skip(n) => Box::new(Skip::new(in_iter, *n)),
            Self::Limit(n) => Box::new(Limit::new(in_iter, *n)),
            Self::Count => Box::new(Count::new(in_iter)),
            Self::LabelContext { via, tags } => {
                if let Via::Values(values) = via {
                    ctx.label_restriction = Some(values.clone());
                } else if let Via::Value(value) = via {
                    ctx.label_restriction = Some(vec![value.clone()]);
                }
                let mut out = in_iter;
                for t in tags {
                    out.tagger_mut().add_tag(t.clone());
                }
                out
            }
            Self::Filter { op, value } => Box::new(Comparison::new(in_iter, *op, value.clone(), resolver(store))),
            Self::Regex { pattern, allow_refs } => {
                Box::new(Regex::new(in_iter, pattern.clone(), *allow_refs, resolver(store)))
            }
            Self::FollowRecursive { via, max_depth, tags } => {
                apply_follow_recursive(store, in_iter, via, *max_depth, tags, ctx)
            }
            Self::Follow(p) => p.apply_onto(store, in_iter, ctx),
            Self::FollowReverse(p) => p.apply_reversed_onto(store, in_iter, ctx),
            Self::Labels { tags } => {
                let mut out = traverse(store, in_iter, Direction::Subject, Direction::Label, &Via::Any, ctx);
                for t in tags {
                    out.tagger_mut().add_tag(t.clone());
                }
                out
            }
            Self::Back { tag_point, reversed_suffix } => {
                let mut rewound = in_iter;
                for m in reversed_suffix {
                    rewound = m.apply(store, rewound, ctx);
                }
                let anchor = tag_point.build_iterator_on();
                Box::new(And::new(vec![rewound, anchor]))
            }
        }
    }
}

fn apply_has(
    store: &Arc<dyn QuadStore>,
    in_iter: Box<dyn QueryIterator>,
    via: &Via,
    values: &[Value],
    reverse: bool,
    ctx: &PathContext,
) -> Box<dyn QueryIterator> {
    let (dir_check, dir_self) = if reverse {
        (Direction::Subject, Direction::Object)
    } else {
        (Direction::Object, Direction::Subject)
    };
    let mut children = Vec::new();
    if let Some(pred_iter) = via_to_iterator(store, via) {
        children.push(Box::new(LinksTo::new(pred_iter, Direction::Predicate, Arc::clone(store))) as Box<dyn QueryIterator>);
    }
    if !values.is_empty() {
        let fixed = fixed_from_values(store, values);
        children.push(Box::new(LinksTo::new(Box::new(fixed), dir_check, Arc::clone(store))));
    }
    if let Some(labels) = &ctx.label_restriction {
        let label_fixed = fixed_from_values(store, labels);
        children.push(Box::new(LinksTo::new(Box::new(label_fixed), Direction::Label, Arc::clone(store))));
    }
    if children.is_empty() {
        // `has(None)` with no values restricts to "any quad in this
        // direction at all" — every node in the store's Subject index.
        children.push(store.nodes_all_iterator());
        return Box::new(And::new(vec![in_iter, and_or_single(children)]));
    }
    let quads = and_or_single(children);
    let restricted = HasA::new(quads, dir_self, Arc::clone(store));
    Box::new(And::new(vec![in_iter, Box::new(restricted)]))
}

fn apply_save(
    store: &Arc<dyn QuadStore>,
    in_iter: Box<dyn QueryIterator>,
    via: &Via,
    tag: &str,
    reverse: bool,
    optional: bool,
    ctx: &PathContext,
) -> Box<dyn QueryIterator> {
    let anchor_dir = if reverse { Direction::Object } else { Direction::Subject };
    let target_dir = if reverse { Direction::Subject } else { Direction::Object };
    let anchor_copy = in_iter.clone_box();
    let mut quads_children =
        vec![Box::new(LinksTo::new(anchor_copy, anchor_dir, Arc::clone(store))) as Box<dyn QueryIterator>];
    if let Some(pred_iter) = via_to_iterator(store, via) {
        quads_children.push(Box::new(LinksTo::new(pred_iter, Direction::Predicate, Arc::clone(store))));
    }
    if let Some(labels) = &ctx.label_restriction {
        let label_fixed = fixed_from_values(store, labels);
        quads_children.push(Box::new(LinksTo::new(Box::new(label_fixed), Direction::Label, Arc::clone(store))));
    }
    let quads = and_or_single(quads_children);
    let mut target_projection = HasA::new(quads, target_dir, Arc::clone(store));
    target_projection.tagger_mut().add_tag(tag.to_owned());
    let branch: Box<dyn QueryIterator> = if optional {
        Box::new(Optional::new(Box::new(target_projection)))
    } else {
        Box::new(target_projection)
    };
    Box::new(And::new(vec![in_iter, branch]))
}

/// Fixed-point traversal (§4.3.2): `S₀` is the current set, repeatedly
/// `Step(X) = X.follow(via)`, `Sᵢ₊₁ = Step(Sᵢ) \ ⋃ⱼ≤ᵢ Sⱼ`, terminating at
/// an empty step or `max_depth` hops. Needs the full set materialized at
/// each round to compute the dedup difference, so unlike the rest of the
/// algebra this one can't stay lazy.
fn apply_follow_recursive(
    store: &Arc<dyn QuadStore>,
    in_iter: Box<dyn QueryIterator>,
    via: &Via,
    max_depth: u64,
    tags: &[String],
    ctx: &PathContext,
) -> Box<dyn QueryIterator> {
    let mut seen: std::collections::HashSet<NodeHash> = std::collections::HashSet::new();
    let mut frontier: Vec<NodeHash> = materialize_nodes(in_iter);
    for h in &frontier {
        seen.insert(*h);
    }
    let mut discovered: Vec<Handle> = Vec::new();
    let mut depth: u64 = 0;
    loop {
        if max_depth != 0 && depth >= max_depth {
            break;
        }
        if frontier.is_empty() {
            break;
        }
        let mut step_fixed = Fixed::new();
        for h in &frontier {
            step_fixed.add(Handle::Node(*h));
        }
        let stepped = traverse(store, Box::new(step_fixed), Direction::Subject, Direction::Object, via, ctx);
        let next_nodes = materialize_nodes(stepped);
        let mut next_frontier = Vec::new();
        for n in next_nodes {
            if seen.insert(n) {
                next_frontier.push(n);
                discovered.push(Handle::Node(n));
            }
        }
        if next_frontier.is_empty() {
            break;
        }
        frontier = next_frontier;
        depth += 1;
    }
    let mut result = Fixed::new();
    for h in discovered {
        result.add(h);
    }
    for t in tags {
        result.tagger_mut().add_tag(t.clone());
    }
    Box::new(result)
}

fn materialize_nodes(mut it: Box<dyn QueryIterator>) -> Vec<NodeHash> {
    let mut out = Vec::new();
    while it.next() {
        if let Some(Handle::Node(n)) = it.result() {
            out.push(n);
        }
    }
    out
}

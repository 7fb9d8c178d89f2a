//! The pull-based iterator algebra (§4.2): a family of composable iterators
//! driven by `next`/`contains`/`next_path`, plus the `QueryIterator` trait
//! every one of them implements.
//!
//! Modeled on the teacher's `EncodedQuad`/cursor pattern for "polymorphic
//! handle, concrete enum dispatch": instead of one interface object per
//! backend, each combinator here is its own struct implementing a single
//! object-safe trait, and the optimizer (§4.4) switches on [`IteratorType`]
//! the way the teacher's query plan switches on plan node kind.

pub mod all;
pub mod and;
pub mod comparison;
pub mod fixed;
pub mod hasa;
pub mod linksto;
pub mod not;
pub mod optional;
pub mod or;
pub mod quad_iter;
pub mod regex;
pub mod skip_limit;
pub mod unique;

use crate::error::IteratorError;
use crate::tagger::Tagger;
use graphforge_model::{NodeHash, QuadHash, Value};
use rustc_hash::FxHashMap;

/// The polymorphic value an iterator yields: a node, a quad, or — for the
/// terminal `Count` iterator — a literal value (§4.2.1: "Count is terminal
/// (one yield: a typed integer value)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Node(NodeHash),
    Quad(QuadHash),
}

/// A one-shot literal yield, kept separate from [`Handle`] because it never
/// participates in `contains`/set algebra — only `Count` produces it, and
/// only ever once.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralResult(pub Value);

/// The small enumeration the optimizer switches on (§4.2, §9: "use a tagged
/// variant for `Type` to keep optimizer switches cheap").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IteratorType {
    Fixed,
    All,
    And,
    Or,
    Not,
    HasA,
    LinksTo,
    Unique,
    Comparison,
    Optional,
    Skip,
    Limit,
    Count,
    Regex,
    QuadIterator,
}

/// Cost and cardinality estimate for an iterator (§4.2, §4.4's cost model).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub contains_cost: f64,
    pub next_cost: f64,
    pub size: i64,
    pub exact_size: bool,
}

impl Stats {
    #[must_use]
    pub const fn new(contains_cost: f64, next_cost: f64, size: i64, exact_size: bool) -> Self {
        Self {
            contains_cost,
            next_cost,
            size,
            exact_size,
        }
    }
}

/// A query iterator, per §4.2's protocol.
///
/// Object-safe by construction so query trees can be built as
/// `Box<dyn QueryIterator>`; `clone_box` stands in for `Clone` (not object
/// safe) and every composite iterator clones its sub-iterators recursively,
/// producing an independent tree that shares no cursor state (§9: "Cloning
/// produces an independent tree").
pub trait QueryIterator: std::fmt::Debug {
    /// Advance to the next result. Returns `false` at end-of-stream or once
    /// an error has latched; on `false` the caller may consult [`Self::err`].
    fn next(&mut self) -> bool;

    /// The current yield. Undefined before the first `next()` or after one
    /// returns `false`.
    fn result(&self) -> Option<Handle>;

    /// Membership test, independent of the `next()` cursor.
    fn contains(&mut self, handle: Handle) -> bool;

    /// Step to the next tag binding that produces the same `result()`.
    /// Returns `false` when no further path exists for the current result.
    fn next_path(&mut self) -> bool;

    /// Rewind to the pre-first-`next` state.
    fn reset(&mut self);

    /// Independent copy with a separate cursor.
    fn clone_box(&self) -> Box<dyn QueryIterator>;

    fn tagger(&self) -> &Tagger;

    fn tagger_mut(&mut self) -> &mut Tagger;

    /// Downcast hook for the optimizer (§4.4): trait objects can't be
    /// structurally matched, so rewrites that need a concrete sub-iterator's
    /// fields (e.g. `Fixed`'s single value) go through this rather than a
    /// new trait method per rewrite.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Appends this iterator's active tags (and its sub-iterators') to
    /// `out`, bound to the current `result()`.
    fn tag_results(&self, out: &mut FxHashMap<String, Handle>) {
        self.tagger().collect_into(self.result(), out);
        for sub in self.sub_iterators() {
            sub.tag_results(out);
        }
    }

    /// Structural children, for the optimizer to walk.
    fn sub_iterators(&self) -> Vec<&dyn QueryIterator>;

    fn stats(&self) -> Stats;

    fn size(&self) -> (i64, bool) {
        let stats = self.stats();
        (stats.size, stats.exact_size)
    }

    fn kind(&self) -> IteratorType;

    /// Release backend resources. Must be idempotent and recurse into
    /// children; safe to call more than once.
    fn close(&mut self) {}

    /// Latched error, if `next`/`contains` stopped early because of one.
    fn err(&self) -> Option<&IteratorError>;
}

/// Count is the one iterator whose terminal yield isn't a `Handle` — it
/// implements `QueryIterator` for uniformity in a query tree but exposes
/// its literal result through this extra accessor instead of overloading
/// `Handle`. The execution driver downcasts to this trait (via
/// [`QueryIterator::as_any`]) to surface that literal as a row.
pub trait TerminalLiteral {
    fn literal_result(&self) -> Option<Value>;
}

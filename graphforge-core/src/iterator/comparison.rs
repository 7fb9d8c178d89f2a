use crate::error::IteratorError;
use crate::iterator::{Handle, IteratorType, QueryIterator, Stats};
use crate::tagger::Tagger;
use graphforge_model::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Resolves a node handle back to its [`Value`], shared by [`Comparison`]
/// and [`Regex`](crate::iterator::regex::Regex) so neither needs a direct
/// dependency on the store trait — just the one lookup they need.
pub type Resolver = Arc<dyn Fn(graphforge_model::NodeHash) -> Option<Value> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// Filters `sub` by typed comparison against `value` (§4.2.1).
///
/// Numeric compares numeric, temporal compares temporal, strings/IRIs/
/// BNodes compare lexicographically within their own type family;
/// cross-family comparisons are always false, matching §4.2.1 exactly.
#[derive(Debug)]
pub struct Comparison {
    sub: Box<dyn QueryIterator>,
    op: ComparisonOp,
    value: Value,
    resolve: Resolver,
    tagger: Tagger,
}

impl Comparison {
    #[must_use]
    pub fn new(sub: Box<dyn QueryIterator>, op: ComparisonOp, value: Value, resolve: Resolver) -> Self {
        Self {
            sub,
            op,
            value,
            resolve,
            tagger: Tagger::new(),
        }
    }

    #[must_use]
    pub fn sub(&self) -> &dyn QueryIterator {
        self.sub.as_ref()
    }

    #[must_use]
    pub const fn op(&self) -> ComparisonOp {
        self.op
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolve
    }

    fn matches(&self, handle: Handle) -> bool {
        let Handle::Node(hash) = handle else {
            return false;
        };
        let Some(candidate) = (self.resolve)(hash) else {
            return false;
        };
        compare_same_family(&candidate, &self.value).is_some_and(|ord| self.op.holds(ord))
    }
}

/// `None` when the two values aren't in the same comparable family (§4.2.1:
/// "cross-family comparisons are always false").
fn compare_same_family(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Time(x), Value::Time(y)) => Some(x.as_millis().cmp(&y.as_millis())),
        (Value::Iri(_) | Value::BNode(_) | Value::String(_), _) => {
            match (a.lexical_form(), b.lexical_form()) {
                (Some(x), Some(y)) if std::mem::discriminant(a) == std::mem::discriminant(b) => {
                    Some(x.cmp(y))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

impl QueryIterator for Comparison {
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
            op: self.op,
            value: self.value.clone(),
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
        IteratorType::Comparison
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

    #[test]
    fn cross_family_comparison_is_false() {
        let iri = Value::iri("a");
        let int = Value::int(5);
        assert_eq!(compare_same_family(&iri, &int), None);
    }

    #[test]
    fn filters_by_numeric_threshold() {
        let values = vec![Value::int(1), Value::int(5), Value::int(9)];
        let resolve: Resolver = {
            let values = values.clone();
            Arc::new(move |hash: graphforge_model::NodeHash| {
                values.iter().find(|v| NodeHash::of(v) == hash).cloned()
            })
        };
        let mut sub = Fixed::new();
        for v in &values {
            sub.add(Handle::Node(NodeHash::of(v)));
        }
        let mut cmp = Comparison::new(Box::new(sub), ComparisonOp::Gt, Value::int(4), resolve);
        let mut seen = Vec::new();
        while cmp.next() {
            seen.push(cmp.result().unwrap());
        }
        assert_eq!(seen.len(), 2);
    }
}

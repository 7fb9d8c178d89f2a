use crate::value::Value;
use std::fmt;

/// A single statement in the graph: subject-predicate-object, optionally
/// scoped to a named graph (`label`), per spec.md §3.
///
/// `label: None` means the quad belongs to the default graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: Value,
    pub predicate: Value,
    pub object: Value,
    pub label: Option<Value>,
}

impl Quad {
    #[must_use]
    pub const fn new(subject: Value, predicate: Value, object: Value, label: Option<Value>) -> Self {
        Self {
            subject,
            predicate,
            object,
            label,
        }
    }

    #[must_use]
    pub const fn triple(subject: Value, predicate: Value, object: Value) -> Self {
        Self::new(subject, predicate, object, None)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} {} {} {}", self.subject, self.predicate, self.object, label),
            None => write!(f, "{} {} {}", self.subject, self.predicate, self.object),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_has_no_label() {
        let q = Quad::triple(Value::iri("a"), Value::iri("follows"), Value::iri("b"));
        assert!(q.label.is_none());
    }

    #[test]
    fn equality_is_structural() {
        let a = Quad::triple(Value::iri("a"), Value::iri("p"), Value::iri("b"));
        let b = Quad::triple(Value::iri("a"), Value::iri("p"), Value::iri("b"));
        assert_eq!(a, b);
    }
}

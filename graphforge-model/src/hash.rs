use crate::direction::Direction;
use crate::value::Value;
use siphasher::sip128::{Hasher128, SipHasher24};
use std::fmt;
use std::hash::Hasher;

/// Width, in bytes, of a single direction's hash segment.
///
/// The teacher's `StrHash` uses a 128-bit SipHash digest for the same
/// "opaque, fast, process-local handle" role this type plays; spec.md's
/// "SHA-1 sufficient for compatibility" note is about cross-process wire
/// compatibility, which this engine (no wire protocol, §1 OUT OF SCOPE)
/// never needs. See DESIGN.md for the full rationale.
pub const HASH_WIDTH: usize = 16;

/// Opaque handle for a single node (one endpoint of a quad).
///
/// Carries no data beyond the hash — resolving it back to a [`Value`]
/// requires a [`StrLookup`](crate::StrLookup)-style side table, exactly as
/// spec.md §3 describes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHash([u8; HASH_WIDTH]);

impl NodeHash {
    /// The canonical hash of a [`Value`], per spec.md §6.3: SipHash-128 over
    /// the value's canonical string serialization (§6.2).
    #[must_use]
    pub fn of(value: &Value) -> Self {
        let mut hasher = SipHasher24::new();
        hasher.write(value.canonical_encoding().as_bytes());
        Self(u128::from(hasher.finish128()).to_be_bytes())
    }

    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; HASH_WIDTH]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; HASH_WIDTH] {
        self.0
    }

    /// The handle used for an absent (label) direction segment.
    #[must_use]
    pub const fn empty() -> Self {
        Self([0; HASH_WIDTH])
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::empty()
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHash({})", self.to_hex())
    }
}

/// Handle identifying a quad: the concatenation of its four direction
/// hashes (spec.md §3), with the label segment omitted when the quad has
/// no label. `to_hex` produces that concatenated-hex form, which doubles
/// as the `quads.id` persisted identifier of §6.1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct QuadHash {
    subject: NodeHash,
    predicate: NodeHash,
    object: NodeHash,
    label: Option<NodeHash>,
}

impl QuadHash {
    #[must_use]
    pub const fn new(
        subject: NodeHash,
        predicate: NodeHash,
        object: NodeHash,
        label: Option<NodeHash>,
    ) -> Self {
        Self {
            subject,
            predicate,
            object,
            label,
        }
    }

    /// `QuadDirection(QuadHashOf(q), d) == NodeHashOf(q[d])` — spec.md §3's
    /// directional symmetry invariant.
    ///
    /// # Panics
    ///
    /// Panics if `dir` is [`Direction::Any`].
    #[must_use]
    pub fn get(&self, dir: Direction) -> NodeHash {
        match dir {
            Direction::Subject => self.subject,
            Direction::Predicate => self.predicate,
            Direction::Object => self.object,
            Direction::Label => self.label.unwrap_or_else(NodeHash::empty),
            Direction::Any => unreachable!("QuadHash::get called with Direction::Any"),
        }
    }

    #[must_use]
    pub fn has_label(&self) -> bool {
        self.label.is_some()
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(HASH_WIDTH * 2 * 4);
        out.push_str(&self.subject.to_hex());
        out.push_str(&self.predicate.to_hex());
        out.push_str(&self.object.to_hex());
        if let Some(label) = self.label {
            out.push_str(&label.to_hex());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn same_value_hashes_identically() {
        let a = Value::iri("http://example.com/a");
        let b = Value::iri("http://example.com/a");
        assert_eq!(NodeHash::of(&a), NodeHash::of(&b));
    }

    #[test]
    fn different_types_hash_differently() {
        let iri = Value::iri("1");
        let string = Value::string("1");
        assert_ne!(NodeHash::of(&iri), NodeHash::of(&string));
    }

    #[test]
    fn quad_hash_get_matches_construction() {
        let s = NodeHash::of(&Value::iri("s"));
        let p = NodeHash::of(&Value::iri("p"));
        let o = NodeHash::of(&Value::iri("o"));
        let qh = QuadHash::new(s, p, o, None);
        assert_eq!(qh.get(Direction::Subject), s);
        assert_eq!(qh.get(Direction::Predicate), p);
        assert_eq!(qh.get(Direction::Object), o);
        assert!(qh.get(Direction::Label).is_empty());
        assert!(!qh.has_label());
    }
}

use crate::small_str::CompactStr;
use oxilangtag::{LanguageTag, LanguageTagParseError};
use oxiri::{Iri, IriParseError};
use std::fmt;
use std::sync::Arc;

/// A point in time, stored with millisecond precision.
///
/// Matches the precision the teacher's own storage layer documents for
/// backends that can't represent full XSD `dateTime` precision: the §8
/// round-trip law (`name_of(value_of(v)) == v`) is relaxed to equality
/// after truncation to this resolution (see §9 "Time precision").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    millis_since_epoch: i64,
}

impl Instant {
    #[must_use]
    pub const fn from_millis(millis_since_epoch: i64) -> Self {
        Self {
            millis_since_epoch,
        }
    }

    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.millis_since_epoch
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.millis_since_epoch)
    }
}

/// A literal value addressable in the graph, per spec.md §3.
///
/// `Raw` is the compatibility escape hatch: it is equal to any value whose
/// canonical serialization (see [`Value::canonical_encoding`]) matches its
/// bytes exactly, letting a caller hand the store an already-encoded value
/// without knowing its logical type.
#[derive(Debug, Clone)]
pub enum Value {
    Iri(CompactStr),
    BNode(CompactStr),
    String(CompactStr),
    LangString { value: CompactStr, lang: CompactStr },
    TypedString { value: CompactStr, datatype: CompactStr },
    Int(i64),
    Float(f64),
    Bool(bool),
    Time(Instant),
    Raw(Arc<[u8]>),
}

impl Value {
    #[must_use]
    pub fn iri(s: impl Into<CompactStr>) -> Self {
        Self::Iri(s.into())
    }

    /// Builds and validates an IRI node, the way the teacher's `NamedNode::new`
    /// validates through `oxiri::Iri::parse` rather than trusting the caller.
    ///
    /// [`Value::iri`] stays the unchecked constructor for callers (tests,
    /// internal morphism plumbing) that already know the string is a valid
    /// IRI and don't want the parse cost.
    pub fn try_iri(s: impl Into<String>) -> Result<Self, IriParseError> {
        Ok(Self::Iri(Iri::parse(s.into())?.into_inner().into()))
    }

    #[must_use]
    pub fn bnode(s: impl Into<CompactStr>) -> Self {
        Self::BNode(s.into())
    }

    /// A blank node with a process-unique random identifier, the way the
    /// teacher's `BlankNode::default()` mints one via `rand::random` over a
    /// 128-bit id rather than asking the caller to supply one.
    #[must_use]
    pub fn fresh_bnode() -> Self {
        let id: u128 = rand::random();
        Self::BNode(CompactStr::new(&format!("{id:032x}")))
    }

    #[must_use]
    pub fn string(s: impl Into<CompactStr>) -> Self {
        Self::String(s.into())
    }

    #[must_use]
    pub fn lang_string(value: impl Into<CompactStr>, lang: impl Into<CompactStr>) -> Self {
        Self::LangString {
            value: value.into(),
            lang: lang.into(),
        }
    }

    /// Builds and validates a language-tagged string, mirroring the
    /// teacher's `Literal::new_language_tagged_literal` (lower-cases the
    /// tag, then validates via `oxilangtag::LanguageTag::parse`).
    pub fn try_lang_string(
        value: impl Into<CompactStr>,
        lang: impl Into<String>,
    ) -> Result<Self, LanguageTagParseError> {
        let mut lang = lang.into();
        lang.make_ascii_lowercase();
        let lang = LanguageTag::parse(lang)?.into_inner();
        Ok(Self::LangString {
            value: value.into(),
            lang: lang.into(),
        })
    }

    #[must_use]
    pub fn typed_string(value: impl Into<CompactStr>, datatype: impl Into<CompactStr>) -> Self {
        Self::TypedString {
            value: value.into(),
            datatype: datatype.into(),
        }
    }

    #[must_use]
    pub const fn int(v: i64) -> Self {
        Self::Int(v)
    }

    #[must_use]
    pub const fn float(v: f64) -> Self {
        Self::Float(v)
    }

    #[must_use]
    pub const fn bool(v: bool) -> Self {
        Self::Bool(v)
    }

    #[must_use]
    pub const fn time(v: Instant) -> Self {
        Self::Time(v)
    }

    #[must_use]
    pub fn raw(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Raw(bytes.into())
    }

    /// True for `Iri`/`BNode`, false otherwise. Used by `Regex(allow_refs)`
    /// (spec.md §4.2.1) to decide whether a value's lexical form is
    /// eligible for pattern matching.
    #[must_use]
    pub fn is_ref(&self) -> bool {
        matches!(self, Self::Iri(_) | Self::BNode(_))
    }

    /// The lexical form used for string-family comparisons and regex
    /// matching. Numeric/boolean/temporal values have no lexical form here.
    #[must_use]
    pub fn lexical_form(&self) -> Option<&str> {
        match self {
            Self::Iri(s) | Self::BNode(s) | Self::String(s) => Some(s.as_str()),
            Self::LangString { value, .. } | Self::TypedString { value, .. } => {
                Some(value.as_str())
            }
            Self::Int(_) | Self::Float(_) | Self::Bool(_) | Self::Time(_) | Self::Raw(_) => None,
        }
    }

    /// Canonical string serialization used both for [`NodeHash::of`](crate::NodeHash::of)
    /// and as the logical-equality key: two values with the same canonical
    /// encoding are the same node, per spec.md §3/§6.3.
    ///
    /// A one-byte type tag prevents cross-type collisions (e.g. the IRI
    /// `"1"` and the string literal `"1"` must hash differently); a unit
    /// separator (`\u{1}`) — which cannot appear in well-formed IRIs,
    /// language tags or datatype IRIs — splits multi-part encodings.
    #[must_use]
    pub fn canonical_encoding(&self) -> String {
        const SEP: char = '\u{1}';
        match self {
            Self::Iri(s) => format!("I{s}"),
            Self::BNode(s) => format!("B{s}"),
            Self::String(s) => format!("S{s}"),
            Self::LangString { value, lang } => {
                format!("L{lang}{SEP}{value}")
            }
            Self::TypedString { value, datatype } => {
                format!("T{datatype}{SEP}{value}")
            }
            Self::Int(v) => format!("N{v}"),
            Self::Float(v) => format!("F{:016x}", v.to_bits()),
            Self::Bool(v) => format!("O{v}"),
            Self::Time(v) => format!("D{}", v.as_millis()),
            Self::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_encoding() == other.canonical_encoding()
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical_encoding().hash(state);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(s) => write!(f, "<{s}>"),
            Self::BNode(s) => write!(f, "_:{s}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::LangString { value, lang } => write!(f, "{value:?}@{lang}"),
            Self::TypedString { value, datatype } => write!(f, "{value:?}^^<{datatype}>"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Time(v) => write!(f, "{v}"),
            Self::Raw(bytes) => write!(f, "Raw({} bytes)", bytes.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri_and_string_with_same_text_are_distinct() {
        assert_ne!(Value::iri("1"), Value::string("1"));
    }

    #[test]
    fn raw_matches_matching_canonical_encoding() {
        let iri = Value::iri("http://x");
        let raw = Value::raw(iri.canonical_encoding().into_bytes());
        assert_eq!(iri, raw);
    }

    #[test]
    fn try_iri_rejects_malformed_input() {
        assert!(Value::try_iri("not a valid iri").is_err());
        assert_eq!(Value::try_iri("http://example.com/a").unwrap(), Value::iri("http://example.com/a"));
    }

    #[test]
    fn fresh_bnode_ids_do_not_collide() {
        assert_ne!(Value::fresh_bnode(), Value::fresh_bnode());
    }

    #[test]
    fn try_lang_string_lowercases_and_validates_the_tag() {
        let v = Value::try_lang_string("hello", "EN-us").unwrap();
        assert_eq!(v, Value::lang_string("hello", "en-us"));
        assert!(Value::try_lang_string("hello", "not a tag").is_err());
    }

    #[test]
    fn float_nan_is_reflexively_equal_via_bit_pattern() {
        let nan1 = Value::float(f64::NAN);
        let nan2 = Value::float(f64::NAN);
        assert_eq!(nan1, nan2);
    }

    #[test]
    fn lang_string_distinguishes_by_language() {
        let en = Value::lang_string("hello", "en");
        let fr = Value::lang_string("hello", "fr");
        assert_ne!(en, fr);
    }
}

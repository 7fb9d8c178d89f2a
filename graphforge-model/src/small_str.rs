//! Inline storage for short strings, avoiding a heap allocation for the
//! common case of short IRIs, blank node ids and literal values.
//!
//! Ported from the storage layer's `SmallString` trick: a fixed byte array
//! with the length tucked into the last byte, falling back to `Arc<str>`
//! once the value no longer fits.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

const INLINE_CAPACITY: usize = 22;

#[derive(Clone)]
pub enum CompactStr {
    Inline { bytes: [u8; INLINE_CAPACITY], len: u8 },
    Heap(Arc<str>),
}

impl CompactStr {
    #[must_use]
    pub fn new(value: &str) -> Self {
        if value.len() <= INLINE_CAPACITY {
            let mut bytes = [0; INLINE_CAPACITY];
            bytes[..value.len()].copy_from_slice(value.as_bytes());
            Self::Inline {
                bytes,
                #[allow(clippy::cast_possible_truncation)]
                len: value.len() as u8,
            }
        } else {
            Self::Heap(Arc::from(value))
        }
    }

    #[must_use]
    #[allow(unsafe_code)]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline { bytes, len } => {
                // SAFETY: constructed only from valid &str slices in `new`.
                unsafe { std::str::from_utf8_unchecked(&bytes[..*len as usize]) }
            }
            Self::Heap(s) => s,
        }
    }
}

impl PartialEq for CompactStr {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for CompactStr {}

impl Hash for CompactStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for CompactStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for CompactStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl From<&str> for CompactStr {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CompactStr {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inlines_short_values() {
        let s = CompactStr::new("http://a");
        assert!(matches!(s, CompactStr::Inline { .. }));
        assert_eq!(s.as_str(), "http://a");
    }

    #[test]
    fn heap_allocates_long_values() {
        let long = "x".repeat(100);
        let s = CompactStr::new(&long);
        assert!(matches!(s, CompactStr::Heap(_)));
        assert_eq!(s.as_str(), long);
    }

    #[test]
    fn equality_ignores_representation() {
        let short = CompactStr::new("abc");
        let long = CompactStr::new(&"a".repeat(100));
        assert_ne!(short, long);
        assert_eq!(CompactStr::new("abc"), CompactStr::new("abc"));
    }
}

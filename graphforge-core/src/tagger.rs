//! Per-iterator tag bookkeeping (§4.2, §9: "a small struct of
//! `{tags: list<string>, fixed: map<string, handle>}`; not an object
//! identity").

use crate::iterator::Handle;
use rustc_hash::FxHashMap;

/// The tags an iterator contributes to a result row when it yields.
///
/// `tags` are live bindings: whatever this iterator's current `result()` is
/// gets bound to each name in `tags` when the owning iterator's results are
/// collected. `fixed` holds bindings that don't vary with the current
/// yield — used by the optimizer when a `Fixed` of size one is rewritten
/// into a native `QuadIterator` (§4.4) and its tag must migrate as a
/// constant binding rather than a live one.
#[derive(Debug, Clone, Default)]
pub struct Tagger {
    tags: Vec<String>,
    fixed: FxHashMap<String, Handle>,
}

impl Tagger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tag(&mut self, name: impl Into<String>) {
        self.tags.push(name.into());
    }

    pub fn add_fixed(&mut self, name: impl Into<String>, handle: Handle) {
        self.fixed.insert(name.into(), handle);
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn fixed(&self) -> &FxHashMap<String, Handle> {
        &self.fixed
    }

    /// Binds this tagger's live tags to `current` and merges both live and
    /// fixed bindings into `out`, per §4.2's `tag_results`.
    pub fn collect_into(&self, current: Option<Handle>, out: &mut FxHashMap<String, Handle>) {
        if let Some(handle) = current {
            for tag in &self.tags {
                out.insert(tag.clone(), handle);
            }
        }
        for (name, handle) in &self.fixed {
            out.insert(name.clone(), *handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphforge_model::NodeHash;

    #[test]
    fn live_tag_binds_current_result() {
        let mut tagger = Tagger::new();
        tagger.add_tag("who");
        let handle = Handle::Node(NodeHash::empty());
        let mut out = FxHashMap::default();
        tagger.collect_into(Some(handle), &mut out);
        assert_eq!(out.get("who"), Some(&handle));
    }

    #[test]
    fn fixed_tag_ignores_current_result() {
        let mut tagger = Tagger::new();
        let handle = Handle::Node(NodeHash::empty());
        tagger.add_fixed("const", handle);
        let mut out = FxHashMap::default();
        tagger.collect_into(None, &mut out);
        assert_eq!(out.get("const"), Some(&handle));
    }
}

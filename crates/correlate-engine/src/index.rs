// crates/correlate-engine/src/index.rs
// ============================================================================
// Module: Identity Index
// Description: Insertion-ordered mapping from identity key to identity.
// Purpose: Accumulate every record contributing to each identity within one
//          wing, preserving first-seen order for deterministic match
//          emission (spec.md §4.3, §5 Ordering guarantees).
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! The index is built single-threaded within one wing (spec.md §4.3);
//! cross-wing merging is the engine coordinator's job, not this module's.
//! Ordering matters: spec.md §5 requires matches to be appended in
//! identity-index iteration order, so the index is backed by a `HashMap`
//! plus an explicit insertion-order `Vec<IdentityKey>` rather than a plain
//! `HashMap` (whose iteration order is unspecified) — the workspace carries
//! no ordered-map dependency, so this is built from what's already in
//! scope rather than reaching for `indexmap`.

use std::collections::HashMap;

use correlate_core::Identity;
use correlate_core::IdentityKey;
use correlate_core::Record;

/// The normalized fields one extraction pass resolves for a record
/// (spec.md §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityExtraction {
    /// The full, unnormalized name the record was observed under.
    pub full_name: String,
    /// Normalized base name with any version/date/number suffix stripped.
    pub base_name: String,
    /// The suffix stripped from `full_name`, empty if nothing was stripped.
    pub suffix: String,
    /// Normalized path.
    pub path: String,
    /// Normalized hash.
    pub hash: String,
}

impl IdentityExtraction {
    /// Builds the canonical identity key for this extraction
    /// (spec.md §4.1: `lowercase(base_name) | lowercase(path) |
    /// lowercase(hash)`).
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::from_components(
            &self.base_name.to_ascii_lowercase(),
            &self.path.to_ascii_lowercase(),
            &self.hash.to_ascii_lowercase(),
        )
    }
}

/// An insertion-ordered `identity_key -> Identity` mapping (spec.md §4.3).
#[derive(Debug, Default)]
pub struct IdentityIndex {
    /// Identities keyed by their canonical identity key.
    entries: HashMap<IdentityKey, Identity>,
    /// Insertion order of keys, for deterministic iteration.
    order: Vec<IdentityKey>,
}

impl IdentityIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` under the identity implied by `extraction`,
    /// creating the identity on first sight of its key. Stamps the
    /// record with the name/path `extraction` actually resolved, so later
    /// stages (the match builder's per-feather dedup) hash the resolved
    /// identity rather than guess at literal column names (spec.md §4.5
    /// step 2).
    pub fn insert(&mut self, extraction: &IdentityExtraction, mut record: Record) {
        record.resolved_name = extraction.full_name.clone();
        record.resolved_path = extraction.path.clone();

        let key = extraction.identity_key();
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        let identity = self.entries.entry(key.clone()).or_insert_with(|| {
            Identity::new(key, extraction.base_name.clone(), extraction.path.clone(), extraction.hash.clone())
        });
        identity.push_record(record, &extraction.full_name, &extraction.suffix);
    }

    /// Number of distinct identities accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// `true` if no identities have been accumulated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates identities in first-seen (insertion) order, consuming the
    /// index (spec.md §4.3: the index is released after match
    /// construction).
    pub fn into_ordered_identities(self) -> impl Iterator<Item = Identity> {
        let Self { mut entries, order } = self;
        order.into_iter().filter_map(move |key| entries.remove(&key))
    }
}

#[cfg(test)]
mod tests {
    use correlate_core::FeatherId;
    use correlate_core::Record;

    use super::IdentityExtraction;
    use super::IdentityIndex;

    fn extraction(base_name: &str) -> IdentityExtraction {
        IdentityExtraction {
            full_name: base_name.to_string(),
            base_name: base_name.to_string(),
            suffix: String::new(),
            path: "c:\\windows\\foo.exe".to_string(),
            hash: String::new(),
        }
    }

    #[test]
    fn identities_are_yielded_in_first_seen_order() {
        let mut index = IdentityIndex::new();
        index.insert(&extraction("beta"), Record::new(FeatherId::new("f1"), "t"));
        index.insert(&extraction("alpha"), Record::new(FeatherId::new("f1"), "t"));
        index.insert(&extraction("beta"), Record::new(FeatherId::new("f1"), "t"));

        assert_eq!(index.len(), 2);
        let names: Vec<_> = index.into_ordered_identities().map(|identity| identity.base_name).collect();
        assert_eq!(names, vec!["beta".to_string(), "alpha".to_string()]);
    }
}

// crates/correlate-engine/src/extractor.rs
// ============================================================================
// Module: Identity Extractor & Normalizer
// Description: Pulls (name, path, hash) tuples out of a record and
//              normalizes them into a canonical identity key.
// Purpose: Replace the source's substring-heuristic field lookup with a
//          declarative column-resolver object built once per feather
//          (spec.md §9 redesign note).
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! Extraction (spec.md §4.1) is two steps. First, [`ColumnResolver`] picks
//! which fields of a [`Record`] hold the name/path/hash: declared feather
//! metadata wins outright; otherwise the resolver falls back to scanning
//! field names against a fixed pattern list. Second, [`normalize_name`]
//! strips a trailing version/date/number suffix from the resolved name so
//! that `chrome.exe`, `chrome_1.exe`, and `chrome_2024-01-01.exe` collapse
//! to the same `base_name`.

use correlate_core::FeatherMetadataHints;
use correlate_core::Record;

use crate::index::IdentityExtraction;

/// Field-name substrings that identify an application/process name column,
/// tried in order when no feather metadata names one (spec.md §4.1).
const NAME_PATTERNS: &[&str] = &["name", "executable", "process", "filename", "image"];

/// Field-name substrings that identify a path column.
const PATH_PATTERNS: &[&str] = &["path", "location", "file"];

/// Field-name substrings that identify a hash column.
const HASH_PATTERNS: &[&str] = &["hash", "sha", "md5"];

/// Resolves which fields of a record hold name/path/hash, preferring
/// declared feather metadata over heuristic pattern scanning. Built once
/// per feather and reused across every row the loader hands it.
#[derive(Debug, Clone, Default)]
pub struct ColumnResolver {
    /// Declared application/process name column, if any.
    application_column: Option<String>,
    /// Declared file path column, if any.
    path_column: Option<String>,
    /// Declared hash column, if any.
    hash_column: Option<String>,
}

impl ColumnResolver {
    /// Builds a resolver from declared feather metadata hints.
    #[must_use]
    pub fn from_hints(hints: Option<&FeatherMetadataHints>) -> Self {
        match hints {
            Some(hints) => Self {
                application_column: hints.application_column.clone(),
                path_column: hints.path_column.clone(),
                hash_column: hints.hash_column.clone(),
            },
            None => Self::default(),
        }
    }

    /// Resolves `(name, path, hash)` for `record`, preferring declared
    /// columns and falling back to pattern scanning (spec.md §4.1).
    #[must_use]
    pub fn resolve(&self, record: &Record) -> (String, String, String) {
        let name = self
            .application_column
            .as_deref()
            .and_then(|column| record.field_str(column))
            .or_else(|| scan_field(record, NAME_PATTERNS))
            .unwrap_or_default();
        let path = self
            .path_column
            .as_deref()
            .and_then(|column| record.field_str(column))
            .or_else(|| scan_field(record, PATH_PATTERNS))
            .unwrap_or_default();
        let hash = self
            .hash_column
            .as_deref()
            .and_then(|column| record.field_str(column))
            .or_else(|| scan_field(record, HASH_PATTERNS))
            .unwrap_or_default();
        (name, path, hash)
    }
}

/// Scans a record's fields (in their stable sorted order) for the first
/// whose column name contains one of `patterns`, case-insensitively.
fn scan_field(record: &Record, patterns: &[&str]) -> Option<String> {
    record.fields.keys().find_map(|field_name| {
        let lower = field_name.to_ascii_lowercase();
        patterns.iter().any(|pattern| lower.contains(pattern)).then(|| record.field_str(field_name)).flatten()
    })
}

/// Extracts `(name, path, hash, id_type)` from a record using `resolver`,
/// then normalizes the name into `(base_name, suffix, identity_key)`
/// (spec.md §4.1).
///
/// An all-empty extraction (no name, path, or hash resolved) counts as
/// "filtered" for statistics but is never an error — extraction is
/// infallible by design (spec.md §4.1, Error semantics).
#[must_use]
pub fn extract(resolver: &ColumnResolver, record: &Record) -> Option<IdentityExtraction> {
    let (name, path, hash) = resolver.resolve(record);
    if name.is_empty() && path.is_empty() && hash.is_empty() {
        return None;
    }
    let (base_name, suffix) = normalize_name(&name);
    Some(IdentityExtraction {
        full_name: name,
        base_name,
        suffix,
        path,
        hash,
    })
}

/// Strips a trailing version-like suffix from `name`: numeric, dotted
/// numeric, date-shaped, or `_N`/`-N` (spec.md §4.1, Normalization policy).
/// Returns `(base_name, suffix)`; `suffix` is empty when nothing was
/// stripped.
#[must_use]
pub fn normalize_name(name: &str) -> (String, String) {
    let Some(dot) = name.rfind('.') else {
        return split_trailing_suffix(name);
    };
    let (stem, extension) = name.split_at(dot);
    let (base, suffix) = split_trailing_suffix(stem);
    if suffix.is_empty() {
        (name.to_string(), String::new())
    } else {
        (format!("{base}{extension}"), suffix)
    }
}

/// Finds the last separator (`_` or `-`) in `stem` such that everything
/// after it looks like a version/date/number tail, and splits there.
fn split_trailing_suffix(stem: &str) -> (String, String) {
    for (index, separator) in stem.char_indices().rev() {
        if separator != '_' && separator != '-' {
            continue;
        }
        let tail = &stem[index + 1..];
        if is_version_like_tail(tail) {
            return (stem[..index].to_string(), stem[index..].to_string());
        }
    }
    (stem.to_string(), String::new())
}

/// `true` if `tail` looks like a stripped version/date/number suffix: all
/// digits, dotted-numeric (`1.2.3`), or date-shaped (`2024-01-01`,
/// `20240101`).
fn is_version_like_tail(tail: &str) -> bool {
    if tail.is_empty() {
        return false;
    }
    let digits_and_dots = tail.chars().all(|ch| ch.is_ascii_digit() || ch == '.');
    digits_and_dots && tail.chars().any(|ch| ch.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use correlate_core::FeatherId;

    use super::ColumnResolver;
    use super::extract;
    use super::normalize_name;

    #[test]
    fn normalize_strips_numeric_suffix_before_extension() {
        let (base, suffix) = normalize_name("chrome_1.exe");
        assert_eq!(base, "chrome.exe");
        assert_eq!(suffix, "_1");
    }

    #[test]
    fn normalize_strips_date_shaped_suffix() {
        let (base, suffix) = normalize_name("backup-20240101.zip");
        assert_eq!(base, "backup.zip");
        assert_eq!(suffix, "-20240101");
    }

    #[test]
    fn normalize_leaves_plain_name_untouched() {
        let (base, suffix) = normalize_name("notepad.exe");
        assert_eq!(base, "notepad.exe");
        assert!(suffix.is_empty());
    }

    #[test]
    fn extraction_prefers_declared_column_over_pattern_scan() {
        let resolver = ColumnResolver {
            application_column: Some("ProcName".to_string()),
            path_column: None,
            hash_column: None,
        };
        let record = correlate_core::Record::new(FeatherId::new("f1"), "Prefetch")
            .with_field("ProcName", "powershell.exe")
            .with_field("ExecutableName", "wrong.exe");
        let extraction = extract(&resolver, &record).expect("non-empty extraction");
        assert_eq!(extraction.full_name, "powershell.exe");
    }

    #[test]
    fn all_empty_extraction_returns_none() {
        let resolver = ColumnResolver::default();
        let record = correlate_core::Record::new(FeatherId::new("f1"), "Prefetch");
        assert!(extract(&resolver, &record).is_none());
    }
}

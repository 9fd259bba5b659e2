// crates/correlate-engine/src/filters.rs
// ============================================================================
// Module: Pre-Filters
// Description: Time and identity pre-filters applied at record ingress.
// Purpose: Drop records outside a configured time window or that don't
//          match any configured identity glob, before they reach the
//          extractor (spec.md §4.9).
// Dependencies: correlate-core, glob
// ============================================================================

//! ## Overview
//! Both filters are opt-in: a [`TimeFilter`] with no bounds, or an
//! [`IdentityFilter`] with no patterns, accepts everything. Both operate on
//! raw string fields rather than a fully-extracted identity, since the
//! filter runs before the extractor in the loader's pipeline (spec.md §4.2).

use correlate_core::ConfigError;
use correlate_core::Record;
use glob::Pattern;

/// Rejects records outside `[start, end]`, either bound optional
/// (spec.md §4.9, Time filter).
#[derive(Debug, Clone, Default)]
pub struct TimeFilter {
    /// Inclusive lower bound, if configured.
    start: Option<correlate_core::RecordTimestamp>,
    /// Inclusive upper bound, if configured.
    end: Option<correlate_core::RecordTimestamp>,
}

impl TimeFilter {
    /// Builds a time filter from optional ISO-8601 bound strings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeBound`] if a configured bound
    /// fails to parse.
    pub fn new(start: Option<&str>, end: Option<&str>) -> Result<Self, ConfigError> {
        let start = start
            .map(|raw| {
                correlate_core::RecordTimestamp::parse(raw)
                    .ok_or_else(|| ConfigError::InvalidTimeBound(raw.to_string()))
            })
            .transpose()?;
        let end = end
            .map(|raw| {
                correlate_core::RecordTimestamp::parse(raw)
                    .ok_or_else(|| ConfigError::InvalidTimeBound(raw.to_string()))
            })
            .transpose()?;
        Ok(Self { start, end })
    }

    /// `true` if `record` should be kept: either it has no parseable
    /// timestamp (pre-filters only ever reject on a timestamp they can
    /// read), or the timestamp falls within the configured bounds.
    #[must_use]
    pub fn accepts(&self, record: &Record) -> bool {
        if self.start.is_none() && self.end.is_none() {
            return true;
        }
        let Some(timestamp) = record.timestamp else {
            return true;
        };
        if let Some(start) = self.start
            && timestamp < start
        {
            return false;
        }
        if let Some(end) = self.end
            && timestamp > end
        {
            return false;
        }
        true
    }
}

/// Rejects records whose name/path/hash match none of the configured glob
/// patterns (spec.md §4.9, Identity filter).
#[derive(Debug, Clone, Default)]
pub struct IdentityFilter {
    /// Compiled glob patterns.
    patterns: Vec<Pattern>,
    /// Whether matching is case-sensitive.
    case_sensitive: bool,
}

impl IdentityFilter {
    /// Compiles `patterns` into an identity filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFilterPattern`] if any pattern fails
    /// to compile as a glob.
    pub fn new(patterns: &[String], case_sensitive: bool) -> Result<Self, ConfigError> {
        let compiled = patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|err| ConfigError::InvalidFilterPattern {
                    pattern: pattern.clone(),
                    message: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns: compiled, case_sensitive })
    }

    /// `true` if no patterns are configured, or at least one of
    /// `name`/`path`/`hash` matches at least one pattern.
    #[must_use]
    pub fn accepts(&self, name: &str, path: &str, hash: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        [name, path, hash].iter().any(|candidate| self.matches_any(candidate))
    }

    /// Checks `candidate` against every compiled pattern.
    fn matches_any(&self, candidate: &str) -> bool {
        let candidate = if self.case_sensitive { candidate.to_string() } else { candidate.to_ascii_lowercase() };
        self.patterns.iter().any(|pattern| {
            if self.case_sensitive {
                pattern.matches(&candidate)
            } else {
                pattern.matches(&candidate.to_ascii_lowercase())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use correlate_core::FeatherId;
    use correlate_core::Record;
    use correlate_core::RecordTimestamp;

    use super::IdentityFilter;
    use super::TimeFilter;

    #[test]
    fn time_filter_with_no_bounds_accepts_everything() {
        let filter = TimeFilter::new(None, None).expect("build filter");
        let record = Record::new(FeatherId::new("f1"), "t");
        assert!(filter.accepts(&record));
    }

    #[test]
    fn time_filter_rejects_record_before_start() {
        let filter = TimeFilter::new(Some("2024-02-01"), None).expect("build filter");
        let record = Record::new(FeatherId::new("f1"), "t")
            .with_timestamp(RecordTimestamp::parse("2024-01-15").expect("parseable"));
        assert!(!filter.accepts(&record));
    }

    #[test]
    fn time_filter_accepts_record_after_start() {
        let filter = TimeFilter::new(Some("2024-02-01"), None).expect("build filter");
        let record = Record::new(FeatherId::new("f1"), "t")
            .with_timestamp(RecordTimestamp::parse("2024-02-15").expect("parseable"));
        assert!(filter.accepts(&record));
    }

    #[test]
    fn identity_filter_matches_case_insensitively_by_default() {
        let filter = IdentityFilter::new(&["*.exe".to_string()], false).expect("build filter");
        assert!(filter.accepts("POWERSHELL.EXE", "", ""));
    }

    #[test]
    fn identity_filter_rejects_when_nothing_matches() {
        let filter = IdentityFilter::new(&["*.dll".to_string()], false).expect("build filter");
        assert!(!filter.accepts("powershell.exe", "c:\\windows\\powershell.exe", ""));
    }
}

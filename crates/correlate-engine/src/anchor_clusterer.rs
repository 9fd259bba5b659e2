// crates/correlate-engine/src/anchor_clusterer.rs
// ============================================================================
// Module: Temporal Anchor Clusterer
// Description: Splits one identity's records into time-adjacent anchors.
// Purpose: Implement spec.md §4.4's clustering policy exactly, including
//          the dedicated no-timestamp anchor and equal-timestamp
//          tie-breaking.
// Dependencies: correlate-core
// ============================================================================

//! ## Overview
//! Records without a parseable timestamp never join a timestamped anchor;
//! they are collected into one synthetic anchor per identity, stamped with
//! the caller-supplied `now` (spec.md §4.4 step 4) so the clusterer never
//! reads a wall clock itself.

use correlate_core::Anchor;
use correlate_core::Identity;
use correlate_core::RecordTimestamp;

/// Default clustering window, in minutes (spec.md §4.4).
pub const DEFAULT_WINDOW_MINUTES: i64 = 180;

/// Splits `identity`'s records into time-adjacent anchors (spec.md §4.4).
///
/// `now` stamps the synthetic no-timestamp anchor; it is never read from a
/// wall clock inside this function (spec.md §9, "global state" redesign
/// note — time is an explicit input everywhere in this engine).
#[must_use]
pub fn cluster(identity: &Identity, window_minutes: i64, now: RecordTimestamp) -> Vec<Anchor> {
    let mut timestamped: Vec<_> =
        identity.records.iter().filter(|record| record.timestamp.is_some()).cloned().collect();
    let untimestamped: Vec<_> =
        identity.records.iter().filter(|record| record.timestamp.is_none()).cloned().collect();

    timestamped.sort_by_key(|record| record.timestamp);

    let mut anchors = Vec::new();
    let mut open: Option<Anchor> = None;
    for record in timestamped {
        let Some(timestamp) = record.timestamp else {
            continue;
        };
        match open.as_mut() {
            Some(anchor) if timestamp.abs_diff_minutes(anchor.anchor_end) <= window_minutes => {
                anchor.extend(timestamp, record);
            }
            Some(anchor) => {
                anchors.push(anchor.clone());
                open = Some(Anchor::singleton(timestamp, record));
            }
            None => {
                open = Some(Anchor::singleton(timestamp, record));
            }
        }
    }
    if let Some(anchor) = open {
        anchors.push(anchor);
    }

    if !untimestamped.is_empty() {
        let mut anchor = Anchor::singleton(now, untimestamped[0].clone());
        for record in untimestamped.into_iter().skip(1) {
            anchor.extend(now, record);
        }
        anchors.push(anchor);
    }

    anchors
}

#[cfg(test)]
mod tests {
    use correlate_core::FeatherId;
    use correlate_core::Identity;
    use correlate_core::IdentityKey;
    use correlate_core::Record;
    use correlate_core::RecordTimestamp;

    use super::cluster;

    fn identity_with(timestamps: &[&str]) -> Identity {
        let key = IdentityKey::from_components("notepad", "", "");
        let mut identity = Identity::new(key, "notepad".to_string(), String::new(), String::new());
        for raw in timestamps {
            let record = Record::new(FeatherId::new("f1"), "t")
                .with_timestamp(RecordTimestamp::parse(raw).expect("parseable"));
            identity.push_record(record, "notepad", "");
        }
        identity
    }

    #[test]
    fn records_within_window_form_one_anchor() {
        let identity = identity_with(&["2024-01-01T10:00:00", "2024-01-01T10:02:00"]);
        let now = RecordTimestamp::parse("2024-01-01T00:00:00").expect("parseable");
        let anchors = cluster(&identity, 180, now);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].records.len(), 2);
    }

    #[test]
    fn records_outside_window_split_into_two_anchors() {
        let identity =
            identity_with(&["2024-01-01T10:00:00", "2024-01-01T10:30:00", "2024-01-01T16:00:00"]);
        let now = RecordTimestamp::parse("2024-01-01T00:00:00").expect("parseable");
        let anchors = cluster(&identity, 180, now);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].records.len(), 2);
        assert_eq!(anchors[1].records.len(), 1);
    }

    #[test]
    fn untimestamped_records_form_their_own_anchor_stamped_with_now() {
        let key = IdentityKey::from_components("notepad", "", "");
        let mut identity = Identity::new(key, "notepad".to_string(), String::new(), String::new());
        identity.push_record(Record::new(FeatherId::new("f1"), "t"), "notepad", "");
        let now = RecordTimestamp::parse("2024-06-01T00:00:00").expect("parseable");
        let anchors = cluster(&identity, 180, now);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].anchor_start, now);
        assert_eq!(anchors[0].anchor_end, now);
    }
}

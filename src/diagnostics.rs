use std::path::PathBuf;

use serde::Serialize;

/// Households in England and Wales, Census 21 March 2021.
pub const HOUSEHOLDS_ENGLAND_WALES_2021: u64 = 24_782_800;

/// A per-record problem that was recovered from locally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIssue {
    /// Row could not be turned into a record at all.
    UnreadableRow {
        source: PathBuf,
        line: u64,
        reason: String,
    },
    /// Same file content supplied twice for one ledger.
    DuplicateSource { source: PathBuf, first: PathBuf },
    /// Required address field missing, so the record has no identity key.
    MalformedRecord {
        transaction_id: String,
        year: i32,
        missing: Vec<&'static str>,
    },
    /// Later sale price of zero; percent change is undefined.
    ZeroLatePrice {
        identity_key: String,
        price_early: u64,
    },
}

impl DataIssue {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UnreadableRow { .. } => "Unreadable rows",
            Self::DuplicateSource { .. } => "Duplicate source files",
            Self::MalformedRecord { .. } => "Malformed records (no identity key)",
            Self::ZeroLatePrice { .. } => "Zero later price",
        }
    }
}

/// Counts for one ledger through load and deduplication.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerStats {
    pub year: i32,
    pub loaded: usize,
    pub undefined_keys: usize,
    pub duplicate_groups: usize,
    pub discarded_duplicates: usize,
    pub retained: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub baseline: LedgerStats,
    pub current: LedgerStats,
    pub matched_pairs: usize,
    pub unmatched_baseline: usize,
    pub unmatched_current: usize,
    pub priced_pairs: usize,
    /// Postcode reference rows that could not be parsed, if a reference was given.
    pub reference_rows_skipped: usize,
    pub issues: Vec<DataIssue>,
}

impl RunReport {
    /// Issue totals by kind, in first-seen order.
    pub fn issue_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for issue in &self.issues {
            let label = issue.label();
            match counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, n)) => *n += 1,
                None => counts.push((label, 1)),
            }
        }
        counts
    }

    /// Matched pairs as a share of all households in England and Wales.
    pub fn coverage_pct(&self) -> f64 {
        self.matched_pairs as f64 / HOUSEHOLDS_ENGLAND_WALES_2021 as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_counts_group_by_kind() {
        let report = RunReport {
            issues: vec![
                DataIssue::ZeroLatePrice { identity_key: "a".into(), price_early: 1 },
                DataIssue::MalformedRecord { transaction_id: "x".into(), year: 2012, missing: vec!["postcode"] },
                DataIssue::ZeroLatePrice { identity_key: "b".into(), price_early: 2 },
            ],
            ..Default::default()
        };
        let counts = report.issue_counts();
        assert_eq!(counts, vec![("Zero later price", 2), ("Malformed records (no identity key)", 1)]);
    }

    #[test]
    fn test_coverage_pct() {
        let report = RunReport { matched_pairs: 247_828, ..Default::default() };
        assert!((report.coverage_pct() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let issue = DataIssue::ZeroLatePrice { identity_key: "k".into(), price_early: 5 };
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"kind\":\"zero_late_price\""));
    }
}

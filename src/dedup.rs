use std::collections::HashMap;

use chrono::NaiveDate;

use crate::diagnostics::DataIssue;
use crate::key::{identity_key, missing_fields};
use crate::models::{IdentityKey, Ledger, LedgerRole};

/// Which end of a date-sorted duplicate group survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retain {
    Earliest,
    Latest,
}

impl Retain {
    /// Baseline keeps the first sale of the year, current keeps the last.
    pub fn for_role(role: LedgerRole) -> Self {
        match role {
            LedgerRole::Baseline => Self::Earliest,
            LedgerRole::Current => Self::Latest,
        }
    }
}

pub struct Deduplicated {
    pub ledger: Ledger,
    pub duplicate_groups: usize,
    pub discarded_duplicates: usize,
    pub issues: Vec<DataIssue>,
}

impl Deduplicated {
    pub fn undefined_keys(&self) -> usize {
        self.issues.len()
    }
}

/// Picks the survivor index from a group of (load index, sale date).
/// Groups are in load order; on equal dates the lower load index wins.
fn pick(group: &[(usize, NaiveDate)], retain: Retain) -> usize {
    let chosen = match retain {
        Retain::Earliest => group.iter().min_by_key(|(idx, date)| (*date, *idx)),
        Retain::Latest => group
            .iter()
            .max_by_key(|(idx, date)| (*date, std::cmp::Reverse(*idx))),
    };
    chosen.map(|(idx, _)| *idx).unwrap_or(group[0].0)
}

/// Returns a new ledger with at most one record per identity key and none
/// without a key. The input is left untouched; survivors keep load order.
pub fn deduplicate(ledger: &Ledger, retain: Retain) -> Deduplicated {
    let mut groups: HashMap<IdentityKey, Vec<(usize, NaiveDate)>> = HashMap::new();
    let mut issues = Vec::new();

    for (idx, record) in ledger.records.iter().enumerate() {
        match identity_key(record) {
            Some(key) => groups.entry(key).or_default().push((idx, record.sale_date)),
            None => {
                log::debug!(
                    "{} {}: excluded {} (no identity key)",
                    ledger.role,
                    ledger.year,
                    record.transaction_id
                );
                issues.push(DataIssue::MalformedRecord {
                    transaction_id: record.transaction_id.clone(),
                    year: ledger.year,
                    missing: missing_fields(record),
                });
            }
        }
    }

    let mut duplicate_groups = 0usize;
    let mut discarded_duplicates = 0usize;
    let mut keep = vec![false; ledger.records.len()];
    for group in groups.values() {
        if group.len() > 1 {
            duplicate_groups += 1;
            discarded_duplicates += group.len() - 1;
        }
        keep[pick(group, retain)] = true;
    }

    let records = ledger
        .records
        .iter()
        .zip(&keep)
        .filter(|(_, kept)| **kept)
        .map(|(record, _)| record.clone())
        .collect();

    Deduplicated {
        ledger: Ledger::new(ledger.year, ledger.role, records),
        duplicate_groups,
        discarded_duplicates,
        issues,
    }
}

use std::collections::{HashMap, HashSet};

use crate::key::identity_key;
use crate::models::{IdentityKey, Ledger, MatchedPair, TransactionRecord};

pub struct Linkage {
    pub pairs: Vec<MatchedPair>,
    pub unmatched_baseline: usize,
    pub unmatched_current: usize,
}

impl Linkage {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Inner join of two deduplicated ledgers on identity key, in baseline order.
///
/// Records on either side without a partner are dropped without comment; that
/// is what turns two ledgers into a repeat-sales sample.
///
/// Inputs are expected to be deduplicated. If a key still repeats, either
/// side, only its first record in ledger order takes part, so the join stays
/// one-to-one.
pub fn link(baseline: &Ledger, current: &Ledger) -> Linkage {
    let mut by_key: HashMap<IdentityKey, &TransactionRecord> = HashMap::with_capacity(current.len());
    for record in &current.records {
        if let Some(key) = identity_key(record) {
            by_key.entry(key).or_insert(record);
        }
    }
    let current_keyed = by_key.len();

    let mut pairs = Vec::new();
    let mut seen_baseline: HashSet<IdentityKey> = HashSet::with_capacity(baseline.len());
    for record in &baseline.records {
        let Some(key) = identity_key(record) else { continue };
        if !seen_baseline.insert(key.clone()) {
            continue;
        }
        if let Some(late) = by_key.remove(&key) {
            pairs.push(MatchedPair {
                identity_key: key,
                baseline: record.clone(),
                current: late.clone(),
            });
        }
    }

    log::debug!(
        "linked {} pairs from {} baseline and {} current keys",
        pairs.len(),
        seen_baseline.len(),
        current_keyed
    );

    Linkage {
        unmatched_baseline: seen_baseline.len() - pairs.len(),
        unmatched_current: current_keyed - pairs.len(),
        pairs,
    }
}

use crate::change::price_pairs;
use crate::dedup::{deduplicate, Deduplicated, Retain};
use crate::diagnostics::{LedgerStats, RunReport};
use crate::linker::link;
use crate::models::{Ledger, PricedPair};

pub enum Linked {
    /// The two ledgers share no identity key.
    NoMatches,
    Matched(Vec<PricedPair>),
}

pub struct PipelineOutcome {
    pub linked: Linked,
    pub report: RunReport,
}

fn stats(input: &Ledger, out: &Deduplicated) -> LedgerStats {
    LedgerStats {
        year: input.year,
        loaded: input.len(),
        undefined_keys: out.undefined_keys(),
        duplicate_groups: out.duplicate_groups,
        discarded_duplicates: out.discarded_duplicates,
        retained: out.ledger.len(),
    }
}

/// Deduplicate both ledgers, link them, and price the matched pairs.
pub fn run(baseline: &Ledger, current: &Ledger) -> PipelineOutcome {
    let (early, late) = rayon::join(
        || deduplicate(baseline, Retain::for_role(baseline.role)),
        || deduplicate(current, Retain::for_role(current.role)),
    );

    for (input, out) in [(baseline, &early), (current, &late)] {
        log::info!(
            "{} {}: {} loaded, {} without key, {} duplicates dropped from {} groups, {} retained",
            input.role,
            input.year,
            input.len(),
            out.undefined_keys(),
            out.discarded_duplicates,
            out.duplicate_groups,
            out.ledger.len()
        );
    }

    let linkage = link(&early.ledger, &late.ledger);
    log::info!(
        "linked {} pairs ({} baseline and {} current unmatched)",
        linkage.pairs.len(),
        linkage.unmatched_baseline,
        linkage.unmatched_current
    );

    let mut report = RunReport {
        baseline: stats(baseline, &early),
        current: stats(current, &late),
        matched_pairs: linkage.pairs.len(),
        unmatched_baseline: linkage.unmatched_baseline,
        unmatched_current: linkage.unmatched_current,
        ..Default::default()
    };
    report.issues.extend(early.issues);
    report.issues.extend(late.issues);

    if linkage.is_empty() {
        return PipelineOutcome { linked: Linked::NoMatches, report };
    }

    let (priced, issues) = price_pairs(linkage.pairs);
    if !issues.is_empty() {
        log::warn!("{} matched pairs have a zero later price and were left out", issues.len());
    }
    report.priced_pairs = priced.len();
    report.issues.extend(issues);

    PipelineOutcome { linked: Linked::Matched(priced), report }
}

use thiserror::Error;

use crate::diagnostics::DataIssue;
use crate::models::{MatchedPair, PricedPair};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("later sale price is zero")]
pub struct DivisionError;

/// (late - early) / late * 100. Note the later price is the denominator.
pub fn percent_change(price_early: u64, price_late: u64) -> Result<f64, DivisionError> {
    if price_late == 0 {
        return Err(DivisionError);
    }
    let early = price_early as f64;
    let late = price_late as f64;
    Ok((late - early) / late * 100.0)
}

/// Prices every pair; pairs with a zero later price are left out and reported.
pub fn price_pairs(pairs: Vec<MatchedPair>) -> (Vec<PricedPair>, Vec<DataIssue>) {
    let mut priced = Vec::with_capacity(pairs.len());
    let mut issues = Vec::new();
    for pair in pairs {
        match percent_change(pair.price_early(), pair.price_late()) {
            Ok(percent_change) => priced.push(PricedPair { pair, percent_change }),
            Err(DivisionError) => {
                log::debug!("{}: {}", pair.identity_key, DivisionError);
                issues.push(DataIssue::ZeroLatePrice {
                    identity_key: pair.identity_key.to_string(),
                    price_early: pair.price_early(),
                });
            }
        }
    }
    (priced, issues)
}

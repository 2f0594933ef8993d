use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::diagnostics::RunReport;
use crate::error::Result;
use crate::models::{EnrichedPair, TransactionRecord};
use crate::reports::SummaryTable;

const PAIR_HEADER: [&str; 16] = [
    "identity_key",
    "postcode",
    "property_type",
    "tenure",
    "transaction_id_early",
    "date_early",
    "price_early",
    "transaction_id_late",
    "date_late",
    "price_late",
    "percent_change",
    "urban_rural",
    "ru11ind",
    "region",
    "lat",
    "long",
];

const LEDGER_HEADER: [&str; 10] = [
    "transaction_id",
    "price",
    "sale_date",
    "postcode",
    "property_type",
    "tenure",
    "paon",
    "saon",
    "street",
    "year",
];

const SUMMARY_HEADER: [&str; 3] = ["group", "count", "mean_percent_change"];

#[derive(Serialize)]
struct PairRow<'a> {
    identity_key: &'a str,
    postcode: &'a str,
    property_type: &'a str,
    tenure: &'a str,
    transaction_id_early: &'a str,
    date_early: String,
    price_early: u64,
    transaction_id_late: &'a str,
    date_late: String,
    price_late: u64,
    percent_change: f64,
    urban_rural: Option<&'a str>,
    ru11ind: Option<&'a str>,
    region: Option<&'a str>,
    lat: Option<f64>,
    long: Option<f64>,
}

#[derive(Serialize)]
struct LedgerRow<'a> {
    transaction_id: &'a str,
    price: u64,
    sale_date: String,
    postcode: Option<&'a str>,
    property_type: &'a str,
    tenure: &'a str,
    paon: Option<&'a str>,
    saon: Option<&'a str>,
    street: Option<&'a str>,
    year: i32,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// `csv::Writer` only emits a header on the first serialized row, so it is
/// written up front; an empty table still names its columns.
fn writer_with_header(path: &Path, header: &[&str]) -> Result<csv::Writer<std::fs::File>> {
    ensure_parent(path)?;
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(header)?;
    Ok(wtr)
}

/// One row per matched, priced and enriched property.
pub fn write_matched_pairs(path: &Path, pairs: &[EnrichedPair]) -> Result<()> {
    let mut wtr = writer_with_header(path, &PAIR_HEADER)?;
    for p in pairs {
        let pair = &p.priced.pair;
        wtr.serialize(PairRow {
            identity_key: pair.identity_key.as_str(),
            postcode: pair.current.postcode.as_deref().unwrap_or(""),
            property_type: pair.current.property_type.code(),
            tenure: pair.current.tenure.code(),
            transaction_id_early: &pair.baseline.transaction_id,
            date_early: pair.baseline.sale_date.format("%Y-%m-%d").to_string(),
            price_early: pair.price_early(),
            transaction_id_late: &pair.current.transaction_id,
            date_late: pair.current.sale_date.format("%Y-%m-%d").to_string(),
            price_late: pair.price_late(),
            percent_change: p.priced.percent_change,
            urban_rural: p.classification.map(|c| c.label()),
            ru11ind: p.ru_code.as_deref(),
            region: p.region.as_deref(),
            lat: p.location.map(|(lat, _)| lat),
            long: p.location.map(|(_, long)| long),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_ledger(path: &Path, records: &[TransactionRecord]) -> Result<()> {
    let mut wtr = writer_with_header(path, &LEDGER_HEADER)?;
    for r in records {
        wtr.serialize(LedgerRow {
            transaction_id: &r.transaction_id,
            price: r.price,
            sale_date: r.sale_date.format("%Y-%m-%d").to_string(),
            postcode: r.postcode.as_deref(),
            property_type: r.property_type.code(),
            tenure: r.tenure.code(),
            paon: r.paon.as_deref(),
            saon: r.saon.as_deref(),
            street: r.street.as_deref(),
            year: r.year_tag,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn summary_path(dir: &Path, table: &SummaryTable) -> PathBuf {
    dir.join(format!("change_by_{}.csv", table.dimension.key()))
}

pub fn write_summary_table(dir: &Path, table: &SummaryTable) -> Result<PathBuf> {
    let path = summary_path(dir, table);
    let mut wtr = writer_with_header(&path, &SUMMARY_HEADER)?;
    for row in &table.rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(path)
}

pub fn write_run_report(path: &Path, report: &RunReport) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::diagnostics::DataIssue;
use crate::error::{PricePairError, Result};
use crate::models::{Ledger, LedgerRole, PropertyType, Tenure, TransactionRecord};

// ---------------------------------------------------------------------------
// Price Paid column layout (no header row)
// ---------------------------------------------------------------------------

const COL_ID: usize = 0;
const COL_PRICE: usize = 1;
const COL_DATE: usize = 2;
const COL_POSTCODE: usize = 3;
const COL_PROPERTY_TYPE: usize = 4;
const COL_TENURE: usize = 6;
const COL_PAON: usize = 7;
const COL_SAON: usize = 8;
const COL_STREET: usize = 9;

/// Yearly files omit the trailing record-status column; monthly ones carry it.
const MIN_COLUMNS: usize = 15;
const MAX_COLUMNS: usize = 16;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_price(raw: &str) -> Option<u64> {
    raw.trim().replace(',', "").parse().ok()
}

/// Accepts `2012-01-05 00:00` as published, or a bare `2012-01-05`.
pub fn parse_sale_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split_whitespace().next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn optional(raw: &str) -> Option<String> {
    let v = raw.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Parse one row into a record. Missing address parts are fine here; only
/// fields the record cannot exist without produce an error message.
pub fn parse_row(record: &csv::StringRecord, year: i32) -> std::result::Result<TransactionRecord, String> {
    let price = parse_price(&record[COL_PRICE])
        .ok_or_else(|| format!("bad price '{}'", &record[COL_PRICE]))?;
    let sale_date = parse_sale_date(&record[COL_DATE])
        .ok_or_else(|| format!("bad date '{}'", &record[COL_DATE]))?;
    let property_type = PropertyType::from_code(&record[COL_PROPERTY_TYPE])
        .ok_or_else(|| format!("unknown property type '{}'", &record[COL_PROPERTY_TYPE]))?;
    let tenure = Tenure::from_code(&record[COL_TENURE])
        .ok_or_else(|| format!("unknown tenure '{}'", &record[COL_TENURE]))?;

    Ok(TransactionRecord {
        transaction_id: record[COL_ID].trim().to_string(),
        price,
        sale_date,
        postcode: optional(&record[COL_POSTCODE]),
        property_type,
        tenure,
        paon: optional(&record[COL_PAON]),
        saon: optional(&record[COL_SAON]),
        street: optional(&record[COL_STREET]),
        year_tag: year,
    })
}

// ---------------------------------------------------------------------------
// load_ledger
// ---------------------------------------------------------------------------

pub struct LoadedLedger {
    pub ledger: Ledger,
    pub issues: Vec<DataIssue>,
}

fn read_source(
    file_path: &Path,
    year: i32,
    records: &mut Vec<TransactionRecord>,
    issues: &mut Vec<DataIssue>,
) -> Result<usize> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let before = records.len();
    for result in rdr.byte_records() {
        let raw = result?;
        let line = raw.position().map_or(0, |p| p.line());
        if raw.len() < MIN_COLUMNS || raw.len() > MAX_COLUMNS {
            return Err(PricePairError::ColumnLayout {
                path: file_path.to_path_buf(),
                line,
                found: raw.len(),
            });
        }
        let row = match csv::StringRecord::from_byte_record(raw) {
            Ok(row) => row,
            Err(_) => {
                log::debug!("{}:{line}: skipped, invalid UTF-8", file_path.display());
                issues.push(DataIssue::UnreadableRow {
                    source: file_path.to_path_buf(),
                    line,
                    reason: "invalid UTF-8".to_string(),
                });
                continue;
            }
        };
        match parse_row(&row, year) {
            Ok(record) => records.push(record),
            Err(reason) => {
                log::debug!("{}:{line}: skipped, {reason}", file_path.display());
                issues.push(DataIssue::UnreadableRow {
                    source: file_path.to_path_buf(),
                    line,
                    reason,
                });
            }
        }
    }
    Ok(records.len() - before)
}

/// Read one or more Price Paid files into a single ledger, appended row-wise
/// in the order given. A missing file or a row with the wrong number of
/// columns aborts the load.
pub fn load_ledger(paths: &[PathBuf], year: i32, role: LedgerRole) -> Result<LoadedLedger> {
    if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
        return Err(PricePairError::MissingInput(missing.clone()));
    }

    let mut records = Vec::new();
    let mut issues = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for path in paths {
        let checksum = compute_checksum(path)?;
        if let Some(first) = seen.get(&checksum) {
            log::warn!(
                "{} has the same content as {}; skipped",
                path.display(),
                first.display()
            );
            issues.push(DataIssue::DuplicateSource {
                source: path.clone(),
                first: first.clone(),
            });
            continue;
        }
        seen.insert(checksum, path.clone());

        let n = read_source(path, year, &mut records, &mut issues)?;
        log::info!("{role} {year}: read {n} records from {}", path.display());
    }

    Ok(LoadedLedger {
        ledger: Ledger::new(year, role, records),
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pp_row(id: &str, price: &str, date: &str, postcode: &str, paon: &str, saon: &str, street: &str) -> String {
        format!(
            "\"{{{id}}}\",\"{price}\",\"{date} 00:00\",\"{postcode}\",\"T\",\"N\",\"F\",\"{paon}\",\"{saon}\",\"{street}\",\"\",\"LEEDS\",\"LEEDS\",\"WEST YORKSHIRE\",\"A\",\"A\"\n"
        )
    }

    fn write(dir: &Path, name: &str, rows: &[String]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, rows.concat()).unwrap();
        path
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("250000"), Some(250_000));
        assert_eq!(parse_price(" 1,250,000 "), Some(1_250_000));
        assert_eq!(parse_price("0"), Some(0));
        assert_eq!(parse_price("-5"), None);
        assert_eq!(parse_price("abc"), None);
    }

    #[test]
    fn test_parse_sale_date() {
        assert_eq!(parse_sale_date("2012-01-05 00:00"), NaiveDate::from_ymd_opt(2012, 1, 5));
        assert_eq!(parse_sale_date("2022-09-15"), NaiveDate::from_ymd_opt(2022, 9, 15));
        assert_eq!(parse_sale_date("15/09/2022"), None);
        assert_eq!(parse_sale_date("2022-02-30 00:00"), None);
        assert_eq!(parse_sale_date(""), None);
    }

    #[test]
    fn test_load_reads_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "pp.csv", &[
            pp_row("A1", "200000", "2012-01-05", "LS1 4AP", "12", "", "PARK ROW"),
        ]);
        let loaded = load_ledger(&[path], 2012, LedgerRole::Baseline).unwrap();
        let r = &loaded.ledger.records[0];
        assert_eq!(r.transaction_id, "{A1}");
        assert_eq!(r.price, 200_000);
        assert_eq!(r.sale_date, NaiveDate::from_ymd_opt(2012, 1, 5).unwrap());
        assert_eq!(r.postcode.as_deref(), Some("LS1 4AP"));
        assert_eq!(r.paon.as_deref(), Some("12"));
        assert_eq!(r.saon, None);
        assert_eq!(r.street.as_deref(), Some("PARK ROW"));
        assert_eq!(r.property_type, PropertyType::Terraced);
        assert_eq!(r.tenure, Tenure::Freehold);
        assert_eq!(r.year_tag, 2012);
        assert!(loaded.issues.is_empty());
    }

    #[test]
    fn test_load_appends_parts_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = write(dir.path(), "part1.csv", &[
            pp_row("A", "1", "2012-01-01", "X1 1XX", "1", "", "A ST"),
        ]);
        let p2 = write(dir.path(), "part2.csv", &[
            pp_row("B", "2", "2012-01-02", "X1 1XX", "2", "", "A ST"),
            pp_row("C", "3", "2012-01-03", "X1 1XX", "3", "", "A ST"),
        ]);
        let loaded = load_ledger(&[p1, p2], 2012, LedgerRole::Baseline).unwrap();
        let ids: Vec<&str> = loaded.ledger.records.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["{A}", "{B}", "{C}"]);
    }

    #[test]
    fn test_missing_address_parts_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "pp.csv", &[
            pp_row("A", "1", "2012-01-01", "", "1", "", "A ST"),
        ]);
        let loaded = load_ledger(&[path], 2012, LedgerRole::Baseline).unwrap();
        assert_eq!(loaded.ledger.len(), 1);
        assert_eq!(loaded.ledger.records[0].postcode, None);
    }

    #[test]
    fn test_unreadable_rows_are_skipped_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "pp.csv", &[
            pp_row("A", "lots", "2012-01-01", "X1 1XX", "1", "", "A ST"),
            pp_row("B", "5", "2012-13-01", "X1 1XX", "1", "", "A ST"),
            pp_row("C", "5", "2012-01-01", "X1 1XX", "1", "", "A ST"),
        ]);
        let loaded = load_ledger(&[path], 2012, LedgerRole::Baseline).unwrap();
        assert_eq!(loaded.ledger.len(), 1);
        assert_eq!(loaded.issues.len(), 2);
        assert!(matches!(
            &loaded.issues[0],
            DataIssue::UnreadableRow { line: 1, reason, .. } if reason.contains("price")
        ));
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pp.csv");
        let mut bytes = pp_row("A", "1", "2012-01-01", "X1 1XX", "1", "", "A ST").into_bytes();
        // a Latin-1 É where UTF-8 is expected
        bytes.extend(
            pp_row("B", "2", "2012-01-02", "X1 1XX", "2", "", "CAF# ST")
                .bytes()
                .map(|b| if b == b'#' { 0xC9 } else { b }),
        );
        bytes.extend(pp_row("C", "3", "2012-01-03", "X1 1XX", "3", "", "A ST").into_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let loaded = load_ledger(&[path], 2012, LedgerRole::Baseline).unwrap();
        let ids: Vec<&str> = loaded.ledger.records.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["{A}", "{C}"]);
        assert_eq!(loaded.issues.len(), 1);
        assert!(matches!(
            &loaded.issues[0],
            DataIssue::UnreadableRow { line: 2, reason, .. } if reason == "invalid UTF-8"
        ));
    }

    #[test]
    fn test_wrong_column_count_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pp.csv");
        std::fs::write(&path, "a,b,c\n").unwrap();
        let err = load_ledger(&[path], 2012, LedgerRole::Baseline).err().unwrap();
        assert!(matches!(err, PricePairError::ColumnLayout { found: 3, line: 1, .. }));
    }

    #[test]
    fn test_fifteen_columns_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pp.csv");
        std::fs::write(&path, "{A},100,2012-01-01 00:00,X1 1XX,F,N,L,1,FLAT 2,A ST,,T,D,C,A\n").unwrap();
        let loaded = load_ledger(&[path], 2012, LedgerRole::Baseline).unwrap();
        assert_eq!(loaded.ledger.records[0].saon.as_deref(), Some("FLAT 2"));
        assert_eq!(loaded.ledger.records[0].tenure, Tenure::Leasehold);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_ledger(&[dir.path().join("nope.csv")], 2022, LedgerRole::Current)
            .err()
            .unwrap();
        assert!(matches!(err, PricePairError::MissingInput(_)));
    }

    #[test]
    fn test_duplicate_source_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let rows = [pp_row("A", "1", "2012-01-01", "X1 1XX", "1", "", "A ST")];
        let p1 = write(dir.path(), "a.csv", &rows);
        let p2 = write(dir.path(), "b.csv", &rows);
        let loaded = load_ledger(&[p1.clone(), p2.clone()], 2012, LedgerRole::Baseline).unwrap();
        assert_eq!(loaded.ledger.len(), 1);
        assert_eq!(loaded.issues, vec![DataIssue::DuplicateSource { source: p2, first: p1 }]);
    }
}

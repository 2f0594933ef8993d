use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PricePairError, Result};
use crate::models::{EnrichedPair, PricedPair, UrbanRural};

const REQUIRED_COLUMNS: &[&str] = &["pcds", "ru11ind", "rgn", "lat", "long"];

/// ONSPD writes this latitude for postcodes with no grid reference.
const NO_GRID_LAT: f64 = 99.999999;

const REGIONS: &[(&str, &str)] = &[
    ("E12000001", "North East"),
    ("E12000002", "North West"),
    ("E12000003", "Yorkshire and The Humber"),
    ("E12000004", "East Midlands"),
    ("E12000005", "West Midlands"),
    ("E12000006", "East of England"),
    ("E12000007", "London"),
    ("E12000008", "South East"),
    ("E12000009", "South West"),
    ("W99999999", "Wales"),
];

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "pcds")]
    postcode: String,
    #[serde(rename = "ru11ind")]
    ru_code: Option<String>,
    #[serde(rename = "rgn")]
    region_code: Option<String>,
    lat: Option<f64>,
    long: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostcodeInfo {
    pub ru_code: Option<String>,
    pub classification: Option<UrbanRural>,
    pub region: Option<String>,
    pub location: Option<(f64, f64)>,
}

/// Postcode to geography lookup, many postcodes per area.
#[derive(Debug, Default)]
pub struct PostcodeDirectory {
    entries: HashMap<String, PostcodeInfo>,
    skipped: usize,
}

/// Upper case with all whitespace removed. Only used for the reference
/// lookup, never for identity keys.
pub fn normalize_postcode(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// 2011 rural-urban indicator for England and Wales: A-C urban, D-F rural.
pub fn classify(ru_code: &str) -> Option<UrbanRural> {
    match ru_code.trim() {
        "A1" | "B1" | "C1" | "C2" => Some(UrbanRural::Urban),
        "D1" | "D2" | "E1" | "E2" | "F1" | "F2" => Some(UrbanRural::Rural),
        _ => None,
    }
}

pub fn region_name(code: &str) -> String {
    REGIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl PostcodeDirectory {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PricePairError::MissingInput(path.to_path_buf()));
        }
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = rdr.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h.trim() == *column) {
                return Err(PricePairError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }

        let mut entries = HashMap::new();
        let mut skipped = 0usize;
        for result in rdr.deserialize::<ReferenceRow>() {
            let Ok(row) = result else {
                skipped += 1;
                continue;
            };
            let ru_code = non_empty(row.ru_code);
            let location = match (row.lat, row.long) {
                (Some(lat), Some(long)) if (lat - NO_GRID_LAT).abs() > 1e-6 => Some((lat, long)),
                _ => None,
            };
            let info = PostcodeInfo {
                classification: ru_code.as_deref().and_then(classify),
                ru_code,
                region: non_empty(row.region_code).map(|c| region_name(&c)),
                location,
            };
            entries.insert(normalize_postcode(&row.postcode), info);
        }
        if skipped > 0 {
            log::warn!("{}: skipped {skipped} unreadable reference rows", path.display());
        }
        log::info!("loaded {} reference postcodes from {}", entries.len(), path.display());
        Ok(Self { entries, skipped })
    }

    pub fn lookup(&self, postcode: &str) -> Option<&PostcodeInfo> {
        self.entries.get(&normalize_postcode(postcode))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rows that failed to parse and were left out of the lookup.
    pub fn skipped_rows(&self) -> usize {
        self.skipped
    }

    #[cfg(test)]
    pub fn insert(&mut self, postcode: &str, info: PostcodeInfo) {
        self.entries.insert(normalize_postcode(postcode), info);
    }
}

/// Attach reference geography by the current sale's postcode. Pairs whose
/// postcode is not in the directory (or with no directory) stay unclassified.
pub fn enrich(priced: Vec<PricedPair>, directory: Option<&PostcodeDirectory>) -> Vec<EnrichedPair> {
    let mut unmatched = 0usize;
    let enriched: Vec<EnrichedPair> = priced
        .into_iter()
        .map(|priced| {
            let info = directory.and_then(|d| {
                priced.pair.current.postcode.as_deref().and_then(|pc| d.lookup(pc))
            });
            if info.is_none() {
                unmatched += 1;
            }
            EnrichedPair {
                classification: info.and_then(|i| i.classification),
                ru_code: info.and_then(|i| i.ru_code.clone()),
                region: info.and_then(|i| i.region.clone()),
                location: info.and_then(|i| i.location),
                priced,
            }
        })
        .collect();
    if directory.is_some() && unmatched > 0 {
        log::info!("{unmatched} pairs have no reference postcode entry");
    }
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::tests::record;
    use crate::models::{IdentityKey, MatchedPair};

    fn write_reference(dir: &Path, content: &str) -> std::path::PathBuf {
        let path = dir.join("onspd.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn priced(postcode: &str, change: f64) -> PricedPair {
        let r = record(Some(postcode), Some("1"), None, Some("ST"));
        PricedPair {
            pair: MatchedPair { identity_key: IdentityKey::new("k"), baseline: r.clone(), current: r },
            percent_change: change,
        }
    }

    #[test]
    fn test_normalize_postcode() {
        assert_eq!(normalize_postcode("ls1 4ap"), "LS14AP");
        assert_eq!(normalize_postcode(" SW1A  1AA "), "SW1A1AA");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("A1"), Some(UrbanRural::Urban));
        assert_eq!(classify("C2"), Some(UrbanRural::Urban));
        assert_eq!(classify("E2"), Some(UrbanRural::Rural));
        assert_eq!(classify("3"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_region_name() {
        assert_eq!(region_name("E12000007"), "London");
        assert_eq!(region_name("W99999999"), "Wales");
        assert_eq!(region_name("S99999999"), "S99999999");
    }

    #[test]
    fn test_load_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_reference(dir.path(), "\
pcd,pcds,ru11ind,rgn,lat,long
LS1  4AP,LS1 4AP,A1,E12000003,53.799,-1.549
LL55 4UR,LL55 4UR,E2,W99999999,53.117,-4.13
ZZ9 9ZZ,ZZ9 9ZZ,,,99.999999,0.000000
");
        let dir_ = PostcodeDirectory::load(&path).unwrap();
        assert_eq!(dir_.len(), 3);

        let leeds = dir_.lookup("ls1 4ap").unwrap();
        assert_eq!(leeds.classification, Some(UrbanRural::Urban));
        assert_eq!(leeds.region.as_deref(), Some("Yorkshire and The Humber"));
        assert_eq!(leeds.location, Some((53.799, -1.549)));

        let wales = dir_.lookup("LL554UR").unwrap();
        assert_eq!(wales.classification, Some(UrbanRural::Rural));
        assert_eq!(wales.region.as_deref(), Some("Wales"));

        let nowhere = dir_.lookup("ZZ9 9ZZ").unwrap();
        assert_eq!(nowhere.classification, None);
        assert_eq!(nowhere.region, None);
        assert_eq!(nowhere.location, None);
    }

    #[test]
    fn test_unparseable_rows_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_reference(dir.path(), "\
pcds,ru11ind,rgn,lat,long
LS1 4AP,A1,E12000003,53.799,-1.549
M1 1AE,A1,E12000002,north,-2.245
");
        let directory = PostcodeDirectory::load(&path).unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.skipped_rows(), 1);
        assert!(directory.lookup("M1 1AE").is_none());
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_reference(dir.path(), "pcds,rgn,lat,long\nLS1 4AP,E12000003,53.8,-1.5\n");
        let err = PostcodeDirectory::load(&path).unwrap_err();
        assert!(matches!(err, PricePairError::MissingColumn { column, .. } if column == "ru11ind"));
    }

    #[test]
    fn test_enrich_by_current_postcode() {
        let mut directory = PostcodeDirectory::default();
        directory.insert("LS1 4AP", PostcodeInfo {
            ru_code: Some("A1".into()),
            classification: Some(UrbanRural::Urban),
            region: Some("Yorkshire and The Humber".into()),
            location: Some((53.8, -1.5)),
        });
        let out = enrich(vec![priced("LS1 4AP", 10.0), priced("XX1 1XX", 5.0)], Some(&directory));
        assert_eq!(out[0].classification, Some(UrbanRural::Urban));
        assert_eq!(out[0].ru_code.as_deref(), Some("A1"));
        assert_eq!(out[1].classification, None);
        assert_eq!(out[1].region, None);
    }

    #[test]
    fn test_enrich_without_directory() {
        let out = enrich(vec![priced("LS1 4AP", 10.0)], None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].classification, None);
        assert_eq!(out[0].priced.percent_change, 10.0);
    }
}

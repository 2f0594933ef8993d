use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// HMLR property type code (column 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    #[serde(rename = "D")]
    Detached,
    #[serde(rename = "S")]
    SemiDetached,
    #[serde(rename = "T")]
    Terraced,
    #[serde(rename = "F")]
    Flat,
    #[serde(rename = "O")]
    Other,
}

impl PropertyType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "D" => Some(Self::Detached),
            "S" => Some(Self::SemiDetached),
            "T" => Some(Self::Terraced),
            "F" => Some(Self::Flat),
            "O" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Detached => "D",
            Self::SemiDetached => "S",
            Self::Terraced => "T",
            Self::Flat => "F",
            Self::Other => "O",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Detached => "Detached",
            Self::SemiDetached => "Semi-detached",
            Self::Terraced => "Terraced",
            Self::Flat => "Flat/maisonette",
            Self::Other => "Other",
        }
    }
}

/// HMLR duration code (column 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tenure {
    #[serde(rename = "F")]
    Freehold,
    #[serde(rename = "L")]
    Leasehold,
    #[serde(rename = "U")]
    Unknown,
}

impl Tenure {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "F" => Some(Self::Freehold),
            "L" => Some(Self::Leasehold),
            "U" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Freehold => "F",
            Self::Leasehold => "L",
            Self::Unknown => "U",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Freehold => "Freehold",
            Self::Leasehold => "Leasehold",
            Self::Unknown => "Unknown",
        }
    }
}

/// Which side of the comparison a ledger sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LedgerRole {
    Baseline,
    Current,
}

impl fmt::Display for LedgerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::Current => write!(f, "current"),
        }
    }
}

/// One Price Paid row after parsing. Address parts are `None` when the
/// source field was empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub price: u64,
    pub sale_date: NaiveDate,
    pub postcode: Option<String>,
    pub property_type: PropertyType,
    pub tenure: Tenure,
    pub paon: Option<String>,
    pub saon: Option<String>,
    pub street: Option<String>,
    pub year_tag: i32,
}

/// All transactions for one calendar year, in load order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub year: i32,
    pub role: LedgerRole,
    pub records: Vec<TransactionRecord>,
}

impl Ledger {
    pub fn new(year: i32, role: LedgerRole, records: Vec<TransactionRecord>) -> Self {
        Self { year, role, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Best-effort identifier of a physical property across ledgers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A baseline and a current sale of the same identity key.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub identity_key: IdentityKey,
    pub baseline: TransactionRecord,
    pub current: TransactionRecord,
}

impl MatchedPair {
    pub fn price_early(&self) -> u64 {
        self.baseline.price
    }

    pub fn price_late(&self) -> u64 {
        self.current.price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedPair {
    pub pair: MatchedPair,
    pub percent_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum UrbanRural {
    Urban,
    Rural,
}

impl UrbanRural {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Urban => "Urban",
            Self::Rural => "Rural",
        }
    }
}

/// A priced pair joined against the postcode reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedPair {
    pub priced: PricedPair,
    pub classification: Option<UrbanRural>,
    pub ru_code: Option<String>,
    pub region: Option<String>,
    pub location: Option<(f64, f64)>,
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::EnrichedPair;

const UNCLASSIFIED: &str = "Unclassified";

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    UrbanRural,
    PropertyType,
    Tenure,
    Region,
    UrbanRuralByPropertyType,
}

pub const ALL_DIMENSIONS: &[Dimension] = &[
    Dimension::UrbanRural,
    Dimension::PropertyType,
    Dimension::Tenure,
    Dimension::Region,
    Dimension::UrbanRuralByPropertyType,
];

impl Dimension {
    pub fn key(&self) -> &'static str {
        match self {
            Self::UrbanRural => "urban_rural",
            Self::PropertyType => "property_type",
            Self::Tenure => "tenure",
            Self::Region => "region",
            Self::UrbanRuralByPropertyType => "urban_rural_property_type",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::UrbanRural => "Change by urban/rural classification",
            Self::PropertyType => "Change by property type",
            Self::Tenure => "Change by tenure",
            Self::Region => "Change by region",
            Self::UrbanRuralByPropertyType => "Change by classification and property type",
        }
    }

    /// Group label for one pair. Property type and tenure come from the
    /// current sale.
    fn label(&self, p: &EnrichedPair) -> String {
        let classification = || {
            p.classification
                .map(|c| c.label().to_string())
                .unwrap_or_else(|| UNCLASSIFIED.to_string())
        };
        let current = &p.priced.pair.current;
        match self {
            Self::UrbanRural => classification(),
            Self::PropertyType => current.property_type.label().to_string(),
            Self::Tenure => current.tenure.label().to_string(),
            Self::Region => p.region.clone().unwrap_or_else(|| UNCLASSIFIED.to_string()),
            Self::UrbanRuralByPropertyType => {
                format!("{} / {}", classification(), current.property_type.label())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Summary tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub group: String,
    pub count: usize,
    pub mean_percent_change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub dimension: Dimension,
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// Nothing to aggregate; no group statistics exist.
    NoData,
    Tables {
        overall: SummaryRow,
        tables: Vec<SummaryTable>,
    },
}

fn mean_row(group: String, changes: &[f64]) -> SummaryRow {
    SummaryRow {
        group,
        count: changes.len(),
        mean_percent_change: changes.iter().sum::<f64>() / changes.len() as f64,
    }
}

/// Mean change and count per group, sorted by group label.
pub fn group_means(pairs: &[EnrichedPair], dimension: Dimension) -> SummaryTable {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for p in pairs {
        groups.entry(dimension.label(p)).or_default().push(p.priced.percent_change);
    }
    let rows = groups
        .into_iter()
        .map(|(group, changes)| mean_row(group, &changes))
        .collect();
    SummaryTable { dimension, rows }
}

pub fn summarize(pairs: &[EnrichedPair]) -> Summary {
    if pairs.is_empty() {
        return Summary::NoData;
    }
    let all: Vec<f64> = pairs.iter().map(|p| p.priced.percent_change).collect();
    Summary::Tables {
        overall: mean_row("All matched pairs".to_string(), &all),
        tables: ALL_DIMENSIONS.iter().map(|d| group_means(pairs, *d)).collect(),
    }
}

//! Code-mapping tables
//!
//! The property gateway keys districts, developers, facilities, bedroom
//! counts, apartment types and cities by numeric codes. These tables map
//! human names to codes and are looked up with fuzzy matching so that user
//! spellings ("business bey", "jvc") still resolve.
//!
//! Policy: below the similarity threshold the raw user string is kept
//! verbatim and passed through; the gateway ignores values it cannot map and
//! the local re-filter compensates.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::ConfigError;

/// Raw YAML shape of the tables asset.
#[derive(Debug, Clone, Default, Deserialize)]
struct TablesData {
    #[serde(default)]
    districts: HashMap<String, u32>,
    #[serde(default)]
    developers: HashMap<String, u32>,
    #[serde(default)]
    facilities: HashMap<String, u32>,
    #[serde(default)]
    bedrooms: HashMap<String, u32>,
    #[serde(default)]
    apartment_types: HashMap<String, u32>,
    #[serde(default)]
    cities: HashMap<String, u32>,
}

/// One lookup table: lowercased name -> (code, canonical name).
#[derive(Debug, Clone, Default)]
struct Table {
    entries: HashMap<String, (u32, String)>,
}

impl Table {
    fn from_map(map: HashMap<String, u32>) -> Self {
        let entries = map
            .into_iter()
            .map(|(name, code)| (name.to_lowercase(), (code, name)))
            .collect();
        Self { entries }
    }

    /// Exact match first, then best fuzzy match above `threshold`.
    fn resolve(&self, name: &str, threshold: f64) -> TableMatch {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return TableMatch::Unmatched;
        }
        if let Some((code, canonical)) = self.entries.get(&needle) {
            return TableMatch::Code {
                code: *code,
                canonical: canonical.clone(),
            };
        }

        let mut best: Option<(f64, u32, &str)> = None;
        for (key, (code, canonical)) in &self.entries {
            let score = similarity(&needle, key);
            if score >= threshold && best.map_or(true, |(b, _, _)| score > b) {
                best = Some((score, *code, canonical));
            }
        }

        match best {
            Some((_, code, canonical)) => TableMatch::Code {
                code,
                canonical: canonical.to_string(),
            },
            None => TableMatch::Unmatched,
        }
    }
}

/// Result of a table lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableMatch {
    /// Resolved to a provider code; `canonical` is the table's spelling.
    Code { code: u32, canonical: String },
    /// No acceptable match; caller keeps the raw string.
    Unmatched,
}

impl TableMatch {
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Code { code, .. } => Some(*code),
            Self::Unmatched => None,
        }
    }

    /// Canonical spelling when matched, otherwise the given fallback.
    pub fn canonical_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            Self::Code { canonical, .. } => canonical,
            Self::Unmatched => fallback,
        }
    }
}

/// All code-mapping tables, plus the acceptance threshold.
#[derive(Debug, Clone, Default)]
pub struct CodeTables {
    districts: Table,
    developers: Table,
    facilities: Table,
    bedrooms: Table,
    apartment_types: Table,
    cities: Table,
    threshold: f64,
}

impl CodeTables {
    /// Load the tables asset from a YAML file.
    pub fn load(path: impl AsRef<Path>, threshold: f64) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Tables {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let data: TablesData = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Tables {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_data(data, threshold))
    }

    /// Empty tables; every lookup is `Unmatched`. Used in tests and when the
    /// asset is missing (the raw-string fallback keeps the flow working).
    pub fn empty(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    fn from_data(data: TablesData, threshold: f64) -> Self {
        Self {
            districts: Table::from_map(data.districts),
            developers: Table::from_map(data.developers),
            facilities: Table::from_map(data.facilities),
            bedrooms: Table::from_map(data.bedrooms),
            apartment_types: Table::from_map(data.apartment_types),
            cities: Table::from_map(data.cities),
            threshold,
        }
    }

    pub fn resolve_district(&self, name: &str) -> TableMatch {
        self.districts.resolve(name, self.threshold)
    }

    pub fn resolve_developer(&self, name: &str) -> TableMatch {
        self.developers.resolve(name, self.threshold)
    }

    pub fn resolve_facility(&self, name: &str) -> TableMatch {
        self.facilities.resolve(name, self.threshold)
    }

    pub fn resolve_bedrooms(&self, label: &str) -> TableMatch {
        self.bedrooms.resolve(label, self.threshold)
    }

    pub fn resolve_apartment_type(&self, name: &str) -> TableMatch {
        self.apartment_types.resolve(name, self.threshold)
    }

    pub fn resolve_city(&self, name: &str) -> TableMatch {
        self.cities.resolve(name, self.threshold)
    }
}

/// Normalized similarity ratio in [0, 1] based on Levenshtein distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().max(b_chars.len());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(&a_chars, &b_chars);
    1.0 - (distance as f64 / max_len as f64)
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

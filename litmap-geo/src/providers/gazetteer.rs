//! Offline gazetteer backed by a GeoNames city export
//!
//! Reads the "all cities with a population > 500" export (semicolon
//! separated, one row per place) and matches names exactly against either
//! the display name or the ASCII name. Matching is case-sensitive unless
//! `case_insensitive` is set; there is no fuzzy or partial matching.
//!
//! Lookups return matches ordered by population, largest first (stable for
//! equal or missing populations), so downstream "first candidate" rules
//! pick the largest place.

use super::LocationProvider;
use crate::error::{GazetteerError, ProviderError};
use crate::types::{Candidate, Coordinates};
use async_trait::async_trait;
use litmap_common::CountryField;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// One row of the place registry
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerEntry {
    pub geoname_id: Option<u64>,
    pub name: String,
    pub ascii_name: String,
    pub coordinates: Coordinates,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub population: Option<u64>,
}

impl GazetteerEntry {
    /// Country in the requested representation
    pub fn country_as(&self, field: CountryField) -> Option<&str> {
        match field {
            CountryField::Name => self.country.as_deref(),
            CountryField::Code => self.country_code.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoNamesRow {
    #[serde(rename = "Geoname ID", default)]
    geoname_id: Option<u64>,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ASCII Name", default)]
    ascii_name: Option<String>,
    #[serde(rename = "Coordinates")]
    coordinates: String,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Country Code", default)]
    country_code: Option<String>,
    #[serde(rename = "Population", default)]
    population: Option<u64>,
}

/// Gazetteer matching options
#[derive(Debug, Clone, Copy, Default)]
pub struct GazetteerOptions {
    pub case_insensitive: bool,
    pub country_field: CountryField,
}

/// In-memory place registry with a name index
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
    index: HashMap<String, Vec<usize>>,
    options: GazetteerOptions,
}

impl Gazetteer {
    /// Load a GeoNames export from disk
    pub fn load(path: &Path, delimiter: char, options: GazetteerOptions) -> Result<Self, GazetteerError> {
        let file = std::fs::File::open(path)?;
        let gazetteer = Self::from_reader(file, delimiter, options)?;
        info!(
            path = %path.display(),
            places = gazetteer.len(),
            "Loaded gazetteer"
        );
        Ok(gazetteer)
    }

    /// Parse a GeoNames export from any reader
    pub fn from_reader<R: Read>(
        reader: R,
        delimiter: char,
        options: GazetteerOptions,
    ) -> Result<Self, GazetteerError> {
        if !delimiter.is_ascii() {
            return Err(GazetteerError::Delimiter(delimiter));
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .flexible(true)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (row_number, record) in csv_reader.deserialize::<GeoNamesRow>().enumerate() {
            // header is line 1
            let line = row_number as u64 + 2;
            let row = record?;
            let coordinates = row.coordinates.parse::<Coordinates>().map_err(|e| {
                GazetteerError::InvalidRow {
                    line,
                    reason: e.to_string(),
                }
            })?;

            let name = row.name.trim().to_string();
            let ascii_name = row
                .ascii_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| name.clone());

            entries.push(GazetteerEntry {
                geoname_id: row.geoname_id,
                name,
                ascii_name,
                coordinates,
                country: non_empty(row.country),
                country_code: non_empty(row.country_code),
                population: row.population,
            });
        }

        Ok(Self::from_entries(entries, options))
    }

    /// Build a gazetteer from already-parsed entries
    pub fn from_entries(entries: Vec<GazetteerEntry>, options: GazetteerOptions) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, entry) in entries.iter().enumerate() {
            let name_key = match_key(&entry.name, options.case_insensitive);
            let ascii_key = match_key(&entry.ascii_name, options.case_insensitive);

            index.entry(name_key.clone()).or_default().push(i);
            if ascii_key != name_key {
                index.entry(ascii_key).or_default().push(i);
            }
        }

        Self {
            entries,
            index,
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any place is registered under `name`
    pub fn contains_name(&self, name: &str) -> bool {
        self.index
            .contains_key(&match_key(name.trim(), self.options.case_insensitive))
    }

    /// All entries matching `name`, largest population first
    pub fn lookup_entries(&self, name: &str) -> Vec<&GazetteerEntry> {
        let key = match_key(name.trim(), self.options.case_insensitive);
        let mut matches: Vec<&GazetteerEntry> = self
            .index
            .get(&key)
            .map(|ids| ids.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default();

        // stable: equal populations keep registry order, unknown sorts last
        matches.sort_by(|a, b| b.population.unwrap_or(0).cmp(&a.population.unwrap_or(0)));
        matches
    }
}

#[async_trait]
impl LocationProvider for Gazetteer {
    fn source_id(&self) -> &'static str {
        "GeoNames"
    }

    async fn lookup(&self, name: &str) -> Result<Vec<Candidate>, ProviderError> {
        let candidates: Vec<Candidate> = self
            .lookup_entries(name)
            .into_iter()
            .map(|entry| Candidate {
                name: entry.name.clone(),
                coordinates: entry.coordinates,
                country: entry.country_as(self.options.country_field).map(str::to_string),
                population: entry.population,
            })
            .collect();

        debug!(city = %name, matches = candidates.len(), "Gazetteer lookup");
        Ok(candidates)
    }
}

fn match_key(name: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

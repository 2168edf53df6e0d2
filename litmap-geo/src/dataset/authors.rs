//! Author rows
//!
//! Reads an authors CSV, keeping every input column verbatim so the
//! annotated output can reproduce it, and extracts the three city roles and
//! the life years used to derive a reference year.

use crate::error::DatasetError;
use crate::types::CityRole;
use litmap_common::config::DatasetConfig;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Input column names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorColumns {
    pub born: String,
    pub death: String,
    pub active: String,
    pub birth_year: String,
    pub death_year: String,
}

impl AuthorColumns {
    /// Column holding the city name for a role
    pub fn city(&self, role: CityRole) -> &str {
        match role {
            CityRole::Born => &self.born,
            CityRole::Death => &self.death,
            CityRole::Active => &self.active,
        }
    }
}

impl Default for AuthorColumns {
    fn default() -> Self {
        Self::from(&DatasetConfig::default())
    }
}

impl From<&DatasetConfig> for AuthorColumns {
    fn from(config: &DatasetConfig) -> Self {
        Self {
            born: config.born_column.clone(),
            death: config.death_column.clone(),
            active: config.active_column.clone(),
            birth_year: config.birth_year_column.clone(),
            death_year: config.death_year_column.clone(),
        }
    }
}

/// One author row
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    /// Zero-based data row index
    pub index: usize,
    /// Raw input fields in header order
    pub fields: Vec<String>,
    pub born: Option<String>,
    pub death: Option<String>,
    pub active: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
}

impl AuthorRecord {
    pub fn city(&self, role: CityRole) -> Option<&str> {
        match role {
            CityRole::Born => self.born.as_deref(),
            CityRole::Death => self.death.as_deref(),
            CityRole::Active => self.active.as_deref(),
        }
    }

    /// Death year, else birth year plus `offset`.
    ///
    /// A sum outside the `i32` range counts as no reference year.
    pub fn reference_year(&self, offset: i32) -> Option<i32> {
        self.death_year
            .or_else(|| self.birth_year.and_then(|year| year.checked_add(offset)))
    }
}

/// Parsed authors file
#[derive(Debug, Clone)]
pub struct AuthorTable {
    pub headers: Vec<String>,
    pub records: Vec<AuthorRecord>,
}

impl AuthorTable {
    pub fn read_csv(path: &Path, columns: &AuthorColumns) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file, columns)?;
        info!(
            path = %path.display(),
            rows = table.records.len(),
            "Loaded authors"
        );
        Ok(table)
    }

    /// Parse authors from any CSV reader.
    ///
    /// City columns are required; year columns are optional and a missing
    /// one reads as absent for every row.
    pub fn from_reader<R: Read>(reader: R, columns: &AuthorColumns) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let required = |name: &str| position(name).ok_or_else(|| DatasetError::MissingColumn(name.to_string()));

        let born_col = required(&columns.born)?;
        let death_col = required(&columns.death)?;
        let active_col = required(&columns.active)?;
        let birth_year_col = position(&columns.birth_year);
        let death_year_col = position(&columns.death_year);

        let mut records = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let fields: Vec<String> = record.iter().map(str::to_string).collect();
            let text = |col: usize| record.get(col).map(str::trim).filter(|v| !v.is_empty());
            let year = |col: Option<usize>, name: &str| {
                let raw = col.and_then(text)?;
                let parsed = parse_year(raw);
                if parsed.is_none() {
                    warn!(row = index, column = name, value = raw, "Unparsable year; treated as absent");
                }
                parsed
            };

            records.push(AuthorRecord {
                index,
                born: text(born_col).map(str::to_string),
                death: text(death_col).map(str::to_string),
                active: text(active_col).map(str::to_string),
                birth_year: year(birth_year_col, &columns.birth_year),
                death_year: year(death_year_col, &columns.death_year),
                fields,
            });
        }

        Ok(Self { headers, records })
    }
}

/// Accept "1450" and spreadsheet-style "1450.0"
fn parse_year(raw: &str) -> Option<i32> {
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    let value: f64 = raw.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

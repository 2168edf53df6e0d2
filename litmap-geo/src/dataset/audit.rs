//! Geocoding coverage audit

use super::authors::AuthorColumns;
use super::projection::{AnnotatedAuthor, RoleOutput};
use crate::error::DatasetError;
use crate::types::CityRole;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Coverage summary over annotated rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodingAudit {
    /// Distinct coordinate pairs over all roles
    pub geocoded_places: usize,
    /// Distinct city names that did not geocode
    pub ungeocoded_names: usize,
    /// Ungeocoded names relative to geocoded places, in percent
    pub ungeocoded_percentage: f64,
}

impl GeocodingAudit {
    pub fn from_annotated(rows: &[AnnotatedAuthor]) -> Self {
        let mut audit = AuditBuilder::default();
        for row in rows {
            for role in CityRole::ALL {
                audit.add(row.record.city(role), &row.output(role).coordinates);
            }
        }
        audit.finish()
    }

    /// Audit an annotated CSV written by this tool
    pub fn from_csv(path: &Path, columns: &AuthorColumns) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };

        let mut role_columns = Vec::new();
        for role in CityRole::ALL {
            let [coordinates, ..] = RoleOutput::columns(role);
            role_columns.push((position(columns.city(role))?, position(&coordinates)?));
        }

        let mut audit = AuditBuilder::default();
        for record in reader.records() {
            let record = record?;
            for &(city_col, coords_col) in &role_columns {
                let city = record.get(city_col).map(str::trim).filter(|c| !c.is_empty());
                let coordinates = record.get(coords_col).map(str::trim).unwrap_or("");
                audit.add(city, coordinates);
            }
        }
        Ok(audit.finish())
    }
}

impl fmt::Display for GeocodingAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of geocoded places: {}", self.geocoded_places)?;
        writeln!(f, "Number of ungeocoded city names: {}", self.ungeocoded_names)?;
        write!(f, "Percentage not geocoded: {:.2}%", self.ungeocoded_percentage)
    }
}

#[derive(Default)]
struct AuditBuilder {
    places: HashSet<String>,
    missing: HashSet<String>,
}

impl AuditBuilder {
    fn add(&mut self, city: Option<&str>, coordinates: &str) {
        if !coordinates.is_empty() {
            self.places.insert(coordinates.to_string());
        } else if let Some(city) = city {
            self.missing.insert(city.to_string());
        }
    }

    fn finish(self) -> GeocodingAudit {
        let geocoded = self.places.len();
        let ungeocoded = self.missing.len();
        let percentage = if geocoded == 0 {
            0.0
        } else {
            ungeocoded as f64 / geocoded as f64 * 100.0
        };

        GeocodingAudit {
            geocoded_places: geocoded,
            ungeocoded_names: ungeocoded,
            ungeocoded_percentage: percentage,
        }
    }
}

//! Cache persistence
//!
//! The persisted cache is append-only: a store never rewrites or truncates
//! rows it has already written, it only appends rows it has not seen yet.
//! A run that dies mid-way therefore leaves every earlier resolution intact.

use super::cache::CacheRow;
use crate::error::CacheError;
use crate::types::{Coordinates, LocationId};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persisted CSV header
pub const CACHE_HEADER: [&str; 4] = ["city", "coordinates", "country", "city_id"];

/// Durable storage for cache rows
pub trait CacheStore: Send {
    /// Read every persisted row in storage order
    fn load(&mut self) -> Result<Vec<CacheRow>, CacheError>;

    /// Persist rows not already stored; returns how many were written
    fn append(&mut self, rows: &[CacheRow]) -> Result<usize, CacheError>;
}

/// Identity of a persisted row for set-difference appends
type RowKey = (String, String, u64);

fn row_key(row: &CacheRow) -> RowKey {
    (row.city.clone(), row.coordinates.key(), row.city_id.0)
}

/// CSV file store (`city,coordinates,country,city_id`)
pub struct CsvCacheStore {
    path: PathBuf,
    persisted: HashSet<RowKey>,
    loaded: bool,
}

impl CsvCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            persisted: HashSet::new(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self) -> Result<Vec<CacheRow>, CacheError> {
        let file = std::fs::File::open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);
        let corrupt_header = |name: &str| CacheError::Corrupt {
            line: 1,
            reason: format!("missing '{}' column", name),
        };

        let city_col = column("city").ok_or_else(|| corrupt_header("city"))?;
        let coords_col = column("coordinates").ok_or_else(|| corrupt_header("coordinates"))?;
        let id_col = column("city_id").ok_or_else(|| corrupt_header("city_id"))?;
        let country_col = column("country");

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let field = |i: usize| record.get(i).map(str::trim).unwrap_or("");

            let raw_city = field(city_col);
            let raw_coordinates = field(coords_col);
            let raw_id = field(id_col);

            if raw_city.is_empty() {
                return Err(CacheError::Corrupt {
                    line,
                    reason: "empty city".to_string(),
                });
            }

            let coordinates: Coordinates = raw_coordinates.parse().map_err(|e| CacheError::Corrupt {
                line,
                reason: format!("{}", e),
            })?;

            let city_id = parse_id(raw_id).ok_or_else(|| CacheError::Corrupt {
                line,
                reason: format!("invalid city_id '{}'", raw_id),
            })?;

            let country = country_col
                .map(field)
                .filter(|c| !c.is_empty())
                .map(str::to_string);

            rows.push(CacheRow {
                city: strip_legacy_key(raw_city, raw_coordinates, &coordinates).to_string(),
                coordinates,
                country,
                city_id,
            });
        }

        Ok(rows)
    }
}

impl CacheStore for CsvCacheStore {
    fn load(&mut self) -> Result<Vec<CacheRow>, CacheError> {
        let rows = if self.path.exists() {
            self.parse()?
        } else {
            debug!(path = %self.path.display(), "No persisted cache yet");
            Vec::new()
        };

        self.persisted = rows.iter().map(row_key).collect();
        self.loaded = true;

        info!(
            path = %self.path.display(),
            rows = rows.len(),
            "Loaded resolution cache"
        );
        Ok(rows)
    }

    fn append(&mut self, rows: &[CacheRow]) -> Result<usize, CacheError> {
        if !self.loaded {
            self.load()?;
        }

        let mut batch_keys = HashSet::new();
        let new_rows: Vec<&CacheRow> = rows
            .iter()
            .filter(|row| {
                let key = row_key(row);
                !self.persisted.contains(&key) && batch_keys.insert(key)
            })
            .collect();

        if new_rows.is_empty() {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        let len = file.metadata()?.len();
        let needs_header = len == 0;

        // a last row without its newline would swallow the first appended one
        if len > 0 && !ends_with_newline(&mut file, len)? {
            debug!(path = %self.path.display(), "Terminating unterminated last cache row");
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(CACHE_HEADER)?;
        }

        for row in &new_rows {
            let coordinates = row.coordinates.key();
            let id = row.city_id.to_string();
            writer.write_record([
                row.city.as_str(),
                coordinates.as_str(),
                row.country.as_deref().unwrap_or(""),
                id.as_str(),
            ])?;
        }
        writer.flush()?;

        for row in &new_rows {
            self.persisted.insert(row_key(row));
        }

        debug!(path = %self.path.display(), appended = new_rows.len(), "Appended cache rows");
        Ok(new_rows.len())
    }
}

/// In-memory store for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    rows: Vec<CacheRow>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from already-persisted rows
    pub fn with_rows(rows: Vec<CacheRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CacheRow] {
        &self.rows
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&mut self) -> Result<Vec<CacheRow>, CacheError> {
        Ok(self.rows.clone())
    }

    fn append(&mut self, rows: &[CacheRow]) -> Result<usize, CacheError> {
        let mut known: HashSet<RowKey> = self.rows.iter().map(row_key).collect();
        let mut written = 0;
        for row in rows {
            if known.insert(row_key(row)) {
                self.rows.push(row.clone());
                written += 1;
            }
        }
        Ok(written)
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Accept integral ids written either as "12" or "12.0"
fn parse_id(raw: &str) -> Option<LocationId> {
    if let Ok(id) = raw.parse::<u64>() {
        return Some(LocationId(id));
    }

    let value: f64 = raw.parse().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(LocationId(value as u64))
    } else {
        None
    }
}

/// Map a legacy composite key "<name>_<coordinates>" back to "<name>"
fn strip_legacy_key<'a>(city: &'a str, raw_coordinates: &str, coordinates: &Coordinates) -> &'a str {
    let suffixes = [format!("_{}", raw_coordinates), format!("_{}", coordinates.key())];
    for suffix in &suffixes {
        if let Some(name) = city.strip_suffix(suffix.as_str()) {
            if !name.is_empty() {
                return name;
            }
        }
    }
    city
}

//! Output projection
//!
//! Every annotated column is derived from cache state alone, never carried
//! over from an earlier run's output, so a crash between persisting the
//! cache and writing the rows cannot leave them out of step.

use super::authors::{AuthorRecord, AuthorTable};
use crate::error::DatasetError;
use crate::services::cache_store::CacheStore;
use crate::services::resolver::Resolver;
use crate::types::{AnachronismFlag, CityRole};
use std::path::Path;
use tracing::info;

/// Column holding the reference year in annotated output
pub const YEAR_COLUMN: &str = "year_map";

/// Projected columns for one role of one row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleOutput {
    pub coordinates: String,
    pub country: String,
    pub city_id: String,
    pub before_discovery: String,
}

impl RoleOutput {
    /// Whether the role resolved to a place
    pub fn is_geocoded(&self) -> bool {
        !self.coordinates.is_empty()
    }

    pub fn is_flagged(&self) -> bool {
        self.before_discovery == AnachronismFlag::Yes.as_str()
    }

    /// Column names for a role, in output order
    pub fn columns(role: CityRole) -> [String; 4] {
        let prefix = role.prefix();
        [
            format!("{}_coordinates", prefix),
            format!("{}_country", prefix),
            format!("{}_city_id", prefix),
            format!("{}_americas_or_oceania_before_discovery", prefix),
        ]
    }

    fn values(&self) -> [&str; 4] {
        [
            self.coordinates.as_str(),
            self.country.as_str(),
            self.city_id.as_str(),
            self.before_discovery.as_str(),
        ]
    }
}

/// An author row with its projected columns
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedAuthor {
    pub record: AuthorRecord,
    pub reference_year: Option<i32>,
    /// Indexed like [`CityRole::ALL`]
    pub outputs: [RoleOutput; 3],
}

impl AnnotatedAuthor {
    pub fn output(&self, role: CityRole) -> &RoleOutput {
        &self.outputs[role_index(role)]
    }
}

fn role_index(role: CityRole) -> usize {
    match role {
        CityRole::Born => 0,
        CityRole::Death => 1,
        CityRole::Active => 2,
    }
}

/// Project one author row from the resolver's cache
pub fn project_author<S: CacheStore>(
    resolver: &Resolver<S>,
    record: &AuthorRecord,
    reference_year_offset: i32,
) -> AnnotatedAuthor {
    let reference_year = record.reference_year(reference_year_offset);
    let mut outputs: [RoleOutput; 3] = Default::default();

    for role in CityRole::ALL {
        let resolution = record
            .city(role)
            .zip(reference_year)
            .and_then(|(city, year)| resolver.lookup_cached(city, year));

        if let Some(resolution) = resolution {
            outputs[role_index(role)] = RoleOutput {
                coordinates: resolution.location.coordinates.key(),
                country: resolution.location.country.unwrap_or_default(),
                city_id: resolution.location.location_id.to_string(),
                before_discovery: resolution.flag.as_str().to_string(),
            };
        }
    }

    AnnotatedAuthor {
        record: record.clone(),
        reference_year,
        outputs,
    }
}

/// Header of the annotated output: input columns, year, projections
pub fn annotated_headers(input_headers: &[String]) -> Vec<String> {
    let mut headers = input_headers.to_vec();
    headers.push(YEAR_COLUMN.to_string());
    for role in CityRole::ALL {
        headers.extend(RoleOutput::columns(role));
    }
    headers
}

/// Write annotated rows as CSV
pub fn write_annotated<'a, I>(path: &Path, table: &AuthorTable, rows: I) -> Result<usize, DatasetError>
where
    I: IntoIterator<Item = &'a AnnotatedAuthor>,
{
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    writer.write_record(annotated_headers(&table.headers))?;

    let mut written = 0;
    for row in rows {
        let year = row.reference_year.map(|y| y.to_string()).unwrap_or_default();
        let mut record: Vec<&str> = row.record.fields.iter().map(String::as_str).collect();
        // short input rows are padded so projections line up with the header
        record.resize(table.headers.len().max(record.len()), "");
        record.push(&year);
        for output in &row.outputs {
            record.extend(output.values());
        }
        writer.write_record(&record)?;
        written += 1;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = written, "Wrote annotated authors");
    Ok(written)
}

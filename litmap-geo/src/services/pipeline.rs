//! Author annotation pipeline
//!
//! Two passes over the rows. The first resolves every (role, reference
//! year) pair in row order, filling and persisting the cache; roles are
//! resolved strictly one after another because each miss mutates the cache
//! and the id counter. The second pass projects every row from the cache.

use super::cache_store::CacheStore;
use super::resolver::Resolver;
use crate::dataset::authors::AuthorRecord;
use crate::dataset::projection::{project_author, AnnotatedAuthor};
use crate::error::{CacheError, ResolveError};
use crate::types::{AnachronismFlag, CityRole};
use serde::Serialize;
use tracing::{info, warn};

/// Counters for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub rows: usize,
    /// Roles naming a city
    pub roles_seen: usize,
    pub cache_hits: usize,
    /// Fresh resolutions through the provider
    pub resolved: usize,
    /// Roles left empty (no candidates, no reference year)
    pub unresolved: usize,
    pub provider_errors: usize,
    pub flagged: usize,
}

/// Resolve and project author rows.
///
/// Per-city failures are counted and logged; only a final cache flush that
/// cannot persist pending rows fails the run.
pub async fn annotate_authors<S: CacheStore>(
    resolver: &mut Resolver<S>,
    authors: &[AuthorRecord],
    reference_year_offset: i32,
) -> Result<(Vec<AnnotatedAuthor>, PipelineStats), CacheError> {
    let mut stats = PipelineStats {
        rows: authors.len(),
        ..Default::default()
    };

    for record in authors {
        let reference_year = record.reference_year(reference_year_offset);

        for role in CityRole::ALL {
            let Some(city) = record.city(role) else {
                continue;
            };
            stats.roles_seen += 1;

            let Some(year) = reference_year else {
                warn!(row = record.index, role = %role, city = %city, "No reference year; left unresolved");
                stats.unresolved += 1;
                continue;
            };

            match resolver.resolve(city, year).await {
                Ok(resolution) => {
                    if resolution.from_cache {
                        stats.cache_hits += 1;
                    } else {
                        stats.resolved += 1;
                    }
                    if resolution.flag == AnachronismFlag::Yes {
                        stats.flagged += 1;
                    }
                }
                Err(ResolveError::NoCandidatesFound { .. }) => stats.unresolved += 1,
                Err(ResolveError::Provider { .. }) => {
                    stats.provider_errors += 1;
                    stats.unresolved += 1;
                }
            }
        }
    }

    resolver.flush()?;

    let resolver = &*resolver;
    let annotated: Vec<AnnotatedAuthor> = authors
        .iter()
        .map(|record| project_author(resolver, record, reference_year_offset))
        .collect();

    info!(
        rows = stats.rows,
        roles = stats.roles_seen,
        cache_hits = stats.cache_hits,
        resolved = stats.resolved,
        unresolved = stats.unresolved,
        provider_errors = stats.provider_errors,
        flagged = stats.flagged,
        "Annotation complete"
    );

    Ok((annotated, stats))
}

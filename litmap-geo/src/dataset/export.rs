//! JSON export of the resolution cache
//!
//! `{ "<city>": [ { "coordinates": "lat, lon", "country": ..., "city_id": n }, ... ] }`

use crate::error::DatasetError;
use crate::services::cache::ResolutionCache;
use crate::types::{Coordinates, LocationId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedPlace {
    pub coordinates: Coordinates,
    pub country: Option<String>,
    pub city_id: LocationId,
}

/// City name → cached places, sorted by name
pub fn cache_export(cache: &ResolutionCache) -> BTreeMap<String, Vec<ExportedPlace>> {
    cache
        .iter()
        .map(|(city, places)| {
            let places = places
                .iter()
                .map(|p| ExportedPlace {
                    coordinates: p.coordinates,
                    country: p.country.clone(),
                    city_id: p.location_id,
                })
                .collect();
            (city.to_string(), places)
        })
        .collect()
}

pub fn write_cache_json(cache: &ResolutionCache, path: &Path) -> Result<usize, DatasetError> {
    let export = cache_export(cache);
    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(path, json)?;

    info!(path = %path.display(), cities = export.len(), "Exported cache");
    Ok(export.len())
}

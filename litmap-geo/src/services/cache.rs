//! Resolution cache and location id assignment
//!
//! Two-level cache: a city name maps to the ordered list of places that
//! name was found to denote, and every distinct coordinate pair maps to one
//! [`LocationId`]. Both are explicit state owned by this module; nothing
//! else allocates ids.
//!
//! Ids are handed out strictly in first-seen order starting at the
//! configured base. After loading a persisted cache the counter resumes at
//! one past the largest stored id, so ids never collide across runs.
//!
//! New entries are also queued as pending [`CacheRow`]s until a store
//! confirms they are durable.

use crate::error::CacheError;
use crate::types::{Candidate, Coordinates, LocationId, ResolvedLocation};
use std::collections::HashMap;
use tracing::debug;

/// One persisted cache row
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRow {
    pub city: String,
    pub coordinates: Coordinates,
    pub country: Option<String>,
    pub city_id: LocationId,
}

impl CacheRow {
    pub fn from_location(location: &ResolvedLocation) -> Self {
        Self {
            city: location.city_name.clone(),
            coordinates: location.coordinates,
            country: location.country.clone(),
            city_id: location.location_id,
        }
    }

    pub fn into_location(self) -> ResolvedLocation {
        ResolvedLocation {
            city_name: self.city,
            coordinates: self.coordinates,
            country: self.country,
            location_id: self.city_id,
        }
    }
}

/// Coordinates → stable id, allocated in first-seen order
#[derive(Debug, Clone)]
pub struct IdAssigner {
    by_coordinates: HashMap<String, LocationId>,
    next: u64,
}

impl IdAssigner {
    pub fn new(base: u64) -> Self {
        Self {
            by_coordinates: HashMap::new(),
            next: base,
        }
    }

    pub fn get(&self, coordinates: &Coordinates) -> Option<LocationId> {
        self.by_coordinates.get(&coordinates.key()).copied()
    }

    /// Existing id for these coordinates, or the next free one
    pub fn assign(&mut self, coordinates: &Coordinates) -> LocationId {
        let key = coordinates.key();
        if let Some(id) = self.by_coordinates.get(&key) {
            return *id;
        }

        let id = LocationId(self.next);
        self.next += 1;
        self.by_coordinates.insert(key, id);
        id
    }

    /// Id that the next unseen coordinate pair will receive
    pub fn next_id(&self) -> LocationId {
        LocationId(self.next)
    }

    pub fn len(&self) -> usize {
        self.by_coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_coordinates.is_empty()
    }

    /// Record a persisted id; `None` when no id can follow it
    fn register(&mut self, key: String, id: LocationId) -> Option<()> {
        self.next = self.next.max(id.0.checked_add(1)?);
        self.by_coordinates.insert(key, id);
        Some(())
    }
}

/// In-memory resolution cache
#[derive(Debug, Clone)]
pub struct ResolutionCache {
    entries: HashMap<String, Vec<ResolvedLocation>>,
    /// City names in first-seen order
    order: Vec<String>,
    ids: IdAssigner,
    pending: Vec<CacheRow>,
}

impl ResolutionCache {
    pub fn new(id_base: u64) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            ids: IdAssigner::new(id_base),
            pending: Vec::new(),
        }
    }

    /// Rebuild the cache from persisted rows in storage order.
    ///
    /// **Algorithm:**
    /// 1. Rows for the same city keep their relative order
    /// 2. A repeated (city, coordinates) pair is dropped
    /// 3. One coordinate pair carrying two ids, or one id shared by two
    ///    coordinate pairs, is corruption
    ///
    /// Line numbers in errors count the header as line 1.
    pub fn from_rows(rows: Vec<CacheRow>, id_base: u64) -> Result<Self, CacheError> {
        let mut cache = Self::new(id_base);
        let mut by_id: HashMap<LocationId, String> = HashMap::new();
        let mut duplicates = 0usize;

        for (position, row) in rows.into_iter().enumerate() {
            let line = position as u64 + 2;
            let key = row.coordinates.key();

            if let Some(existing) = cache.ids.by_coordinates.get(&key) {
                if *existing != row.city_id {
                    return Err(CacheError::Corrupt {
                        line,
                        reason: format!(
                            "coordinates '{}' carry id {} but were already assigned id {}",
                            key, row.city_id, existing
                        ),
                    });
                }
            }

            match by_id.get(&row.city_id) {
                Some(owner) if *owner != key => {
                    return Err(CacheError::Corrupt {
                        line,
                        reason: format!(
                            "id {} is shared by '{}' and '{}'",
                            row.city_id, owner, key
                        ),
                    });
                }
                Some(_) => {}
                None => {
                    by_id.insert(row.city_id, key.clone());
                }
            }

            cache
                .ids
                .register(key, row.city_id)
                .ok_or_else(|| CacheError::Corrupt {
                    line,
                    reason: format!("id {} leaves no room for further ids", row.city_id),
                })?;

            let already_cached = cache
                .entries
                .get(&row.city)
                .map(|list| list.iter().any(|l| l.coordinates.key() == row.coordinates.key()))
                .unwrap_or(false);
            if already_cached {
                duplicates += 1;
                continue;
            }

            cache.push_location(row.into_location());
        }

        if duplicates > 0 {
            debug!(duplicates, "Dropped duplicate cache rows");
        }

        Ok(cache)
    }

    /// Cached places for a city name, in first-seen order
    pub fn get(&self, city: &str) -> Option<&[ResolvedLocation]> {
        self.entries.get(city).map(Vec::as_slice)
    }

    pub fn contains(&self, city: &str) -> bool {
        self.entries.contains_key(city)
    }

    /// Cache every candidate of a fresh lookup under `city`.
    ///
    /// Ids are assigned in candidate order. A candidate whose coordinates
    /// are already listed for this city is skipped. Returns the city's full
    /// cached list.
    pub fn insert_candidates(&mut self, city: &str, candidates: &[Candidate]) -> &[ResolvedLocation] {
        for candidate in candidates {
            let known = self
                .entries
                .get(city)
                .map(|list| list.iter().any(|l| l.coordinates == candidate.coordinates))
                .unwrap_or(false);
            if known {
                continue;
            }

            let location = ResolvedLocation {
                city_name: city.to_string(),
                coordinates: candidate.coordinates,
                country: candidate.country.clone(),
                location_id: self.ids.assign(&candidate.coordinates),
            };
            self.pending.push(CacheRow::from_location(&location));
            self.push_location(location);
        }

        self.get(city).unwrap_or(&[])
    }

    /// Rows added since the last successful persist
    pub fn pending(&self) -> &[CacheRow] {
        &self.pending
    }

    /// Forget pending rows once a store has made them durable
    pub fn mark_persisted(&mut self) {
        self.pending.clear();
    }

    /// Cached cities with their places, in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ResolvedLocation])> {
        self.order
            .iter()
            .filter_map(|city| self.entries.get(city).map(|list| (city.as_str(), list.as_slice())))
    }

    /// Every cached place as a row, in first-seen order
    pub fn rows(&self) -> Vec<CacheRow> {
        self.iter()
            .flat_map(|(_, list)| list.iter().map(CacheRow::from_location))
            .collect()
    }

    pub fn ids(&self) -> &IdAssigner {
        &self.ids
    }

    /// Number of cached city names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cached places across all names
    pub fn location_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    fn push_location(&mut self, location: ResolvedLocation) {
        if !self.entries.contains_key(&location.city_name) {
            self.order.push(location.city_name.clone());
        }
        self.entries
            .entry(location.city_name.clone())
            .or_default()
            .push(location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(lat: f64, lon: f64, country: &str) -> Candidate {
        Candidate {
            name: String::new(),
            coordinates: Coordinates::new(lat, lon),
            country: Some(country.to_string()),
            population: None,
        }
    }

    fn row(city: &str, lat: f64, lon: f64, id: u64) -> CacheRow {
        CacheRow {
            city: city.to_string(),
            coordinates: Coordinates::new(lat, lon),
            country: None,
            city_id: LocationId(id),
        }
    }

    #[test]
    fn test_ids_follow_first_seen_order() {
        let mut ids = IdAssigner::new(1);
        let a = Coordinates::new(1.0, 1.0);
        let b = Coordinates::new(2.0, 2.0);
        assert_eq!(ids.assign(&a), LocationId(1));
        assert_eq!(ids.assign(&b), LocationId(2));
        assert_eq!(ids.assign(&a), LocationId(1));
        assert_eq!(ids.next_id(), LocationId(3));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_zero_base() {
        let mut ids = IdAssigner::new(0);
        assert_eq!(ids.assign(&Coordinates::new(5.0, 5.0)), LocationId(0));
    }

    #[test]
    fn test_insert_candidates_shares_ids_across_names() {
        let mut cache = ResolutionCache::new(1);
        cache.insert_candidates("Lisbon", &[cand(38.7, -9.1, "Portugal"), cand(28.8, -81.7, "United States")]);
        let lisboa = cache.insert_candidates("Lisboa", &[cand(38.7, -9.1, "Portugal")]).to_vec();

        assert_eq!(lisboa.len(), 1);
        assert_eq!(lisboa[0].location_id, LocationId(1));
        assert_eq!(cache.get("Lisbon").unwrap()[1].location_id, LocationId(2));
        assert_eq!(cache.pending().len(), 3);
        assert_eq!(cache.location_count(), 3);
    }

    #[test]
    fn test_insert_skips_repeated_coordinates_for_same_name() {
        let mut cache = ResolutionCache::new(1);
        let list = cache.insert_candidates("Paris", &[cand(48.85, 2.35, "France"), cand(48.85, 2.35, "France")]);
        assert_eq!(list.len(), 1);
        assert_eq!(cache.pending().len(), 1);
    }

    #[test]
    fn test_mark_persisted_clears_pending() {
        let mut cache = ResolutionCache::new(1);
        cache.insert_candidates("Rome", &[cand(41.9, 12.5, "Italy")]);
        cache.mark_persisted();
        assert!(cache.pending().is_empty());
        assert!(cache.contains("Rome"));
    }

    #[test]
    fn test_from_rows_resumes_counter_after_max() {
        let rows = vec![row("A", 1.0, 1.0, 4), row("B", 2.0, 2.0, 9)];
        let mut cache = ResolutionCache::from_rows(rows, 1).unwrap();
        assert_eq!(cache.ids().next_id(), LocationId(10));
        let list = cache.insert_candidates("C", &[cand(3.0, 3.0, "Spain")]);
        assert_eq!(list[0].location_id, LocationId(10));
    }

    #[test]
    fn test_from_rows_groups_and_dedupes() {
        let rows = vec![
            row("Toledo", 39.86, -4.02, 1),
            row("Toledo", 41.65, -83.53, 2),
            row("Toledo", 39.86, -4.02, 1),
        ];
        let cache = ResolutionCache::from_rows(rows, 1).unwrap();
        let toledo = cache.get("Toledo").unwrap();
        assert_eq!(toledo.len(), 2);
        assert_eq!(toledo[0].location_id, LocationId(1));
        assert!(cache.pending().is_empty());
    }

    #[test]
    fn test_from_rows_rejects_conflicting_ids() {
        let rows = vec![row("A", 1.0, 1.0, 1), row("B", 1.0, 1.0, 2)];
        match ResolutionCache::from_rows(rows, 1) {
            Err(CacheError::Corrupt { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected corruption, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_from_rows_rejects_shared_id() {
        let rows = vec![row("A", 1.0, 1.0, 1), row("B", 2.0, 2.0, 1)];
        assert!(matches!(
            ResolutionCache::from_rows(rows, 1),
            Err(CacheError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_from_rows_rejects_exhausted_id_space() {
        let rows = vec![row("A", 1.0, 1.0, 1), row("B", 2.0, 2.0, u64::MAX)];
        match ResolutionCache::from_rows(rows, 1) {
            Err(CacheError::Corrupt { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected corruption, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn test_rows_in_first_seen_order() {
        let rows = vec![row("B", 2.0, 2.0, 1), row("A", 1.0, 1.0, 2), row("B", 3.0, 3.0, 3)];
        let cache = ResolutionCache::from_rows(rows, 1).unwrap();
        let cities: Vec<_> = cache.rows().into_iter().map(|r| (r.city, r.city_id.0)).collect();
        assert_eq!(
            cities,
            vec![("B".to_string(), 1), ("B".to_string(), 3), ("A".to_string(), 2)]
        );
    }
}

//! City resolver
//!
//! Ties a [`LocationProvider`], the disambiguator, the flagger and the
//! resolution cache together. The answer for a (city, year) pair is always
//! derived from cache contents: a miss first fills the cache from the
//! provider and then reads the answer back out, so a first resolution and
//! every later one go through the same code path and agree.

use super::cache::ResolutionCache;
use super::cache_store::CacheStore;
use super::disambiguator::{disambiguate, Preference};
use super::flagger::Flagger;
use crate::error::{CacheError, ResolveError};
use crate::providers::LocationProvider;
use crate::types::{AnachronismFlag, ResolvedLocation};
use tracing::{debug, error, info, warn};

/// Outcome of resolving one city for one reference year
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub location: ResolvedLocation,
    pub flag: AnachronismFlag,
    pub preference: Preference,
    /// Answered without a provider call
    pub from_cache: bool,
}

/// Resolves city names against a provider through a persistent cache
pub struct Resolver<S: CacheStore> {
    provider: Box<dyn LocationProvider>,
    flagger: Flagger,
    cache: ResolutionCache,
    store: S,
}

impl<S: CacheStore> Resolver<S> {
    /// Load the persisted cache and build a resolver.
    ///
    /// A cache that cannot be read back is fatal: continuing would hand out
    /// ids that collide with persisted ones.
    pub fn open(
        provider: Box<dyn LocationProvider>,
        flagger: Flagger,
        mut store: S,
        id_base: u64,
    ) -> Result<Self, CacheError> {
        let rows = store.load()?;
        let cache = ResolutionCache::from_rows(rows, id_base)?;

        info!(
            provider = provider.source_id(),
            cities = cache.len(),
            locations = cache.ids().len(),
            next_id = %cache.ids().next_id(),
            "Resolver ready"
        );

        Ok(Self {
            provider,
            flagger,
            cache,
            store,
        })
    }

    /// Resolve `city` for `reference_year`.
    ///
    /// **Algorithm:**
    /// 1. Cache hit: re-run disambiguation over the cached places
    /// 2. Miss: query the provider, cache every candidate with an id, persist
    /// 3. Answer from the cache as in step 1
    ///
    /// Provider failures and empty results are returned as errors, logged,
    /// and leave the cache untouched.
    pub async fn resolve(&mut self, city: &str, reference_year: i32) -> Result<Resolution, ResolveError> {
        let city = city.trim();

        if let Some(resolution) = self.lookup_cached(city, reference_year) {
            debug!(
                city = %city,
                year = reference_year,
                location_id = %resolution.location.location_id,
                "Cache hit"
            );
            return Ok(resolution);
        }

        let candidates = match self.provider.lookup(city).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    city = %city,
                    year = reference_year,
                    provider = self.provider.source_id(),
                    error = %e,
                    "Provider lookup failed"
                );
                return Err(ResolveError::Provider {
                    city: city.to_string(),
                    year: reference_year,
                    source: e,
                });
            }
        };

        if candidates.is_empty() {
            warn!(city = %city, year = reference_year, "No candidates found");
            return Err(ResolveError::NoCandidatesFound {
                city: city.to_string(),
                year: reference_year,
            });
        }

        self.cache.insert_candidates(city, &candidates);
        if let Err(e) = self.flush() {
            error!(
                city = %city,
                pending = self.cache.pending().len(),
                error = %e,
                "Failed to persist cache rows; will retry"
            );
        }

        let mut resolution = self
            .lookup_cached(city, reference_year)
            .ok_or_else(|| ResolveError::NoCandidatesFound {
                city: city.to_string(),
                year: reference_year,
            })?;
        resolution.from_cache = false;

        if resolution.preference == Preference::LastResort {
            warn!(
                city = %city,
                year = reference_year,
                country = resolution.location.country.as_deref().unwrap_or(""),
                "No era-plausible candidate; kept Americas/Oceania place"
            );
        }

        info!(
            city = %city,
            year = reference_year,
            candidates = candidates.len(),
            coordinates = %resolution.location.coordinates,
            country = resolution.location.country.as_deref().unwrap_or(""),
            location_id = %resolution.location.location_id,
            flag = %resolution.flag,
            "Resolved city"
        );

        Ok(resolution)
    }

    /// Answer purely from cache state, without touching the provider
    pub fn lookup_cached(&self, city: &str, reference_year: i32) -> Option<Resolution> {
        let places = self.cache.get(city.trim())?;
        let selection = disambiguate(places, reference_year, &self.flagger)?;
        let location = places[selection.index].clone();
        let flag = self.flagger.flag(location.country.as_deref(), reference_year);

        Some(Resolution {
            location,
            flag,
            preference: selection.preference,
            from_cache: true,
        })
    }

    /// Persist pending cache rows; on failure they stay pending
    pub fn flush(&mut self) -> Result<usize, CacheError> {
        if self.cache.pending().is_empty() {
            return Ok(0);
        }

        let written = self.store.append(self.cache.pending())?;
        self.cache.mark_persisted();
        Ok(written)
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn flagger(&self) -> &Flagger {
        &self.flagger
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.source_id()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

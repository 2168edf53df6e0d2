//! Test Helper Utilities
//!
//! Scripted provider, fault-injecting cache store and fixture builders
//! shared by the litmap-geo integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use litmap_common::CountryField;
use litmap_geo::error::{CacheError, ProviderError};
use litmap_geo::services::{CacheRow, CacheStore, MemoryCacheStore};
use litmap_geo::{Candidate, Coordinates, Flagger, LocationProvider, RegionTable};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Provider answering from a fixed script and counting calls per name
#[derive(Default)]
pub struct ScriptedProvider {
    answers: HashMap<String, Vec<Candidate>>,
    failing: Vec<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the candidates for `name`
    pub fn with(mut self, name: &str, candidates: Vec<Candidate>) -> Self {
        self.answers.insert(name.to_string(), candidates);
        self
    }

    /// Make every lookup of `name` fail with a network error
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    /// Shared handle on the names looked up so far
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl LocationProvider for ScriptedProvider {
    fn source_id(&self) -> &'static str {
        "Scripted"
    }

    async fn lookup(&self, name: &str) -> Result<Vec<Candidate>, ProviderError> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.failing.iter().any(|n| n == name) {
            return Err(ProviderError::Network("connection reset".to_string()));
        }
        Ok(self.answers.get(name).cloned().unwrap_or_default())
    }
}

/// Memory store whose appends fail while `fail_appends` is raised
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: Arc<Mutex<MemoryCacheStore>>,
    failures: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` appends
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<CacheRow> {
        self.inner.lock().unwrap().rows().to_vec()
    }
}

impl CacheStore for FlakyStore {
    fn load(&mut self) -> Result<Vec<CacheRow>, CacheError> {
        self.inner.lock().unwrap().load()
    }

    fn append(&mut self, rows: &[CacheRow]) -> Result<usize, CacheError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.lock().unwrap().append(rows)
    }
}

pub fn candidate(name: &str, lat: f64, lon: f64, country: &str, population: Option<u64>) -> Candidate {
    Candidate {
        name: name.to_string(),
        coordinates: Coordinates::new(lat, lon),
        country: Some(country.to_string()),
        population,
    }
}

pub fn flagger() -> Flagger {
    Flagger::new(RegionTable::new(CountryField::Name))
}

pub fn lisbon() -> Candidate {
    candidate("Lisbon", 38.7222524, -9.1393366, "Portugal", None)
}

/// Toledo, Ohio first (provider order), Toledo, Spain second
pub fn toledos() -> Vec<Candidate> {
    vec![
        candidate("Toledo", 41.6528052, -83.5378674, "United States", None),
        candidate("Toledo", 39.8628316, -4.0273231, "Spain", None),
    ]
}

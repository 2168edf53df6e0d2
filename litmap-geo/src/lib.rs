//! # litmap-geo
//!
//! City resolution for historical author datasets: turns free-text city
//! names into coordinates and countries, gives every distinct place a
//! stable id, caches decisions across runs, and flags places that are
//! implausible for the author's era.
//!
//! - [`providers`]: offline gazetteer and online geocoder behind one trait
//! - [`services`]: disambiguation, flagging, cache, resolver, pipeline
//! - [`dataset`]: author CSV adapters, projection, filtering, audit

pub mod dataset;
pub mod error;
pub mod providers;
pub mod regions;
pub mod services;
pub mod types;

pub use error::{CacheError, DatasetError, GazetteerError, ProviderError, ResolveError};
pub use providers::LocationProvider;
pub use regions::{Region, RegionTable};
pub use services::{Flagger, Resolution, Resolver};
pub use types::{AnachronismFlag, Candidate, CityRole, Coordinates, LocationId, ResolvedLocation};

//! Core value types shared by providers, the resolver and dataset adapters

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Coordinates could not be parsed from text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinates '{0}'")]
pub struct CoordinatesParseError(pub String);

/// A latitude/longitude pair.
///
/// The `"lat, lon"` text form produced by `Display` is the identity used for
/// deduplication and location id assignment, so every place that compares
/// or stores coordinates goes through [`Coordinates::key`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Canonical serialized form
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

impl FromStr for Coordinates {
    type Err = CoordinatesParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CoordinatesParseError(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(err)?;
        let lat: f64 = lat.trim().parse().map_err(|_| err())?;
        let lon: f64 = lon.trim().parse().map_err(|_| err())?;

        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(err());
        }

        Ok(Self { lat, lon })
    }
}

impl Serialize for Coordinates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Stable numeric identifier of one distinct coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u64);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One possible location for a queried name, as returned by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub coordinates: Coordinates,
    /// Country in the run's configured representation (name or code)
    pub country: Option<String>,
    /// Recorded population (gazetteer only)
    pub population: Option<u64>,
}

/// A city name resolved to one place, with its stable id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub city_name: String,
    pub coordinates: Coordinates,
    pub country: Option<String>,
    pub location_id: LocationId,
}

/// Whether a resolved place is implausible for the reference year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnachronismFlag {
    /// Americas/Oceania location before that country's discovery year
    Yes,
    No,
    /// Country could not be determined
    Unknown,
}

impl AnachronismFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unknown => "",
        }
    }
}

impl fmt::Display for AnachronismFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three city roles of an author row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CityRole {
    Born,
    Death,
    Active,
}

impl CityRole {
    pub const ALL: [CityRole; 3] = [CityRole::Born, CityRole::Death, CityRole::Active];

    /// Column prefix used by the output projection
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Born => "borncity",
            Self::Death => "deathcity",
            Self::Active => "activecity",
        }
    }
}

impl fmt::Display for CityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

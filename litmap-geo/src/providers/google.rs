//! Google Geocoding API client
//!
//! Queries the JSON geocoding endpoint for a free-text city name and turns
//! each address result into a [`Candidate`]. A fixed minimum period between
//! requests is enforced with a `governor` limiter (burst of one).

use super::LocationProvider;
use crate::error::ProviderError;
use crate::types::{Candidate, Coordinates};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use litmap_common::CountryField;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const USER_AGENT: &str = concat!("litmap/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Client settings
#[derive(Debug, Clone)]
pub struct GoogleGeocoderSettings {
    pub min_interval: Duration,
    pub timeout: Duration,
    pub country_field: CountryField,
}

impl Default for GoogleGeocoderSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(40),
            timeout: Duration::from_secs(30),
            country_field: CountryField::Name,
        }
    }
}

/// Google Geocoding API client
pub struct GoogleGeocoder {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    country_field: CountryField,
    rate_limiter: DefaultDirectRateLimiter,
}

impl GoogleGeocoder {
    pub fn new(api_key: String, settings: GoogleGeocoderSettings) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let period = settings.min_interval.max(Duration::from_millis(1));
        let quota = Quota::with_period(period).ok_or_else(|| {
            ProviderError::InvalidRequest(format!("invalid rate limit period {:?}", period))
        })?;

        Ok(Self {
            http_client,
            api_key,
            base_url: GEOCODE_URL.to_string(),
            country_field: settings.country_field,
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    /// Point the client at another endpoint (proxy or test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Check if API key is configured
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[async_trait]
impl LocationProvider for GoogleGeocoder {
    fn source_id(&self) -> &'static str {
        "Google"
    }

    async fn lookup(&self, name: &str) -> Result<Vec<Candidate>, ProviderError> {
        self.rate_limiter.until_ready().await;

        debug!(city = %name, "Querying Google Geocoding API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("address", name), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), error_text));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let candidates = candidates_from_response(body, name, self.country_field)?;

        info!(
            city = %name,
            results = candidates.len(),
            "Geocoded via Google"
        );

        Ok(candidates)
    }
}

/// Map a decoded API response to candidates in result order
fn candidates_from_response(
    body: GeocodeResponse,
    name: &str,
    field: CountryField,
) -> Result<Vec<Candidate>, ProviderError> {
    let message = || body.error_message.clone().unwrap_or_default();

    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(Vec::new()),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => return Err(ProviderError::RateLimited),
        "INVALID_REQUEST" => return Err(ProviderError::InvalidRequest(message())),
        "REQUEST_DENIED" => return Err(ProviderError::Denied(message())),
        other => return Err(ProviderError::Api(200, format!("{}: {}", other, message()))),
    }

    body.results
        .iter()
        .map(|result| {
            let location = &result.geometry.location;
            if !location.lat.is_finite() || !location.lng.is_finite() {
                return Err(ProviderError::Parse(format!(
                    "non-finite location for '{}'",
                    name
                )));
            }
            Ok(Candidate {
                name: name.to_string(),
                coordinates: Coordinates::new(location.lat, location.lng),
                country: country_from_components(&result.address_components, field),
                population: None,
            })
        })
        .collect()
}

/// First address component typed "country", in the requested representation
fn country_from_components(components: &[AddressComponent], field: CountryField) -> Option<String> {
    components
        .iter()
        .find(|c| c.types.iter().any(|t| t == "country"))
        .map(|c| match field {
            CountryField::Name => c.long_name.clone(),
            CountryField::Code => c.short_name.clone(),
        })
}

//! Location providers
//!
//! The offline gazetteer and the online geocoder both answer the same
//! question (which places carry this name?) and plug into the resolver
//! through [`LocationProvider`].

use crate::error::ProviderError;
use crate::types::Candidate;
use async_trait::async_trait;

pub mod gazetteer;
pub mod google;

pub use gazetteer::{Gazetteer, GazetteerEntry, GazetteerOptions};
pub use google::{GoogleGeocoder, GoogleGeocoderSettings};

/// Provider trait - gazetteer and geocoder implement this
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Provider identifier (e.g., "GeoNames", "Google")
    fn source_id(&self) -> &'static str;

    /// Look up every place matching `name`.
    ///
    /// # Returns
    /// * `Ok(vec![])` - nothing matched
    /// * `Ok(candidates)` - matches in provider order (most relevant first)
    /// * `Err(_)` - transient failure; the caller logs it and moves on
    async fn lookup(&self, name: &str) -> Result<Vec<Candidate>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinates;

    struct FixedProvider;

    #[async_trait]
    impl LocationProvider for FixedProvider {
        fn source_id(&self) -> &'static str {
            "Fixed"
        }

        async fn lookup(&self, name: &str) -> Result<Vec<Candidate>, ProviderError> {
            Ok(vec![Candidate {
                name: name.to_string(),
                coordinates: Coordinates::new(1.0, 2.0),
                country: None,
                population: None,
            }])
        }
    }

    #[tokio::test]
    async fn test_trait_object_lookup() {
        let provider: Box<dyn LocationProvider> = Box::new(FixedProvider);
        let found = provider.lookup("Anywhere").await.unwrap();
        assert_eq!(provider.source_id(), "Fixed");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Anywhere");
    }
}
